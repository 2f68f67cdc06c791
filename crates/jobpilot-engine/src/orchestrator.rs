//! Run orchestration: discovery, filtering and delivery for one config.
//!
//! One run walks every configured city and keyword, loads the full
//! candidate list, and handles candidates strictly one at a time; the
//! session monitor is paused for the whole run so only one actor drives the
//! browser. Per-candidate trouble (a slow detail payload, a malformed
//! response) is reported and skipped; cancellation and an expired session
//! end the run.

use crate::delivery::DeliveryEngine;
use crate::discovery::DiscoveryEngine;
use crate::error::{EngineError, Result};
use crate::extract::parse_detail;
use crate::filter::{Blacklist, FilterDecision, FilterEngine};
use crate::session::{LoginState, SessionMonitor};
use crate::url_builder::build_search_url;
use jobpilot_browser::BrowserSurface;
use jobpilot_core::{
    AppConfig, CancelToken, ConfigError, DeliveryOutcome, DeliveryStatus, Platform, ProgressBus,
    ProgressReport, Severity,
};
use jobpilot_db::{jobs, Database};
use jobpilot_llm::GreetingGenerator;
use serde::Serialize;
use std::sync::Arc;

/// Counters for one completed run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunSummary {
    /// New or refreshed candidates stored this run.
    pub discovered: usize,
    /// Greetings delivered.
    pub delivered: usize,
    /// Candidates rejected by the filter engine.
    pub filtered: usize,
    /// Delivery attempts that failed.
    pub failed: usize,
    /// Candidates skipped because they were already in a terminal state.
    pub skipped_known: usize,
}

/// Drives one full discovery-and-delivery run.
pub struct Orchestrator {
    surface: Arc<dyn BrowserSurface>,
    db: Database,
    config: AppConfig,
    monitor: Arc<SessionMonitor>,
    greeter: Option<Arc<dyn GreetingGenerator>>,
    bus: ProgressBus,
    cancel: CancelToken,
    platform: Platform,
}

impl Orchestrator {
    /// Create an orchestrator for one run.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        surface: Arc<dyn BrowserSurface>,
        db: Database,
        config: AppConfig,
        monitor: Arc<SessionMonitor>,
        greeter: Option<Arc<dyn GreetingGenerator>>,
        bus: ProgressBus,
        cancel: CancelToken,
        platform: Platform,
    ) -> Self {
        Self {
            surface,
            db,
            config,
            monitor,
            greeter,
            bus,
            cancel,
            platform,
        }
    }

    /// Execute the run.
    ///
    /// # Errors
    /// Configuration problems fail fast; `Cancelled` and `SessionExpired`
    /// end the run early. Per-candidate failures are reported on the
    /// progress bus instead.
    pub async fn run(&self) -> Result<RunSummary> {
        self.config.validate()?;
        if self.config.search.keywords.is_empty() {
            return Err(EngineError::Config(ConfigError::InvalidValue {
                field: "search.keywords".to_string(),
                reason: "no keywords configured".to_string(),
            }));
        }

        self.monitor.pause();
        let mut summary = RunSummary::default();
        let result = self.run_inner(&mut summary).await;
        self.monitor.resume();

        let counts = format!(
            "{} delivered, {} filtered, {} failed, {} already handled",
            summary.delivered, summary.filtered, summary.failed, summary.skipped_known
        );
        match result {
            Ok(()) => {
                self.bus
                    .send(self.platform, Severity::Success, format!("run complete: {counts}"));
                Ok(summary)
            }
            Err(e) => {
                // Whatever was counted before the abort still goes out.
                self.bus.send(
                    self.platform,
                    Severity::Warning,
                    format!("run ended early ({e}): {counts}"),
                );
                Err(e)
            }
        }
    }

    async fn run_inner(&self, summary: &mut RunSummary) -> Result<()> {
        let blacklist = Blacklist::load(self.db.pool()).await?;
        let filter = FilterEngine::new(&self.config.search, blacklist);
        let discovery = DiscoveryEngine::new(
            Arc::clone(&self.surface),
            self.bus.clone(),
            self.cancel.clone(),
            self.platform,
        );
        let delivery = DeliveryEngine::new(
            Arc::clone(&self.surface),
            self.config.search.clone(),
            self.greeter.clone(),
            self.bus.clone(),
            self.cancel.clone(),
            self.platform,
        );

        let cities = if self.config.search.cities.is_empty() {
            vec!["0".to_string()]
        } else {
            self.config.search.cities.clone()
        };

        for city in &cities {
            for keyword in &self.config.search.keywords {
                if self.cancel.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }

                let url = build_search_url(&self.config.search, keyword, city)?;
                self.bus.send(
                    self.platform,
                    Severity::Info,
                    format!("searching '{keyword}' (city {city})"),
                );

                discovery.open_search(&url).await?;
                let total = discovery.load_all_cards().await?;

                for index in 0..total {
                    self.handle_candidate(
                        &discovery,
                        &delivery,
                        &filter,
                        keyword,
                        index,
                        total,
                        summary,
                    )
                    .await?;
                }
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_candidate(
        &self,
        discovery: &DiscoveryEngine,
        delivery: &DeliveryEngine,
        filter: &FilterEngine,
        keyword: &str,
        index: usize,
        total: usize,
        summary: &mut RunSummary,
    ) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if self.monitor.current_state() == LoginState::LoggedOut {
            return Err(EngineError::SessionExpired);
        }

        self.bus.publish(ProgressReport::step(
            self.platform,
            format!("candidate {}/{total}", index + 1),
            index + 1,
            total,
        ));

        let body = match discovery.capture_detail(index).await {
            Ok(body) => body,
            Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
            Err(e) => {
                self.bus.send(
                    self.platform,
                    Severity::Warning,
                    format!("candidate {} skipped: {e}", index + 1),
                );
                return Ok(());
            }
        };

        let record = match parse_detail(&body) {
            Ok(record) => record,
            Err(e) => {
                self.bus.send(
                    self.platform,
                    Severity::Warning,
                    format!("candidate {} unreadable: {e}", index + 1),
                );
                return Ok(());
            }
        };

        if let Some(existing) = jobs::get_job(self.db.pool(), &record.identity).await? {
            if existing.status.is_terminal() {
                summary.skipped_known += 1;
                return Ok(());
            }
        }
        jobs::upsert_job(self.db.pool(), self.platform, &record).await?;
        summary.discovered += 1;

        match filter.evaluate(&record) {
            FilterDecision::Reject(reason) => {
                let outcome = DeliveryOutcome {
                    identity: record.identity.clone(),
                    timestamp: chrono::Utc::now(),
                    status: DeliveryStatus::Filtered,
                    message: reason.to_string(),
                    attachment_sent: false,
                };
                jobs::record_outcome(self.db.pool(), &outcome).await?;
                summary.filtered += 1;
                self.bus.send(
                    self.platform,
                    Severity::Info,
                    format!("filtered {}: {reason}", record.context()),
                );
            }
            FilterDecision::Accept => {
                if self.config.search.debug {
                    self.bus.send(
                        self.platform,
                        Severity::Info,
                        format!("debug mode, not delivering to {}", record.context()),
                    );
                    return Ok(());
                }

                let outcome = delivery.deliver(&record, keyword).await?;
                jobs::record_outcome(self.db.pool(), &outcome).await?;
                if outcome.status == DeliveryStatus::Delivered {
                    summary.delivered += 1;
                    self.bus.send(
                        self.platform,
                        Severity::Success,
                        format!("delivered to {}", record.context()),
                    );
                } else {
                    summary.failed += 1;
                }
            }
        }

        Ok(())
    }
}
