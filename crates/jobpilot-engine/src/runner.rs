//! Long-lived delivery service facade.
//!
//! Owns the session monitor and run lifecycle: at most one run at a time,
//! login handled up front (restored cookies, QR prompt, bounded wait), the
//! run itself in a background task reporting over the progress channel.

use crate::error::{EngineError, Result};
use crate::orchestrator::Orchestrator;
use crate::salary::parse_salary;
use crate::session::SessionMonitor;
use jobpilot_browser::BrowserSurface;
use jobpilot_core::{AppConfig, CancelToken, Platform, ProgressBus, ProgressReport, Severity};
use jobpilot_db::{jobs, Database, DeliveryStats};
use jobpilot_llm::GreetingGenerator;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Snapshot of the service for status queries.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    /// Platform this service drives.
    pub platform: Platform,
    /// Whether a run is in progress.
    pub is_running: bool,
    /// Last known login verdict.
    pub is_logged_in: bool,
}

/// Delivery counters with a salary figure over everything stored so far.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DeliveryOverview {
    /// Per-status counters.
    pub stats: DeliveryStats,
    /// Mean of the parsed salary midpoints in monthly-K, over the stored
    /// jobs whose salary text parses. `None` when nothing parses.
    pub average_salary_k: Option<f64>,
}

/// Compute the delivery overview for everything stored in `db`.
///
/// # Errors
/// Returns `EngineError::Sqlx` if a query fails.
pub async fn delivery_overview(db: &Database) -> Result<DeliveryOverview> {
    const PAGE: u32 = 200;

    let stats = jobs::delivery_stats(db.pool()).await?;

    let mut sum = 0.0;
    let mut parsed = 0u32;
    let mut offset = 0;
    loop {
        let page = jobs::list_page(db.pool(), PAGE, offset).await?;
        let len = page.len();
        for record in page {
            if let Some(salary) = parse_salary(&record.salary) {
                sum += (salary.min_k + salary.max_k) / 2.0;
                parsed += 1;
            }
        }
        if len < PAGE as usize {
            break;
        }
        offset += PAGE;
    }

    let average_salary_k = (parsed > 0).then(|| sum / f64::from(parsed));
    Ok(DeliveryOverview {
        stats,
        average_salary_k,
    })
}

/// Coordinates login, monitoring and delivery runs for one platform.
pub struct DeliveryService {
    surface: Arc<dyn BrowserSurface>,
    db: Database,
    config: AppConfig,
    monitor: Arc<SessionMonitor>,
    greeter: Option<Arc<dyn GreetingGenerator>>,
    platform: Platform,
    running: Arc<AtomicBool>,
    cancel: CancelToken,
}

impl DeliveryService {
    /// Create a service over one browser surface.
    #[must_use]
    pub fn new(
        surface: Arc<dyn BrowserSurface>,
        db: Database,
        config: AppConfig,
        greeter: Option<Arc<dyn GreetingGenerator>>,
        platform: Platform,
    ) -> Self {
        let monitor = Arc::new(SessionMonitor::new(
            Arc::clone(&surface),
            db.clone(),
            platform,
        ));

        Self {
            surface,
            db,
            config,
            monitor,
            greeter,
            platform,
            running: Arc::new(AtomicBool::new(false)),
            cancel: CancelToken::new(),
        }
    }

    /// The session monitor, for subscriptions and background spawning.
    #[must_use]
    pub fn monitor(&self) -> &Arc<SessionMonitor> {
        &self.monitor
    }

    /// Start a delivery run in the background.
    ///
    /// Returns the receiving end of the progress channel for this run.
    ///
    /// # Errors
    /// `EngineError::AlreadyRunning` if a run is in progress.
    pub fn start(&self) -> Result<mpsc::Receiver<ProgressReport>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyRunning);
        }
        self.cancel.reset();

        let (bus, rx) = ProgressBus::new();
        let orchestrator = Orchestrator::new(
            Arc::clone(&self.surface),
            self.db.clone(),
            self.config.clone(),
            Arc::clone(&self.monitor),
            self.greeter.clone(),
            bus.clone(),
            self.cancel.clone(),
            self.platform,
        );

        let monitor = Arc::clone(&self.monitor);
        let running = Arc::clone(&self.running);
        let cancel = self.cancel.clone();
        let platform = self.platform;

        tokio::spawn(async move {
            if let Err(e) = Self::ensure_logged_in(&monitor, &bus, &cancel, platform).await {
                bus.send(platform, Severity::Error, format!("login failed: {e}"));
                running.store(false, Ordering::SeqCst);
                return;
            }

            match orchestrator.run().await {
                Ok(summary) => {
                    tracing::info!("delivery run finished: {:?}", summary);
                }
                Err(EngineError::Cancelled) => {
                    bus.send(platform, Severity::Warning, "run cancelled");
                }
                Err(e) => {
                    bus.send(platform, Severity::Error, format!("run failed: {e}"));
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        Ok(rx)
    }

    async fn ensure_logged_in(
        monitor: &Arc<SessionMonitor>,
        bus: &ProgressBus,
        cancel: &CancelToken,
        platform: Platform,
    ) -> Result<()> {
        if let Err(e) = monitor.restore_cookies().await {
            tracing::debug!("no session restored: {}", e);
        }

        monitor.check_now().await;
        if monitor.is_logged_in() {
            return Ok(());
        }

        monitor.prompt_login().await?;
        bus.send(
            platform,
            Severity::Info,
            "waiting for login, scan the QR code to continue",
        );
        monitor.wait_for_login(cancel).await
    }

    /// Request cancellation of the current run. Idempotent; the run stops
    /// at its next yield point.
    pub fn stop(&self) {
        self.cancel.request();
    }

    /// Current service status.
    #[must_use]
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            platform: self.platform,
            is_running: self.running.load(Ordering::SeqCst),
            is_logged_in: self.monitor.is_logged_in(),
        }
    }

    /// Delivery overview over everything stored so far.
    ///
    /// # Errors
    /// Returns `EngineError::Sqlx` if a query fails.
    pub async fn overview(&self) -> Result<DeliveryOverview> {
        delivery_overview(&self.db).await
    }
}
