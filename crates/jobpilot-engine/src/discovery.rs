//! Candidate discovery on the recommendation list.
//!
//! The list is an infinite scroll: keep scrolling until the end-of-page
//! marker shows, the card count stops growing, or a hard iteration cap is
//! hit. Card details are not in the DOM; clicking a card makes the page
//! fetch a detail payload, which a pre-armed response watch captures.

use crate::error::{EngineError, Result};
use crate::selectors;
use jobpilot_browser::BrowserSurface;
use jobpilot_core::{CancelToken, Platform, ProgressBus, Severity};
use std::sync::Arc;
use std::time::Duration;

/// Hard cap on scroll iterations for one list.
const MAX_SCROLL_ITERATIONS: usize = 120;

/// Scroll step, in viewport heights.
const SCROLL_FACTOR: f64 = 1.5;

/// Settle time after each scroll step.
const SCROLL_SETTLE: Duration = Duration::from_millis(500);

/// Consecutive no-growth rounds before forcing a jump to the bottom.
const STABILITY_THRESHOLD: u32 = 3;

/// How long to wait for a clicked card's detail payload.
const DETAIL_TIMEOUT: Duration = Duration::from_secs(5);

/// Settle time between the two clicks of the first-card workaround.
const FIRST_CARD_SETTLE: Duration = Duration::from_secs(1);

/// Loads and walks the candidate list of one search page.
pub struct DiscoveryEngine {
    surface: Arc<dyn BrowserSurface>,
    bus: ProgressBus,
    cancel: CancelToken,
    platform: Platform,
}

impl DiscoveryEngine {
    /// Create a discovery engine over the main list surface.
    #[must_use]
    pub fn new(
        surface: Arc<dyn BrowserSurface>,
        bus: ProgressBus,
        cancel: CancelToken,
        platform: Platform,
    ) -> Self {
        Self {
            surface,
            bus,
            cancel,
            platform,
        }
    }

    /// Navigate to a search URL and wait for the list to render.
    pub async fn open_search(&self, url: &str) -> Result<()> {
        self.surface.navigate(url).await?;
        self.surface
            .wait_for_selector(selectors::JOB_LIST, 10_000)
            .await?;
        Ok(())
    }

    /// Number of candidate cards currently in the list.
    pub async fn card_count(&self) -> Result<usize> {
        Ok(self.surface.locate(selectors::JOB_CARDS).await?.count().await?)
    }

    /// Scroll until the whole list is loaded and return the card count.
    ///
    /// Stops on the end-of-page marker, on the iteration cap, or on
    /// cancellation. A stalled count first gets a forced jump to the bottom
    /// before counting as done.
    pub async fn load_all_cards(&self) -> Result<usize> {
        let mut last_count = self.card_count().await?;
        let mut stable_rounds = 0u32;

        for _ in 0..MAX_SCROLL_ITERATIONS {
            if self.cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            let footer = self.surface.locate(selectors::PAGE_END_MARKER).await?;
            if footer.is_visible().await.unwrap_or(false) {
                tracing::debug!("end-of-page marker visible, list fully loaded");
                break;
            }

            if stable_rounds >= STABILITY_THRESHOLD {
                self.surface.scroll_to_bottom().await?;
            } else {
                self.surface.scroll_by_viewport(SCROLL_FACTOR).await?;
            }
            tokio::time::sleep(SCROLL_SETTLE).await;

            let count = self.card_count().await?;
            if count == last_count {
                stable_rounds += 1;
            } else {
                stable_rounds = 0;
                last_count = count;
            }
        }

        self.bus.send(
            self.platform,
            Severity::Info,
            format!("loaded {last_count} candidate cards"),
        );
        Ok(last_count)
    }

    /// Click the card at `index` and capture its detail payload.
    ///
    /// The site does not fire the detail request for the initially-selected
    /// first card, so index 0 clicks a sibling first and comes back.
    ///
    /// # Errors
    /// `EngineError::DetailTimeout` if no payload arrives in time.
    pub async fn capture_detail(&self, index: usize) -> Result<String> {
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let receiver = self
            .surface
            .watch_response(selectors::DETAIL_API_FRAGMENT, "GET")
            .await?;

        let cards = self.surface.locate(selectors::JOB_CARDS).await?;
        if index == 0 && cards.count().await? > 1 {
            cards.click_nth(1).await?;
            tokio::time::sleep(FIRST_CARD_SETTLE).await;
            cards.click_nth(0).await?;
        } else {
            cards.click_nth(index).await?;
        }

        match tokio::time::timeout(DETAIL_TIMEOUT, receiver).await {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(_)) | Err(_) => Err(EngineError::DetailTimeout(format!("card {index}"))),
        }
    }
}
