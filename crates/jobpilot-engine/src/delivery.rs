//! Greeting delivery to one candidate.
//!
//! Delivery happens in a fresh tab on the candidate's detail page: start
//! the chat, wait for the input, send the greeting (AI-generated when
//! enabled, template otherwise), optionally attach the image resume, close
//! up. Greeting generation and the attachment are soft steps: their failure
//! degrades the delivery but never fails it. Anything before the message
//! being sent is a hard failure recorded as such.

use crate::error::{EngineError, Result};
use crate::retry::bounded_retry;
use crate::selectors;
use jobpilot_browser::BrowserSurface;
use jobpilot_core::{
    CancelToken, DeliveryOutcome, DeliveryStatus, JobRecord, Platform, ProgressBus, SearchConfig,
    Severity,
};
use jobpilot_llm::{is_rejection, GreetingGenerator};
use std::sync::Arc;
use std::time::Duration;

/// Attempts to find a clickable chat button.
const CHAT_BUTTON_ATTEMPTS: u32 = 5;

/// Attempts to find the chat input after starting the chat.
const CHAT_INPUT_ATTEMPTS: u32 = 10;

/// Interval between attempts.
const STEP_INTERVAL: Duration = Duration::from_secs(1);

/// How long to wait for an intercepted file-chooser dialog.
const FILE_CHOOSER_TIMEOUT: Duration = Duration::from_secs(3);

/// Sends greetings to accepted candidates.
pub struct DeliveryEngine {
    list_surface: Arc<dyn BrowserSurface>,
    config: SearchConfig,
    greeter: Option<Arc<dyn GreetingGenerator>>,
    bus: ProgressBus,
    cancel: CancelToken,
    platform: Platform,
}

impl DeliveryEngine {
    /// Create a delivery engine. `list_surface` is the tab showing the
    /// candidate list, used to read the detail link of the selected card.
    #[must_use]
    pub fn new(
        list_surface: Arc<dyn BrowserSurface>,
        config: SearchConfig,
        greeter: Option<Arc<dyn GreetingGenerator>>,
        bus: ProgressBus,
        cancel: CancelToken,
        platform: Platform,
    ) -> Self {
        Self {
            list_surface,
            config,
            greeter,
            bus,
            cancel,
            platform,
        }
    }

    /// Deliver a greeting for the currently-selected candidate. `keyword`
    /// is the search term that surfaced it, passed through to the greeting
    /// generator.
    ///
    /// Always returns an outcome for recordable failures; only cancellation
    /// and infrastructure errors propagate as `Err`.
    pub async fn deliver(&self, job: &JobRecord, keyword: &str) -> Result<DeliveryOutcome> {
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let detail_url = match self.read_detail_url().await {
            Ok(url) => url,
            Err(e) => {
                return Ok(self.failed_outcome(job, &format!("detail link unavailable: {e}")))
            }
        };

        let tab = self.list_surface.open_tab(&detail_url).await?;
        let result = self.deliver_in_tab(tab.as_ref(), job, keyword).await;
        if let Err(e) = tab.close().await {
            tracing::debug!("failed to close delivery tab: {}", e);
        }

        match result {
            Ok(outcome) => Ok(outcome),
            Err(EngineError::Cancelled) => Err(EngineError::Cancelled),
            Err(e) => {
                self.bus.send(
                    self.platform,
                    Severity::Warning,
                    format!("delivery to {} failed: {e}", job.context()),
                );
                Ok(self.failed_outcome(job, &e.to_string()))
            }
        }
    }

    async fn read_detail_url(&self) -> Result<String> {
        let link = self.list_surface.locate(selectors::DETAIL_LINK).await?;
        if link.count().await? == 0 {
            return Err(EngineError::SelectorUnavailable(
                selectors::DETAIL_LINK.to_string(),
            ));
        }

        let href = link
            .get_attribute("href")
            .await?
            .ok_or_else(|| EngineError::SelectorUnavailable("detail link href".to_string()))?;

        if !href.starts_with(selectors::DETAIL_LINK_PREFIX) {
            return Err(EngineError::Parse(format!(
                "unexpected detail link target: {href}"
            )));
        }

        Ok(format!("{}{href}", selectors::SITE_ORIGIN))
    }

    async fn deliver_in_tab(
        &self,
        tab: &dyn BrowserSurface,
        job: &JobRecord,
        keyword: &str,
    ) -> Result<DeliveryOutcome> {
        self.start_chat(tab).await?;
        self.wait_for_chat_input(tab).await?;

        let greeting = self.compose_greeting(job, keyword).await;
        self.send_message(tab, &greeting).await?;

        let attachment_sent = if self.config.send_image_resume {
            match self.send_image_resume(tab).await {
                Ok(sent) => sent,
                Err(e) => {
                    self.bus.send(
                        self.platform,
                        Severity::Warning,
                        format!("image resume not sent to {}: {e}", job.context()),
                    );
                    false
                }
            }
        } else {
            false
        };

        self.close_chat_dialog(tab).await;

        Ok(DeliveryOutcome {
            identity: job.identity.clone(),
            timestamp: chrono::Utc::now(),
            status: DeliveryStatus::Delivered,
            message: greeting,
            attachment_sent,
        })
    }

    async fn start_chat(&self, tab: &dyn BrowserSurface) -> Result<()> {
        bounded_retry(
            "chat button",
            CHAT_BUTTON_ATTEMPTS,
            STEP_INTERVAL,
            &self.cancel,
            || async {
                let button = tab.locate(selectors::CHAT_BUTTON).await?;
                if button.is_visible().await?
                    && button
                        .text_content()
                        .await?
                        .contains(selectors::CHAT_BUTTON_TEXT)
                {
                    button.click().await?;
                    Ok(Some(()))
                } else {
                    Ok(None)
                }
            },
        )
        .await
    }

    async fn wait_for_chat_input(&self, tab: &dyn BrowserSurface) -> Result<()> {
        bounded_retry(
            "chat input",
            CHAT_INPUT_ATTEMPTS,
            STEP_INTERVAL,
            &self.cancel,
            || async {
                let input = tab.locate(selectors::CHAT_INPUT).await?;
                if input.count().await? > 0 && input.is_visible().await? {
                    Ok(Some(()))
                } else {
                    Ok(None)
                }
            },
        )
        .await
    }

    async fn compose_greeting(&self, job: &JobRecord, keyword: &str) -> String {
        // AI greetings need the flag on and a description to work from.
        if !self.config.enable_ai || job.description.is_empty() {
            return self.config.greet_template.clone();
        }
        let Some(greeter) = &self.greeter else {
            return self.config.greet_template.clone();
        };

        match greeter.generate(job, keyword).await {
            Ok(text) if !is_rejection(&text) => text,
            Ok(_) => {
                tracing::debug!(
                    "model declined a greeting for {}, using template",
                    job.context()
                );
                self.config.greet_template.clone()
            }
            Err(e) => {
                self.bus.send(
                    self.platform,
                    Severity::Warning,
                    format!("greeting generation failed, using template: {e}"),
                );
                self.config.greet_template.clone()
            }
        }
    }

    async fn send_message(&self, tab: &dyn BrowserSurface, greeting: &str) -> Result<()> {
        let input = tab.locate(selectors::CHAT_INPUT).await?;
        if input.tag_name().await? == "textarea" {
            input.fill(greeting).await?;
        } else {
            input.fill_content_editable(greeting).await?;
        }

        tab.locate(selectors::CHAT_SEND).await?.click().await?;
        Ok(())
    }

    async fn send_image_resume(&self, tab: &dyn BrowserSurface) -> Result<bool> {
        let Some(path) = self
            .config
            .resume_image_paths
            .iter()
            .find(|p| p.exists())
            .cloned()
        else {
            tracing::warn!("no resume image found at any configured path");
            return Ok(false);
        };
        let files = [path];

        // A reachable file input takes the direct route.
        let input = tab.locate(selectors::IMAGE_FILE_INPUT).await?;
        if input.count().await? > 0 {
            input.set_input_files(&files).await?;
            return Ok(true);
        }

        // Otherwise trigger the picker and catch the native dialog.
        let chooser_rx = tab.watch_file_chooser().await?;
        tab.locate(selectors::IMAGE_SEND_BUTTON).await?.click().await?;

        match tokio::time::timeout(FILE_CHOOSER_TIMEOUT, chooser_rx).await {
            Ok(Ok(chooser)) => {
                chooser.set_files(&files).await?;
                Ok(true)
            }
            Ok(Err(_)) | Err(_) => {
                // The click may have materialized the input instead.
                let input = tab.locate(selectors::IMAGE_FILE_INPUT).await?;
                if input.count().await? > 0 {
                    input.set_input_files(&files).await?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    async fn close_chat_dialog(&self, tab: &dyn BrowserSurface) {
        if let Ok(close) = tab.locate(selectors::CHAT_CLOSE).await {
            if close.is_visible().await.unwrap_or(false) {
                if let Err(e) = close.click().await {
                    tracing::debug!("chat dialog close failed: {}", e);
                }
            }
        }
    }

    fn failed_outcome(&self, job: &JobRecord, message: &str) -> DeliveryOutcome {
        DeliveryOutcome {
            identity: job.identity.clone(),
            timestamp: chrono::Utc::now(),
            status: DeliveryStatus::Failed,
            message: message.to_string(),
            attachment_sent: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_budgets() {
        assert!(CHAT_INPUT_ATTEMPTS >= CHAT_BUTTON_ATTEMPTS);
        assert!(FILE_CHOOSER_TIMEOUT < Duration::from_secs(10));
    }
}
