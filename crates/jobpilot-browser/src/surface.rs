//! Capability traits the orchestration engine is written against.
//!
//! The engine never talks to `chromiumoxide` directly. Everything it needs
//! from the browser is expressed here so that integration tests can run the
//! full discovery/delivery state machines against a scripted fake.

use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// One logical browser tab.
///
/// Implementations must serialize their own mutating operations; callers are
/// expected to issue at most one mutating call at a time per surface.
#[async_trait]
pub trait BrowserSurface: Send + Sync {
    /// Navigate the tab to `url` and wait for the load to settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Current URL of the tab.
    async fn current_url(&self) -> Result<String>;

    /// Handle for all elements matching a CSS selector (possibly zero).
    async fn locate(&self, selector: &str) -> Result<Box<dyn ElementHandle>>;

    /// Wait until at least one element matches `selector`, up to `timeout_ms`.
    ///
    /// Returns `BrowserError::Timeout` if nothing appears in time.
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Arm a one-shot watch for the next response whose URL contains
    /// `path_fragment` and whose request method matches `method`.
    ///
    /// The receiver resolves with the response body. Arm the watch before
    /// triggering the action that causes the request.
    async fn watch_response(
        &self,
        path_fragment: &str,
        method: &str,
    ) -> Result<oneshot::Receiver<String>>;

    /// Arm a one-shot watch for the next native file-chooser dialog.
    async fn watch_file_chooser(&self) -> Result<oneshot::Receiver<Box<dyn FileChooser>>>;

    /// Stream of main-frame navigation URLs for this tab.
    async fn subscribe_navigations(&self) -> Result<mpsc::Receiver<String>>;

    /// Scroll down by `factor` times the viewport height.
    async fn scroll_by_viewport(&self, factor: f64) -> Result<()>;

    /// Scroll to the bottom of the document.
    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Snapshot of the session cookies as a JSON array.
    async fn cookies_json(&self) -> Result<String>;

    /// Restore session cookies from a JSON array previously produced by
    /// [`cookies_json`](Self::cookies_json).
    async fn set_cookies_json(&self, json: &str) -> Result<()>;

    /// Open a new tab at `url` within the same session.
    async fn open_tab(&self, url: &str) -> Result<Arc<dyn BrowserSurface>>;

    /// Close the tab. Further calls return `BrowserError::SurfaceClosed`.
    async fn close(&self) -> Result<()>;
}

/// Handle over the set of elements matched by one selector.
///
/// All reads re-query the live DOM; a handle never goes stale.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Number of elements currently matching.
    async fn count(&self) -> Result<usize>;

    /// Whether the first match is present and visible.
    async fn is_visible(&self) -> Result<bool>;

    /// Click the first match.
    async fn click(&self) -> Result<()>;

    /// Click the match at `index`.
    async fn click_nth(&self, index: usize) -> Result<()>;

    /// Fill the first match (input or textarea) with `text`.
    async fn fill(&self, text: &str) -> Result<()>;

    /// Set the text of a `contenteditable` element and fire an input event.
    async fn fill_content_editable(&self, text: &str) -> Result<()>;

    /// Trimmed text content of the first match.
    async fn text_content(&self) -> Result<String>;

    /// Attribute value of the first match, if present.
    async fn get_attribute(&self, name: &str) -> Result<Option<String>>;

    /// Lowercase tag name of the first match.
    async fn tag_name(&self) -> Result<String>;

    /// Attach files to the first match (`input[type=file]`).
    async fn set_input_files(&self, paths: &[PathBuf]) -> Result<()>;
}

/// A native file-chooser dialog intercepted mid-flight.
#[async_trait]
pub trait FileChooser: Send + Sync {
    /// Resolve the dialog with the given files.
    async fn set_files(&self, paths: &[PathBuf]) -> Result<()>;
}
