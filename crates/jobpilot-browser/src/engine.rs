//! `chromiumoxide`-backed implementation of the browser surface.
//!
//! Element operations go through `page.evaluate` so handles never go stale;
//! response bodies and file-chooser dialogs are captured through CDP event
//! listeners armed before the triggering action.

use crate::error::{BrowserError, Result};
use crate::surface::{BrowserSurface, ElementHandle, FileChooser};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::dom::{
    BackendNodeId, GetDocumentParams, QuerySelectorParams, SetFileInputFilesParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    self, CookieParam, EventLoadingFinished, EventRequestWillBeSent, GetResponseBodyParams,
    RequestId,
};
use chromiumoxide::cdp::browser_protocol::page::{
    EventFileChooserOpened, EventFrameNavigated, SetInterceptFileChooserDialogParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Quote a string for safe embedding inside an evaluated JS expression.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// One tab of a launched Chromium session.
pub struct ChromiumSurface {
    browser: Arc<Browser>,
    page: Page,
    closed: AtomicBool,
}

impl ChromiumSurface {
    /// Launch a Chromium instance and return a surface over its first tab.
    pub async fn launch(headless: bool) -> Result<Arc<Self>> {
        let mut builder = BrowserConfig::builder().no_sandbox();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Drain CDP events for the lifetime of the browser.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(Arc::new(Self {
            browser: Arc::new(browser),
            page,
            closed: AtomicBool::new(false),
        }))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrowserError::SurfaceClosed);
        }
        Ok(())
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, expr: String) -> Result<T> {
        let result = self.page.evaluate(expr).await?;
        result
            .into_value::<T>()
            .map_err(|e| BrowserError::EvaluationError(e.to_string()))
    }

    async fn eval_unit(&self, expr: String) -> Result<()> {
        self.page.evaluate(expr).await?;
        Ok(())
    }
}

#[async_trait]
impl BrowserSurface for ChromiumSurface {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.ensure_open()?;
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.ensure_open()?;
        self.page
            .url()
            .await?
            .ok_or_else(|| BrowserError::NavigationError("page has no URL".to_string()))
    }

    async fn locate(&self, selector: &str) -> Result<Box<dyn ElementHandle>> {
        self.ensure_open()?;
        Ok(Box::new(ChromiumElement {
            page: self.page.clone(),
            selector: selector.to_string(),
        }))
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        self.ensure_open()?;
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        let expr = format!(
            "document.querySelectorAll({}).length",
            js_str(selector)
        );
        loop {
            let count: usize = self.eval(expr.clone()).await.unwrap_or(0);
            if count > 0 {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "selector {selector} did not appear within {timeout_ms}ms"
                )));
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    async fn watch_response(
        &self,
        path_fragment: &str,
        method: &str,
    ) -> Result<oneshot::Receiver<String>> {
        self.ensure_open()?;
        self.page
            .execute(network::EnableParams::default())
            .await?;

        let mut requests = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await?;
        let mut finished = self.page.event_listener::<EventLoadingFinished>().await?;

        let (tx, rx) = oneshot::channel();
        let page = self.page.clone();
        let fragment = path_fragment.to_string();
        let method = method.to_uppercase();

        tokio::spawn(async move {
            let mut matched: Option<RequestId> = None;
            let mut tx = Some(tx);
            loop {
                tokio::select! {
                    req = requests.next() => {
                        let Some(req) = req else { break };
                        if matched.is_none()
                            && req.request.url.contains(&fragment)
                            && req.request.method.to_uppercase() == method
                        {
                            matched = Some(req.request_id.clone());
                        }
                    }
                    fin = finished.next() => {
                        let Some(fin) = fin else { break };
                        if matched.as_ref() != Some(&fin.request_id) {
                            continue;
                        }
                        match page
                            .execute(GetResponseBodyParams::new(fin.request_id.clone()))
                            .await
                        {
                            Ok(body) if !body.result.base64_encoded => {
                                if let Some(tx) = tx.take() {
                                    let _ = tx.send(body.result.body.clone());
                                }
                                break;
                            }
                            Ok(_) => {
                                tracing::warn!("response body was base64, skipping");
                                matched = None;
                            }
                            Err(e) => {
                                tracing::warn!("failed to read response body: {}", e);
                                matched = None;
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn watch_file_chooser(&self) -> Result<oneshot::Receiver<Box<dyn FileChooser>>> {
        self.ensure_open()?;
        self.page
            .execute(SetInterceptFileChooserDialogParams::new(true))
            .await?;

        let mut events = self.page.event_listener::<EventFileChooserOpened>().await?;
        let (tx, rx) = oneshot::channel();
        let page = self.page.clone();

        tokio::spawn(async move {
            if let Some(event) = events.next().await {
                if let Some(node_id) = event.backend_node_id {
                    let chooser: Box<dyn FileChooser> = Box::new(ChromiumFileChooser {
                        page,
                        backend_node_id: node_id,
                    });
                    let _ = tx.send(chooser);
                } else {
                    tracing::warn!("file chooser opened without a backing node");
                }
            }
        });

        Ok(rx)
    }

    async fn subscribe_navigations(&self) -> Result<mpsc::Receiver<String>> {
        self.ensure_open()?;
        let mut events = self.page.event_listener::<EventFrameNavigated>().await?;
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                // Only main-frame navigations are interesting.
                if event.frame.parent_id.is_some() {
                    continue;
                }
                if tx.send(event.frame.url.clone()).await.is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }

    async fn scroll_by_viewport(&self, factor: f64) -> Result<()> {
        self.ensure_open()?;
        self.eval_unit(format!(
            "window.scrollBy(0, window.innerHeight * {factor})"
        ))
        .await
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.ensure_open()?;
        self.eval_unit("window.scrollTo(0, document.body.scrollHeight)".to_string())
            .await
    }

    async fn cookies_json(&self) -> Result<String> {
        self.ensure_open()?;
        let cookies = self.page.get_cookies().await?;
        serde_json::to_string(&cookies).map_err(|e| BrowserError::CookieError(e.to_string()))
    }

    async fn set_cookies_json(&self, json: &str) -> Result<()> {
        self.ensure_open()?;
        let cookies: Vec<CookieParam> =
            serde_json::from_str(json).map_err(|e| BrowserError::CookieError(e.to_string()))?;
        self.page.set_cookies(cookies).await?;
        Ok(())
    }

    async fn open_tab(&self, url: &str) -> Result<Arc<dyn BrowserSurface>> {
        self.ensure_open()?;
        let page = self.browser.new_page(url).await?;
        Ok(Arc::new(Self {
            browser: Arc::clone(&self.browser),
            page,
            closed: AtomicBool::new(false),
        }))
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.page.clone().close().await?;
        Ok(())
    }
}

/// Live handle over the elements matching one selector.
struct ChromiumElement {
    page: Page,
    selector: String,
}

impl ChromiumElement {
    async fn eval<T: serde::de::DeserializeOwned>(&self, expr: String) -> Result<T> {
        let result = self.page.evaluate(expr).await?;
        result
            .into_value::<T>()
            .map_err(|e| BrowserError::EvaluationError(e.to_string()))
    }

    fn not_found(&self) -> BrowserError {
        BrowserError::SelectorNotFound(self.selector.clone())
    }
}

#[async_trait]
impl ElementHandle for ChromiumElement {
    async fn count(&self) -> Result<usize> {
        self.eval(format!(
            "document.querySelectorAll({}).length",
            js_str(&self.selector)
        ))
        .await
    }

    async fn is_visible(&self) -> Result<bool> {
        self.eval(format!(
            r"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                const r = el.getBoundingClientRect();
                const cs = window.getComputedStyle(el);
                return r.width > 0 && r.height > 0
                    && cs.visibility !== 'hidden' && cs.display !== 'none';
            }})()",
            sel = js_str(&self.selector)
        ))
        .await
    }

    async fn click(&self) -> Result<()> {
        self.click_nth(0).await
    }

    async fn click_nth(&self, index: usize) -> Result<()> {
        let clicked: bool = self
            .eval(format!(
                r"(() => {{
                    const el = document.querySelectorAll({sel})[{index}];
                    if (!el) return false;
                    el.click();
                    return true;
                }})()",
                sel = js_str(&self.selector)
            ))
            .await?;
        if clicked {
            Ok(())
        } else {
            Err(self.not_found())
        }
    }

    async fn fill(&self, text: &str) -> Result<()> {
        let filled: bool = self
            .eval(format!(
                r"(() => {{
                    const el = document.querySelector({sel});
                    if (!el) return false;
                    el.value = {text};
                    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    return true;
                }})()",
                sel = js_str(&self.selector),
                text = js_str(text)
            ))
            .await?;
        if filled {
            Ok(())
        } else {
            Err(self.not_found())
        }
    }

    async fn fill_content_editable(&self, text: &str) -> Result<()> {
        let filled: bool = self
            .eval(format!(
                r"(() => {{
                    const el = document.querySelector({sel});
                    if (!el) return false;
                    el.focus();
                    el.innerText = {text};
                    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    return true;
                }})()",
                sel = js_str(&self.selector),
                text = js_str(text)
            ))
            .await?;
        if filled {
            Ok(())
        } else {
            Err(self.not_found())
        }
    }

    async fn text_content(&self) -> Result<String> {
        let text: Option<String> = self
            .eval(format!(
                r"(() => {{
                    const el = document.querySelector({sel});
                    return el ? el.textContent.trim() : null;
                }})()",
                sel = js_str(&self.selector)
            ))
            .await?;
        text.ok_or_else(|| self.not_found())
    }

    async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        self.eval(format!(
            r"(() => {{
                const el = document.querySelector({sel});
                return el ? el.getAttribute({name}) : null;
            }})()",
            sel = js_str(&self.selector),
            name = js_str(name)
        ))
        .await
    }

    async fn tag_name(&self) -> Result<String> {
        let tag: Option<String> = self
            .eval(format!(
                r"(() => {{
                    const el = document.querySelector({sel});
                    return el ? el.tagName.toLowerCase() : null;
                }})()",
                sel = js_str(&self.selector)
            ))
            .await?;
        tag.ok_or_else(|| self.not_found())
    }

    async fn set_input_files(&self, paths: &[PathBuf]) -> Result<()> {
        let doc = self.page.execute(GetDocumentParams::default()).await?;
        let node = self
            .page
            .execute(QuerySelectorParams::new(
                doc.result.root.node_id,
                self.selector.clone(),
            ))
            .await?;
        let params = SetFileInputFilesParams::builder()
            .files(paths.iter().map(|p| absolute_path(p)))
            .node_id(node.result.node_id)
            .build()
            .map_err(BrowserError::ChromiumError)?;
        self.page.execute(params).await?;
        Ok(())
    }
}

/// An intercepted native file-chooser dialog.
struct ChromiumFileChooser {
    page: Page,
    backend_node_id: BackendNodeId,
}

#[async_trait]
impl FileChooser for ChromiumFileChooser {
    async fn set_files(&self, paths: &[PathBuf]) -> Result<()> {
        let params = SetFileInputFilesParams::builder()
            .files(paths.iter().map(|p| absolute_path(p)))
            .backend_node_id(self.backend_node_id.clone())
            .build()
            .map_err(BrowserError::ChromiumError)?;
        self.page.execute(params).await?;
        Ok(())
    }
}

/// CDP requires absolute paths when attaching files.
fn absolute_path(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}
