//! Scripted in-memory browser surface for engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use jobpilot_browser::{BrowserError, BrowserSurface, ElementHandle, FileChooser, Result};
use jobpilot_core::CancelToken;
use jobpilot_engine::selectors;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};

#[derive(Default)]
struct FakeState {
    card_count: usize,
    scrolls: usize,
    footer_after_scrolls: Option<usize>,
    detail_bodies: VecDeque<String>,
    captures: usize,
    cancel_after_captures: Option<(usize, CancelToken)>,
    pending_response: Option<oneshot::Sender<String>>,
    present: HashSet<String>,
    texts: HashMap<String, String>,
    attributes: HashMap<(String, String), String>,
    tags: HashMap<String, String>,
    clicks: Vec<(String, usize)>,
    fills: Vec<(String, String)>,
    files_set: Vec<PathBuf>,
    navigations: Vec<String>,
    cookies: String,
}

/// Shared-state fake; tabs opened from it observe the same script.
#[derive(Clone, Default)]
pub struct FakeSurface {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn as_surface(&self) -> Arc<dyn BrowserSurface> {
        Arc::new(self.clone())
    }

    pub fn set_cards(&self, count: usize) {
        self.lock().card_count = count;
    }

    /// Footer becomes visible once this many scroll steps have happened.
    pub fn set_footer_after(&self, scrolls: usize) {
        self.lock().footer_after_scrolls = Some(scrolls);
    }

    pub fn push_detail_body(&self, body: impl Into<String>) {
        self.lock().detail_bodies.push_back(body.into());
    }

    /// Request cancellation on `token` when the n-th detail capture fires.
    pub fn cancel_after_captures(&self, n: usize, token: CancelToken) {
        self.lock().cancel_after_captures = Some((n, token));
    }

    pub fn set_present(&self, selector: &str) {
        self.lock().present.insert(selector.to_string());
    }

    pub fn set_absent(&self, selector: &str) {
        self.lock().present.remove(selector);
    }

    pub fn set_text(&self, selector: &str, text: &str) {
        self.lock()
            .texts
            .insert(selector.to_string(), text.to_string());
    }

    pub fn set_attribute(&self, selector: &str, name: &str, value: &str) {
        self.lock()
            .attributes
            .insert((selector.to_string(), name.to_string()), value.to_string());
    }

    pub fn set_tag(&self, selector: &str, tag: &str) {
        self.lock()
            .tags
            .insert(selector.to_string(), tag.to_string());
    }

    pub fn scroll_count(&self) -> usize {
        self.lock().scrolls
    }

    pub fn clicks(&self) -> Vec<(String, usize)> {
        self.lock().clicks.clone()
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.lock().fills.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// Script the happy-path chat flow on the detail page.
    pub fn script_chat_flow(&self) {
        self.set_present(selectors::DETAIL_LINK);
        self.set_attribute(selectors::DETAIL_LINK, "href", "/job_detail/abc.html");
        self.set_present(selectors::CHAT_BUTTON);
        self.set_text(selectors::CHAT_BUTTON, "立即沟通");
        self.set_present(selectors::CHAT_INPUT);
        self.set_tag(selectors::CHAT_INPUT, "textarea");
        self.set_present(selectors::CHAT_SEND);
    }
}

#[async_trait]
impl BrowserSurface for FakeSurface {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.lock().navigations.push(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self
            .lock()
            .navigations
            .last()
            .cloned()
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn locate(&self, selector: &str) -> Result<Box<dyn ElementHandle>> {
        Ok(Box::new(FakeElement {
            state: Arc::clone(&self.state),
            selector: selector.to_string(),
        }))
    }

    async fn wait_for_selector(&self, _selector: &str, _timeout_ms: u64) -> Result<()> {
        Ok(())
    }

    async fn watch_response(
        &self,
        _path_fragment: &str,
        _method: &str,
    ) -> Result<oneshot::Receiver<String>> {
        let (tx, rx) = oneshot::channel();
        self.lock().pending_response = Some(tx);
        Ok(rx)
    }

    async fn watch_file_chooser(&self) -> Result<oneshot::Receiver<Box<dyn FileChooser>>> {
        // No native dialog in the fake; the receiver resolves with an error.
        let (_tx, rx) = oneshot::channel();
        Ok(rx)
    }

    async fn subscribe_navigations(&self) -> Result<mpsc::Receiver<String>> {
        let (_tx, rx) = mpsc::channel(16);
        Ok(rx)
    }

    async fn scroll_by_viewport(&self, _factor: f64) -> Result<()> {
        self.lock().scrolls += 1;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.lock().scrolls += 1;
        Ok(())
    }

    async fn cookies_json(&self) -> Result<String> {
        let cookies = self.lock().cookies.clone();
        if cookies.is_empty() {
            Ok("[]".to_string())
        } else {
            Ok(cookies)
        }
    }

    async fn set_cookies_json(&self, json: &str) -> Result<()> {
        self.lock().cookies = json.to_string();
        Ok(())
    }

    async fn open_tab(&self, url: &str) -> Result<Arc<dyn BrowserSurface>> {
        self.lock().navigations.push(url.to_string());
        Ok(Arc::new(self.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct FakeElement {
    state: Arc<Mutex<FakeState>>,
    selector: String,
}

impl FakeElement {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn count(&self) -> Result<usize> {
        let state = self.lock();
        if self.selector == selectors::JOB_CARDS {
            Ok(state.card_count)
        } else if state.present.contains(&self.selector) {
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn is_visible(&self) -> Result<bool> {
        let state = self.lock();
        if self.selector == selectors::JOB_CARDS {
            return Ok(state.card_count > 0);
        }
        if self.selector == selectors::PAGE_END_MARKER {
            return Ok(state
                .footer_after_scrolls
                .is_some_and(|n| state.scrolls >= n));
        }
        Ok(state.present.contains(&self.selector))
    }

    async fn click(&self) -> Result<()> {
        self.click_nth(0).await
    }

    async fn click_nth(&self, index: usize) -> Result<()> {
        let mut state = self.lock();
        state.clicks.push((self.selector.clone(), index));

        if self.selector == selectors::JOB_CARDS {
            if let Some(tx) = state.pending_response.take() {
                state.captures += 1;
                if let Some((n, token)) = &state.cancel_after_captures {
                    if state.captures >= *n {
                        token.request();
                    }
                }
                let body = state.detail_bodies.pop_front().unwrap_or_default();
                let _ = tx.send(body);
            }
        }
        Ok(())
    }

    async fn fill(&self, text: &str) -> Result<()> {
        self.lock()
            .fills
            .push((self.selector.clone(), text.to_string()));
        Ok(())
    }

    async fn fill_content_editable(&self, text: &str) -> Result<()> {
        self.fill(text).await
    }

    async fn text_content(&self) -> Result<String> {
        let state = self.lock();
        state
            .texts
            .get(&self.selector)
            .cloned()
            .ok_or_else(|| BrowserError::SelectorNotFound(self.selector.clone()))
    }

    async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        let state = self.lock();
        Ok(state
            .attributes
            .get(&(self.selector.clone(), name.to_string()))
            .cloned())
    }

    async fn tag_name(&self) -> Result<String> {
        let state = self.lock();
        Ok(state
            .tags
            .get(&self.selector)
            .cloned()
            .unwrap_or_else(|| "div".to_string()))
    }

    async fn set_input_files(&self, paths: &[PathBuf]) -> Result<()> {
        self.lock().files_set.extend(paths.iter().cloned());
        Ok(())
    }
}

/// Build a well-formed detail payload for one candidate.
pub fn detail_body(job_id: &str, recruiter_id: &str, company: &str, salary: &str) -> String {
    format!(
        r#"{{
            "code": 0,
            "message": "Success",
            "zpData": {{
                "jobInfo": {{
                    "encryptId": "{job_id}",
                    "encryptUserId": "{recruiter_id}",
                    "jobName": "Rust开发工程师",
                    "salaryDesc": "{salary}",
                    "locationName": "上海",
                    "experienceName": "3-5年",
                    "degreeName": "本科",
                    "postDescription": "负责核心服务开发"
                }},
                "bossInfo": {{
                    "name": "王女士",
                    "title": "HR",
                    "activeTimeDesc": "刚刚活跃"
                }},
                "brandComInfo": {{
                    "brandName": "{company}"
                }}
            }}
        }}"#
    )
}
