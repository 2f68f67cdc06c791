//! Login session monitoring.
//!
//! Detection reads the navigation bar: the username label (or its badge)
//! means logged in, a visible sign-in affordance whose text mentions login
//! means logged out, anything else keeps the previous verdict. Detection
//! errors are treated as "no change" so a flaky page never flaps the state.
//! Listeners are notified only on transitions.

use crate::error::{EngineError, Result};
use crate::selectors;
use jobpilot_browser::BrowserSurface;
use jobpilot_core::{CancelToken, Platform};
use jobpilot_db::{sessions, Database};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

/// Time between periodic login probes.
const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// How long a run waits for the user to finish logging in.
const LOGIN_WAIT_TIMEOUT: Duration = Duration::from_secs(180);

/// Tick between login-wait probes.
const LOGIN_WAIT_TICK: Duration = Duration::from_millis(600);

/// Observed login state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// No verdict yet.
    Unknown,
    /// An authenticated session is active.
    LoggedIn,
    /// The page shows the anonymous-visitor chrome.
    LoggedOut,
}

/// Callback invoked on login-state transitions.
pub type LoginListener = Arc<dyn Fn(Platform, LoginState) + Send + Sync>;

/// Watches one surface for login-state changes.
pub struct SessionMonitor {
    surface: Arc<dyn BrowserSurface>,
    db: Database,
    platform: Platform,
    state: Mutex<LoginState>,
    listeners: RwLock<Vec<LoginListener>>,
    paused: AtomicBool,
    cookies_saved: AtomicBool,
}

impl SessionMonitor {
    /// Create a monitor over `surface`.
    #[must_use]
    pub fn new(surface: Arc<dyn BrowserSurface>, db: Database, platform: Platform) -> Self {
        Self {
            surface,
            db,
            platform,
            state: Mutex::new(LoginState::Unknown),
            listeners: RwLock::new(Vec::new()),
            paused: AtomicBool::new(false),
            cookies_saved: AtomicBool::new(false),
        }
    }

    fn state_lock(&self) -> MutexGuard<'_, LoginState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a transition listener.
    pub fn subscribe(&self, listener: LoginListener) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Current verdict.
    #[must_use]
    pub fn current_state(&self) -> LoginState {
        *self.state_lock()
    }

    /// Whether the last verdict was logged-in.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.current_state() == LoginState::LoggedIn
    }

    /// Suspend probing. The delivery flow holds the single mutating slot on
    /// the browser; probing during it would interleave DOM reads with it.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Resume probing.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Whether probing is suspended.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    async fn probe(&self) -> Result<Option<LoginState>> {
        let label = self.surface.locate(selectors::NAV_USER_LABEL).await?;
        if label.is_visible().await? {
            return Ok(Some(LoginState::LoggedIn));
        }

        let badge = self.surface.locate(selectors::NAV_USER_BADGE).await?;
        if badge.is_visible().await? {
            return Ok(Some(LoginState::LoggedIn));
        }

        let sign_in = self.surface.locate(selectors::NAV_SIGN_IN).await?;
        if sign_in.is_visible().await? {
            let text = sign_in.text_content().await?;
            if text.contains(selectors::SIGN_IN_TEXT) {
                return Ok(Some(LoginState::LoggedOut));
            }
        }

        Ok(None)
    }

    /// Run one probe and apply its verdict. A paused monitor does nothing:
    /// the delivery flow owns the surface and no verdict may change under it.
    pub async fn check_now(&self) {
        if self.is_paused() {
            return;
        }
        match self.probe().await {
            Ok(Some(state)) => self.apply_state(state).await,
            Ok(None) => {}
            Err(e) => {
                tracing::debug!("login probe failed, keeping previous state: {}", e);
            }
        }
    }

    async fn apply_state(&self, new_state: LoginState) {
        let changed = {
            let mut state = self.state_lock();
            if *state == new_state {
                false
            } else {
                tracing::info!(
                    "login state for {} changed: {:?} -> {:?}",
                    self.platform,
                    *state,
                    new_state
                );
                *state = new_state;
                true
            }
        };

        if !changed {
            return;
        }

        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            let platform = self.platform;
            tokio::spawn(async move {
                listener(platform, new_state);
            });
        }

        if new_state == LoginState::LoggedIn && !self.cookies_saved.swap(true, Ordering::SeqCst) {
            self.persist_cookies().await;
        }

        // Losing the session steers the surface to the login page so the
        // user can scan straight away.
        if new_state == LoginState::LoggedOut {
            if let Err(e) = self.prompt_login().await {
                tracing::warn!("login guidance failed: {}", e);
            }
        }
    }

    async fn persist_cookies(&self) {
        match self.surface.cookies_json().await {
            Ok(cookies) => {
                if let Err(e) =
                    sessions::save_session(self.db.pool(), self.platform, &cookies).await
                {
                    tracing::warn!("failed to persist session cookies: {}", e);
                }
            }
            Err(e) => tracing::warn!("failed to snapshot cookies: {}", e),
        }
    }

    /// Restore cookies from the last stored session, if one exists.
    ///
    /// Returns `true` if a snapshot was applied.
    pub async fn restore_cookies(&self) -> Result<bool> {
        match sessions::load_session(self.db.pool(), self.platform).await? {
            Some(stored) => {
                self.surface.set_cookies_json(&stored.cookies).await?;
                tracing::info!(
                    "restored {} session cookies saved at {}",
                    self.platform,
                    stored.saved_at
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Open the login page and switch it to the QR panel if possible.
    ///
    /// Navigation is skipped when the surface is already there. The QR
    /// switch selector has changed across site versions; the first present
    /// variant wins.
    pub async fn prompt_login(&self) -> Result<()> {
        let here = self.surface.current_url().await.unwrap_or_default();
        if !here.starts_with(selectors::LOGIN_URL) {
            self.surface.navigate(selectors::LOGIN_URL).await?;
        }

        for selector in selectors::LOGIN_QR_SWITCHES {
            let switch = self.surface.locate(selector).await?;
            if switch.is_visible().await.unwrap_or(false) {
                switch.click().await?;
                tracing::info!("switched login page to QR panel via {}", selector);
                return Ok(());
            }
        }

        tracing::warn!("no QR switch variant found on login page");
        Ok(())
    }

    /// Block until the session is logged in, the wait times out, or the run
    /// is cancelled.
    ///
    /// # Errors
    /// `EngineError::Cancelled` or `EngineError::LoginTimeout`.
    pub async fn wait_for_login(&self, cancel: &CancelToken) -> Result<()> {
        let deadline = tokio::time::Instant::now() + LOGIN_WAIT_TIMEOUT;

        loop {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            self.check_now().await;
            if self.is_logged_in() {
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(EngineError::LoginTimeout);
            }
            tokio::time::sleep(LOGIN_WAIT_TICK).await;
        }
    }

    /// Spawn the background probe loop: a periodic tick plus a probe after
    /// every main-frame navigation. Stops when `cancel` fires.
    pub fn spawn(self: &Arc<Self>, cancel: CancelToken) -> tokio::task::JoinHandle<()> {
        let monitor = Arc::clone(self);

        tokio::spawn(async move {
            let mut navigations = match monitor.surface.subscribe_navigations().await {
                Ok(rx) => Some(rx),
                Err(e) => {
                    tracing::warn!("navigation events unavailable, polling only: {}", e);
                    None
                }
            };
            let mut ticker = tokio::time::interval(POLL_INTERVAL);

            loop {
                if cancel.is_cancelled() {
                    break;
                }

                match navigations.as_mut() {
                    Some(navs) => {
                        tokio::select! {
                            _ = ticker.tick() => {}
                            nav = navs.recv() => {
                                if nav.is_none() {
                                    navigations = None;
                                }
                            }
                        }
                    }
                    None => {
                        ticker.tick().await;
                    }
                }

                if cancel.is_cancelled() {
                    break;
                }
                if monitor.is_paused() {
                    continue;
                }
                monitor.check_now().await;
            }
        })
    }
}
