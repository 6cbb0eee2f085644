//! Session-wide coordinator: origin allowlist, host permission, per-tab badge
//! and tab/window dispatch.

pub mod allowlist;
pub mod badge;
pub mod dispatch;
pub mod headless;
pub mod host;
pub mod inject;
pub mod permission;

pub use allowlist::{AllowlistRegistry, OriginAllowlist, origin_of};
pub use badge::{BadgeState, BadgeTimers, PULSE_DWELL, steady_badge};
pub use headless::{HeadlessHost, HostOp};
pub use host::{BrowserHost, NewTab, TabId, TabInfo, WindowId};
pub use inject::{Activation, activate_selector, is_restricted_page};
pub use permission::{
    AutoDenyPrompt, AutoGrantPrompt, CliPermissionPrompt, PermissionDecision, PermissionPrompt,
};

use crate::error::{HostError, StoreError};
use crate::messaging::{
    OpenLinksOutcome, OpenLinksRequest, RegisterReason, RegistrationOutcome, Request, Response,
};
use crate::store::{ALLOWED_ORIGINS_KEY, SyncStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Environment-driven triggers, as delivered by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserEvent {
    Startup,
    TabUpdated { tab: TabId, complete: bool },
    TabActivated { tab: TabId },
    TabRemoved { tab: TabId },
    AllowlistChanged,
    ActionClicked { tab: TabId },
}

pub struct Coordinator {
    host: Arc<dyn BrowserHost>,
    prompt: Arc<dyn PermissionPrompt>,
    store: Arc<dyn SyncStore>,
    allowlist: AllowlistRegistry,
    timers: BadgeTimers,
    /// One gate per origin currently being registered.
    registrations: Mutex<HashMap<String, Arc<OnceCell<RegistrationOutcome>>>>,
    pulse_dwell: Duration,
}

impl Coordinator {
    pub fn new(
        host: Arc<dyn BrowserHost>,
        prompt: Arc<dyn PermissionPrompt>,
        store: Arc<dyn SyncStore>,
    ) -> Self {
        Self {
            host,
            prompt,
            store,
            allowlist: AllowlistRegistry::default(),
            timers: BadgeTimers::default(),
            registrations: Mutex::new(HashMap::new()),
            pulse_dwell: PULSE_DWELL,
        }
    }

    pub fn with_pulse_dwell(mut self, dwell: Duration) -> Self {
        self.pulse_dwell = dwell;
        self
    }

    pub fn allowlist(&self) -> OriginAllowlist {
        self.allowlist.snapshot()
    }

    /// Answer one page request. Requests share nothing but the allowlist and
    /// the badge map, so callers may run many of these concurrently.
    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::RegisterOrigin { origin } => {
                Response::Registration(self.register_origin(&origin).await)
            }
            Request::OpenLinks(request) => Response::Opened(self.open_links(&request).await),
        }
    }

    pub async fn open_links(&self, request: &OpenLinksRequest) -> OpenLinksOutcome {
        dispatch::open_links(self.host.as_ref(), request).await
    }

    /// Add `raw` to the allowlist, prompting for host access when needed.
    ///
    /// Concurrent registrations of the same origin share one in-flight
    /// attempt, so they see one prompt and receive the same outcome even
    /// when access is refused.
    pub async fn register_origin(&self, raw: &str) -> RegistrationOutcome {
        let Some(origin) = origin_of(raw) else {
            tracing::debug!(origin = raw, "rejecting invalid origin");
            return RegistrationOutcome::refused(RegisterReason::InvalidOrigin);
        };

        if self.allowlist.contains(&origin) {
            return self.granted();
        }

        let attempt = self.registration_attempt(&origin);
        let outcome = attempt.get_or_init(|| self.negotiate(&origin)).await.clone();
        self.release_registration_attempt(&origin, attempt);

        if outcome.success {
            self.on_allowlist_changed().await;
        }
        outcome
    }

    async fn negotiate(&self, origin: &str) -> RegistrationOutcome {
        if self.allowlist.contains(origin) {
            return self.granted();
        }

        let already_granted = match self.host.has_broad_host_access().await {
            Ok(granted) => granted,
            Err(error) => {
                tracing::warn!(%origin, %error, "failed to query host permission");
                return RegistrationOutcome::refused(RegisterReason::Unknown);
            }
        };

        if !already_granted {
            match self.prompt.request_host_access(origin).await {
                Ok(PermissionDecision::Granted) => {
                    tracing::info!(%origin, "host access granted");
                }
                Ok(PermissionDecision::Denied { reason }) => {
                    tracing::info!(%origin, %reason, "host access denied");
                    return RegistrationOutcome::refused(RegisterReason::UserDenied);
                }
                Err(error) => {
                    tracing::warn!(%origin, %error, "permission prompt failed");
                    return RegistrationOutcome::refused(RegisterReason::Unknown);
                }
            }
        }

        match self.allowlist.append(self.store.as_ref(), origin).await {
            Ok(_) => self.granted(),
            Err(error) => {
                tracing::warn!(%origin, %error, "failed to persist allowlist");
                RegistrationOutcome::refused(RegisterReason::Unknown)
            }
        }
    }

    fn granted(&self) -> RegistrationOutcome {
        RegistrationOutcome::granted(self.allowlist.snapshot().as_slice().to_vec())
    }

    fn registration_attempt(&self, origin: &str) -> Arc<OnceCell<RegistrationOutcome>> {
        let mut gates = self
            .registrations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(gates.entry(origin.to_string()).or_default())
    }

    fn release_registration_attempt(
        &self,
        origin: &str,
        attempt: Arc<OnceCell<RegistrationOutcome>>,
    ) {
        let mut gates = self
            .registrations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // Ours plus the map's: nobody else is queued on it.
        if Arc::strong_count(&attempt) == 2 {
            gates.remove(origin);
        }
    }

    /// Load the allowlist, then bring every active tab up to date.
    pub async fn startup(&self) -> Result<(), StoreError> {
        let list = self.allowlist.reload(self.store.as_ref()).await?;
        tracing::info!(origins = list.len(), "coordinator started");

        for tab in self.active_tabs().await {
            self.apply_badge(&tab).await;
            self.ensure_selector(&tab).await;
        }
        Ok(())
    }

    pub async fn on_event(self: &Arc<Self>, event: BrowserEvent) {
        match event {
            BrowserEvent::Startup => {
                if let Err(error) = self.startup().await {
                    tracing::warn!(%error, "startup failed to load allowlist");
                }
            }
            BrowserEvent::TabUpdated { tab, complete } => {
                if complete {
                    self.on_tab_loaded(tab).await;
                }
            }
            BrowserEvent::TabActivated { tab } => self.on_tab_activated(tab).await,
            BrowserEvent::TabRemoved { tab } => self.on_tab_removed(tab),
            BrowserEvent::AllowlistChanged => self.on_allowlist_changed().await,
            BrowserEvent::ActionClicked { tab } => self.on_action_clicked(tab).await,
        }
    }

    pub async fn on_tab_loaded(&self, tab: TabId) {
        match self.host.tab(tab).await {
            Ok(info) => {
                self.apply_badge(&info).await;
                self.ensure_selector(&info).await;
            }
            Err(error) => tracing::debug!(tab, %error, "loaded tab vanished"),
        }
    }

    pub async fn on_tab_activated(&self, tab: TabId) {
        if let Err(error) = self.refresh_badge(tab).await {
            tracing::debug!(tab, %error, "failed to refresh badge");
        }
    }

    /// A closed tab's pending reversion must not fire against a dead id.
    pub fn on_tab_removed(&self, tab: TabId) {
        if self.timers.cancel_if_present(tab) {
            tracing::debug!(tab, "dropped pending badge reversion for closed tab");
        }
    }

    /// Re-apply badges to the active tab of every window.
    pub async fn on_allowlist_changed(&self) {
        for tab in self.active_tabs().await {
            self.apply_badge(&tab).await;
        }
    }

    /// Recompute and show the steady-state badge for `tab`.
    ///
    /// A pending pulse keeps its "executed" badge until it reverts itself.
    pub async fn refresh_badge(&self, tab: TabId) -> Result<BadgeState, HostError> {
        let info = self.host.tab(tab).await?;
        Ok(self.apply_badge(&info).await)
    }

    async fn apply_badge(&self, tab: &TabInfo) -> BadgeState {
        if self.timers.get(tab.id).is_some() {
            return BadgeState::Executed;
        }
        let state = steady_badge(tab.url.as_deref(), &self.allowlist.snapshot());
        if let Err(error) = self.host.set_badge(tab.id, state).await {
            tracing::debug!(tab = tab.id, %error, "failed to set badge");
        }
        state
    }

    async fn active_tabs(&self) -> Vec<TabInfo> {
        self.host.active_tabs().await.unwrap_or_else(|error| {
            tracing::warn!(%error, "failed to list active tabs");
            Vec::new()
        })
    }

    /// Inject the selector when the page's origin is allowlisted and broad
    /// host access is held.
    async fn ensure_selector(&self, tab: &TabInfo) {
        let url = tab.url.as_deref();
        let allowed = url
            .and_then(origin_of)
            .is_some_and(|origin| self.allowlist.contains(&origin));
        if !allowed {
            return;
        }
        match self.host.has_broad_host_access().await {
            Ok(true) => {
                // Failures are already logged with their classification.
                let _ = activate_selector(self.host.as_ref(), tab.id, url).await;
            }
            Ok(false) => {}
            Err(error) => tracing::debug!(tab = tab.id, %error, "failed to query host permission"),
        }
    }

    /// Toolbar action: register the page's origin if needed, make sure the
    /// selector is present, and flash the "executed" badge.
    pub async fn on_action_clicked(self: &Arc<Self>, tab: TabId) {
        let info = match self.host.tab(tab).await {
            Ok(info) => info,
            Err(error) => {
                tracing::debug!(tab, %error, "action clicked on vanished tab");
                return;
            }
        };
        let url = info.url.as_deref();

        if let Some(origin) = url.and_then(origin_of)
            && !self.allowlist.contains(&origin)
        {
            let outcome = self.register_origin(&origin).await;
            if !outcome.success {
                tracing::info!(
                    tab,
                    %origin,
                    reason = ?outcome.reason,
                    "action ignored without access"
                );
                return;
            }
        }

        if activate_selector(self.host.as_ref(), tab, url).await.is_err() {
            return;
        }
        self.pulse(tab).await;
    }

    /// Show "executed" on `tab` and schedule reversion after the dwell time.
    /// A newer pulse on the same tab supersedes any pending reversion.
    pub async fn pulse(self: &Arc<Self>, tab: TabId) {
        let cancel = CancellationToken::new();
        let generation = self.timers.set(tab, cancel.clone());

        if let Err(error) = self.host.set_badge(tab, BadgeState::Executed).await {
            tracing::debug!(tab, %error, "failed to show executed badge");
        }

        let this = Arc::clone(self);
        let dwell = self.pulse_dwell;
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(dwell) => {
                    if this.timers.complete(tab, generation)
                        && let Err(error) = this.refresh_badge(tab).await
                    {
                        tracing::debug!(tab, %error, "failed to revert badge");
                    }
                }
            }
        });
    }

    /// Follow allowlist writes made by any context, re-applying badges.
    pub fn watch_store(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let mut changes = this.store.subscribe();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) if change.touches(&[ALLOWED_ORIGINS_KEY]) => {}
                    Ok(_) => continue,
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
                if let Err(error) = this.allowlist.reload(this.store.as_ref()).await {
                    tracing::warn!(%error, "failed to reload allowlist");
                    continue;
                }
                this.on_allowlist_changed().await;
            }
        })
    }
}
