use super::badge::BadgeState;
use crate::error::HostError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

pub type TabId = u64;
pub type WindowId = u64;

pub type HostFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, HostError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub window_id: WindowId,
    pub url: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTab {
    pub url: String,
    /// Target window; `None` means the currently focused one.
    pub window_id: Option<WindowId>,
    pub active: bool,
}

/// Privileged browser operations available to the coordinator.
pub trait BrowserHost: Send + Sync {
    /// Open a new focused window showing `url`.
    fn create_window<'a>(&'a self, url: &'a str) -> HostFuture<'a, WindowId>;

    fn create_tab(&self, tab: NewTab) -> HostFuture<'_, TabId>;

    fn tab(&self, id: TabId) -> HostFuture<'_, TabInfo>;

    /// The active tab of every open window.
    fn active_tabs(&self) -> HostFuture<'_, Vec<TabInfo>>;

    fn set_badge(&self, tab: TabId, state: BadgeState) -> HostFuture<'_, ()>;

    /// Whether the all-sites host permission is already held.
    fn has_broad_host_access(&self) -> HostFuture<'_, bool>;

    /// Inject the page-side selector into `tab`.
    fn inject_selector(&self, tab: TabId) -> HostFuture<'_, ()>;
}
