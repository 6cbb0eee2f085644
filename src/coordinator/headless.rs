//! In-memory browser used by the simulation CLI and the test suite.

use super::badge::BadgeState;
use super::host::{BrowserHost, HostFuture, NewTab, TabId, TabInfo, WindowId};
use super::inject::is_restricted_page;
use crate::error::HostError;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

/// Observable side effect performed on the headless browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostOp {
    WindowCreated {
        window_id: WindowId,
        tab_id: TabId,
        url: String,
    },
    TabCreated {
        tab_id: TabId,
        window_id: Option<WindowId>,
        url: String,
        active: bool,
    },
    BadgeSet {
        tab_id: TabId,
        state: BadgeState,
    },
    SelectorInjected {
        tab_id: TabId,
    },
}

#[derive(Debug, Default)]
struct Browser {
    tabs: BTreeMap<TabId, TabInfo>,
    focused_window: WindowId,
    next_window: WindowId,
    next_tab: TabId,
    badges: BTreeMap<TabId, BadgeState>,
    injected: HashSet<TabId>,
    broad_host_access: bool,
    failing_urls: HashSet<String>,
    failing_injections: HashSet<TabId>,
    ops: Vec<HostOp>,
}

impl Browser {
    fn allocate_window(&mut self) -> WindowId {
        self.next_window += 1;
        self.next_window
    }

    fn allocate_tab(&mut self) -> TabId {
        self.next_tab += 1;
        self.next_tab
    }

    fn insert_tab(&mut self, window_id: WindowId, url: &str, active: bool) -> TabId {
        let id = self.allocate_tab();
        if active {
            for tab in self.tabs.values_mut().filter(|t| t.window_id == window_id) {
                tab.active = false;
            }
        }
        self.tabs.insert(
            id,
            TabInfo {
                id,
                window_id,
                url: Some(url.to_string()),
                active,
            },
        );
        id
    }
}

#[derive(Debug)]
pub struct HeadlessHost {
    browser: Mutex<Browser>,
}

impl HeadlessHost {
    /// A browser with one empty focused window and no tabs.
    pub fn new() -> Self {
        let mut browser = Browser::default();
        browser.focused_window = browser.allocate_window();
        Self {
            browser: Mutex::new(browser),
        }
    }

    fn with_browser<T>(&self, f: impl FnOnce(&mut Browser) -> T) -> T {
        let mut browser = self
            .browser
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut browser)
    }

    /// Seed a tab in the focused window without recording an operation.
    pub fn open_page(&self, url: &str, active: bool) -> TabId {
        self.with_browser(|b| {
            let window = b.focused_window;
            b.insert_tab(window, url, active)
        })
    }

    pub fn navigate(&self, tab: TabId, url: &str) {
        self.with_browser(|b| {
            if let Some(info) = b.tabs.get_mut(&tab) {
                info.url = Some(url.to_string());
            }
            b.injected.remove(&tab);
        });
    }

    pub fn close_tab(&self, tab: TabId) {
        self.with_browser(|b| {
            b.tabs.remove(&tab);
            b.badges.remove(&tab);
            b.injected.remove(&tab);
        });
    }

    pub fn activate(&self, tab: TabId) {
        self.with_browser(|b| {
            let Some(window) = b.tabs.get(&tab).map(|t| t.window_id) else {
                return;
            };
            for info in b.tabs.values_mut().filter(|t| t.window_id == window) {
                info.active = info.id == tab;
            }
            b.focused_window = window;
        });
    }

    pub fn set_broad_host_access(&self, granted: bool) {
        self.with_browser(|b| b.broad_host_access = granted);
    }

    /// Make every creation call for `url` fail.
    pub fn fail_url(&self, url: &str) {
        self.with_browser(|b| {
            b.failing_urls.insert(url.to_string());
        });
    }

    /// Make injection into `tab` fail with a generic error.
    pub fn fail_injection(&self, tab: TabId) {
        self.with_browser(|b| {
            b.failing_injections.insert(tab);
        });
    }

    pub fn ops(&self) -> Vec<HostOp> {
        self.with_browser(|b| b.ops.clone())
    }

    pub fn badge(&self, tab: TabId) -> Option<BadgeState> {
        self.with_browser(|b| b.badges.get(&tab).copied())
    }

    pub fn injected(&self, tab: TabId) -> bool {
        self.with_browser(|b| b.injected.contains(&tab))
    }

    pub fn tabs(&self) -> Vec<TabInfo> {
        self.with_browser(|b| b.tabs.values().cloned().collect())
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserHost for HeadlessHost {
    fn create_window<'a>(&'a self, url: &'a str) -> HostFuture<'a, WindowId> {
        Box::pin(async move {
            self.with_browser(|b| {
                if b.failing_urls.contains(url) {
                    return Err(HostError::Failed(format!("cannot open window at {url}")));
                }
                let window_id = b.allocate_window();
                let tab_id = b.insert_tab(window_id, url, true);
                b.focused_window = window_id;
                b.ops.push(HostOp::WindowCreated {
                    window_id,
                    tab_id,
                    url: url.to_string(),
                });
                Ok(window_id)
            })
        })
    }

    fn create_tab(&self, tab: NewTab) -> HostFuture<'_, TabId> {
        Box::pin(async move {
            self.with_browser(|b| {
                if b.failing_urls.contains(&tab.url) {
                    return Err(HostError::Failed(format!("cannot open tab at {}", tab.url)));
                }
                let window = tab.window_id.unwrap_or(b.focused_window);
                if tab.window_id.is_some() && !b.tabs.values().any(|t| t.window_id == window) {
                    return Err(HostError::WindowNotFound(window));
                }
                let tab_id = b.insert_tab(window, &tab.url, tab.active);
                b.ops.push(HostOp::TabCreated {
                    tab_id,
                    window_id: tab.window_id,
                    url: tab.url,
                    active: tab.active,
                });
                Ok(tab_id)
            })
        })
    }

    fn tab(&self, id: TabId) -> HostFuture<'_, TabInfo> {
        Box::pin(async move {
            self.with_browser(|b| b.tabs.get(&id).cloned().ok_or(HostError::TabNotFound(id)))
        })
    }

    fn active_tabs(&self) -> HostFuture<'_, Vec<TabInfo>> {
        Box::pin(async move {
            Ok(self.with_browser(|b| b.tabs.values().filter(|t| t.active).cloned().collect()))
        })
    }

    fn set_badge(&self, tab: TabId, state: BadgeState) -> HostFuture<'_, ()> {
        Box::pin(async move {
            self.with_browser(|b| {
                if !b.tabs.contains_key(&tab) {
                    return Err(HostError::TabNotFound(tab));
                }
                b.badges.insert(tab, state);
                b.ops.push(HostOp::BadgeSet { tab_id: tab, state });
                Ok(())
            })
        })
    }

    fn has_broad_host_access(&self) -> HostFuture<'_, bool> {
        Box::pin(async move { Ok(self.with_browser(|b| b.broad_host_access)) })
    }

    fn inject_selector(&self, tab: TabId) -> HostFuture<'_, ()> {
        Box::pin(async move {
            self.with_browser(|b| {
                let url = b
                    .tabs
                    .get(&tab)
                    .ok_or(HostError::TabNotFound(tab))?
                    .url
                    .clone()
                    .unwrap_or_default();
                if is_restricted_page(&url) {
                    return Err(HostError::Failed(format!("cannot access contents of {url}")));
                }
                if b.failing_injections.contains(&tab) {
                    return Err(HostError::Failed("script execution failed".into()));
                }
                if b.injected.insert(tab) {
                    b.ops.push(HostOp::SelectorInjected { tab_id: tab });
                }
                Ok(())
            })
        })
    }
}
