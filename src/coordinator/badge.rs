use super::allowlist::{OriginAllowlist, origin_of};
use super::host::TabId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use strum::Display;
use tokio_util::sync::CancellationToken;

/// How long the "executed" badge stays up before reverting.
pub const PULSE_DWELL: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BadgeState {
    Cleared,
    Allowed,
    Executed,
}

impl BadgeState {
    pub fn text(self) -> &'static str {
        match self {
            Self::Cleared => "",
            Self::Allowed => "ON",
            Self::Executed => "✓",
        }
    }

    pub fn color(self) -> Option<&'static str> {
        match self {
            Self::Cleared => None,
            Self::Allowed => Some("#2563eb"),
            Self::Executed => Some("#16a34a"),
        }
    }
}

/// Steady-state badge for a page: allowed iff its origin is on the list.
pub fn steady_badge(page_url: Option<&str>, allowlist: &OriginAllowlist) -> BadgeState {
    match page_url.and_then(origin_of) {
        Some(origin) if allowlist.contains(&origin) => BadgeState::Allowed,
        _ => BadgeState::Cleared,
    }
}

#[derive(Debug)]
struct PendingPulse {
    generation: u64,
    cancel: CancellationToken,
}

/// Pending pulse reversions, keyed by tab. Latest trigger wins.
#[derive(Debug, Default)]
pub struct BadgeTimers {
    pending: Mutex<HashMap<TabId, PendingPulse>>,
    generations: AtomicU64,
}

impl BadgeTimers {
    /// Register a new pending reversion for `tab`, cancelling any earlier one.
    /// Returns the generation the reversion must present to [`Self::complete`].
    pub fn set(&self, tab: TabId, cancel: CancellationToken) -> u64 {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(tab, PendingPulse { generation, cancel });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
        generation
    }

    /// Cancel and forget the pending reversion for `tab`, if any.
    pub fn cancel_if_present(&self, tab: TabId) -> bool {
        let removed = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&tab);
        match removed {
            Some(pulse) => {
                pulse.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Generation of the pending reversion for `tab`.
    pub fn get(&self, tab: TabId) -> Option<u64> {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&tab)
            .map(|pulse| pulse.generation)
    }

    /// Retire the reversion for `tab` if `generation` is still current.
    /// A superseded reversion gets `false` and must not touch the badge.
    pub fn complete(&self, tab: TabId, generation: u64) -> bool {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match pending.get(&tab) {
            Some(pulse) if pulse.generation == generation => {
                pending.remove(&tab);
                true
            }
            _ => false,
        }
    }
}
