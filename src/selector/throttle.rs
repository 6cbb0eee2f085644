use std::time::{Duration, Instant};

/// Live-count refresh floor while dragging.
pub const COUNT_REFRESH_WINDOW: Duration = Duration::from_millis(100);

/// Fixed-window gate: admits at most one call per `window`. Calls arriving
/// inside the window are dropped, not deferred.
#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    last_admitted: Option<Instant>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_admitted: None,
        }
    }

    pub fn try_admit(&mut self, now: Instant) -> bool {
        let admit = self
            .last_admitted
            .is_none_or(|last| now.saturating_duration_since(last) >= self.window);
        if admit {
            self.last_admitted = Some(now);
        }
        admit
    }

    pub fn reset(&mut self) {
        self.last_admitted = None;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(COUNT_REFRESH_WINDOW)
    }
}
