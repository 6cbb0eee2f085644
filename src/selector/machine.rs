//! Drag-select gesture as an explicit state machine.
//!
//! The machine never touches the page. It consumes [`Input`]s and returns the
//! [`Effect`]s the caller must perform, asking a [`LinkSource`] whenever it
//! needs to know which links sit under a rectangle.

use super::collect::LinkSet;
use super::throttle::Throttle;
use crate::config::{OpenMode, Settings};
use crate::geometry::{Point, Rect};
use crate::messaging::OpenLinksRequest;
use std::time::Instant;

/// Count label offset from the selection's bottom-right corner.
const COUNT_LABEL_OFFSET: (f64, f64) = (-50.0, -30.0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyPress {
    /// A key with no modifiers held.
    pub fn plain(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn has_modifier(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    KeyDown(KeyPress),
    KeyUp(KeyPress),
    PointerMove { at: Point, now: Instant },
    ConfirmClicked,
    CancelClicked,
    /// The page is going away or lost focus mid-gesture.
    Abort,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the coordinator to allowlist this page's origin (fire-and-forget).
    RegisterOrigin,
    MountOverlay { box_color: String },
    PlaceSelection(Rect),
    ShowCount { count: usize, at: Point },
    HideCount,
    /// Remove the selection overlay. Emitted exactly once per gesture.
    Teardown,
    OpenConfirm { count: usize, open_mode: OpenMode },
    CloseConfirm,
    Dispatch(OpenLinksRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Selecting,
    ConfirmPending,
}

/// Answers "which links are under this rectangle right now".
pub trait LinkSource {
    fn links_in(&self, area: Rect) -> LinkSet;
}

impl<F> LinkSource for F
where
    F: Fn(Rect) -> LinkSet,
{
    fn links_in(&self, area: Rect) -> LinkSet {
        self(area)
    }
}

#[derive(Debug, Default)]
struct Session {
    anchor: Option<Point>,
    current: Option<Point>,
}

impl Session {
    fn area(&self) -> Option<Rect> {
        Some(Rect::from_corners(self.anchor?, self.current?))
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Selecting(Session),
    ConfirmPending(OpenLinksRequest),
}

#[derive(Debug)]
pub struct SelectionMachine {
    state: State,
    throttle: Throttle,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::with_throttle(Throttle::default())
    }

    pub fn with_throttle(throttle: Throttle) -> Self {
        Self {
            state: State::Idle,
            throttle,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::Selecting(_) => Phase::Selecting,
            State::ConfirmPending(_) => Phase::ConfirmPending,
        }
    }

    /// Feed one input. `settings` is read fresh on every call so live changes
    /// apply mid-gesture.
    pub fn handle(
        &mut self,
        input: Input,
        settings: &Settings,
        links: &dyn LinkSource,
    ) -> Vec<Effect> {
        match input {
            Input::KeyDown(key) => self.key_down(&key, settings),
            Input::KeyUp(key) => self.key_up(&key, settings, links),
            Input::PointerMove { at, now } => self.pointer_move(at, now, links),
            Input::ConfirmClicked => self.resolve_confirm(true),
            Input::CancelClicked => self.resolve_confirm(false),
            Input::Abort => self.abort(),
        }
    }

    fn key_down(&mut self, key: &KeyPress, settings: &Settings) -> Vec<Effect> {
        match self.state {
            State::Idle if settings.matches_hotkey(&key.key) && !key.has_modifier() => {
                self.state = State::Selecting(Session::default());
                self.throttle.reset();
                vec![
                    Effect::RegisterOrigin,
                    Effect::MountOverlay {
                        box_color: settings.box_color.clone(),
                    },
                ]
            }
            State::ConfirmPending(_) => match key.key.as_str() {
                "Enter" => self.resolve_confirm(true),
                "Escape" => self.resolve_confirm(false),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn pointer_move(&mut self, at: Point, now: Instant, links: &dyn LinkSource) -> Vec<Effect> {
        let State::Selecting(session) = &mut self.state else {
            return Vec::new();
        };

        if session.anchor.is_none() {
            session.anchor = Some(at);
            session.current = Some(at);
            return Vec::new();
        }
        session.current = Some(at);

        let Some(area) = session.area() else {
            return Vec::new();
        };
        let mut effects = vec![Effect::PlaceSelection(area)];

        if self.throttle.try_admit(now) {
            let count = links.links_in(area).len();
            if count > 0 {
                let (dx, dy) = COUNT_LABEL_OFFSET;
                effects.push(Effect::ShowCount {
                    count,
                    at: area.bottom_right().offset(dx, dy),
                });
            } else {
                effects.push(Effect::HideCount);
            }
        }
        effects
    }

    fn key_up(
        &mut self,
        key: &KeyPress,
        settings: &Settings,
        links: &dyn LinkSource,
    ) -> Vec<Effect> {
        if !matches!(self.state, State::Selecting(_)) || !settings.matches_hotkey(&key.key) {
            return Vec::new();
        }
        let State::Selecting(session) = std::mem::replace(&mut self.state, State::Idle) else {
            return Vec::new();
        };

        let mut effects = vec![Effect::Teardown];
        let Some(area) = session.area() else {
            tracing::debug!("gesture ended before the pointer moved; nothing to collect");
            return effects;
        };

        // Fresh collection: the last throttled count may be stale.
        let found = links.links_in(area);
        if found.is_empty() {
            return effects;
        }

        let request = OpenLinksRequest {
            links: found.into_vec(),
            open_mode: settings.open_mode,
            max_tabs: settings.max_tabs,
        };

        if settings.show_confirm_dialog {
            effects.push(Effect::OpenConfirm {
                count: request.links.len(),
                open_mode: request.open_mode,
            });
            self.state = State::ConfirmPending(request);
        } else {
            effects.push(Effect::Dispatch(request));
        }
        effects
    }

    fn resolve_confirm(&mut self, open: bool) -> Vec<Effect> {
        if !matches!(self.state, State::ConfirmPending(_)) {
            return Vec::new();
        }
        let State::ConfirmPending(request) = std::mem::replace(&mut self.state, State::Idle) else {
            return Vec::new();
        };

        if open {
            vec![Effect::CloseConfirm, Effect::Dispatch(request)]
        } else {
            vec![Effect::CloseConfirm]
        }
    }

    fn abort(&mut self) -> Vec<Effect> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => Vec::new(),
            State::Selecting(_) => vec![Effect::Teardown],
            State::ConfirmPending(_) => vec![Effect::CloseConfirm],
        }
    }
}

impl Default for SelectionMachine {
    fn default() -> Self {
        Self::new()
    }
}
