use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// An `<a href>` element as laid out in the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Raw `href` attribute, possibly relative.
    pub href: String,
    pub bounds: Rect,
}

impl Anchor {
    pub fn new(href: impl Into<String>, bounds: Rect) -> Self {
        Self {
            href: href.into(),
            bounds,
        }
    }
}

/// RGB color parsed from the settings' box color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const FALLBACK_RGB: Rgb = Rgb { r: 0, g: 123, b: 255 };

impl Rgb {
    /// Parse `#rrggbb` (the `#` is optional). Anything else yields the default blue.
    pub fn from_hex(hex: &str) -> Self {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return FALLBACK_RGB;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16);
        match (channel(0..2), channel(2..4), channel(4..6)) {
            (Ok(r), Ok(g), Ok(b)) => Self { r, g, b },
            _ => FALLBACK_RGB,
        }
    }
}

/// Visual style of the selection rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionStyle {
    pub border_color: String,
    pub fill: Rgb,
    pub fill_alpha: f32,
}

impl SelectionStyle {
    pub fn from_box_color(box_color: &str) -> Self {
        Self {
            border_color: box_color.to_string(),
            fill: Rgb::from_hex(box_color),
            fill_alpha: 0.1,
        }
    }

    pub fn fill_css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            self.fill.r, self.fill.g, self.fill.b, self.fill_alpha
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub message: String,
    pub open_label: String,
    pub cancel_label: String,
}

/// Dismissible on-page notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub dismiss_after: Duration,
}

/// The page a selector runs in: its anchors and the overlay it can draw.
pub trait PageSurface {
    fn location(&self) -> &Url;

    /// Every anchor element carrying an `href`, in document order.
    fn anchors(&self) -> Vec<Anchor>;

    fn mount_overlay(&mut self, style: &SelectionStyle);

    fn place_selection(&mut self, area: Rect);

    fn show_count(&mut self, label: &str, at: Point);

    fn hide_count(&mut self);

    fn unmount_overlay(&mut self);

    fn open_confirm(&mut self, prompt: &ConfirmPrompt);

    fn close_confirm(&mut self);

    fn show_notice(&mut self, notice: &Notice);
}
