//! Scripted page for driving a selector without a browser.

use super::page::{Anchor, ConfirmPrompt, Notice, PageSurface, SelectionStyle};
use crate::geometry::{Point, Rect};
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use url::Url;

/// A page layout loaded from TOML:
///
/// ```toml
/// url = "https://news.example/"
///
/// [[anchors]]
/// href = "/story/1"
/// x = 10
/// y = 20
/// width = 120
/// height = 16
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PageFixture {
    pub url: String,
    #[serde(default)]
    pub anchors: Vec<AnchorFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnchorFixture {
    pub href: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageFixture {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        toml::from_str(raw).context("invalid page fixture")
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn into_page(self) -> anyhow::Result<ScriptedPage> {
        let location = Url::parse(&self.url)
            .with_context(|| format!("page url {:?} is not absolute", self.url))?;
        let anchors = self
            .anchors
            .into_iter()
            .map(|a| Anchor::new(a.href, Rect::new(a.x, a.y, a.width, a.height)))
            .collect();
        Ok(ScriptedPage::new(location, anchors))
    }
}

/// Everything a selector did to the page, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOp {
    Mounted { border: String, fill: String },
    Placed(Rect),
    CountShown { label: String, at: Point },
    CountHidden,
    Unmounted,
    ConfirmOpened(ConfirmPrompt),
    ConfirmClosed,
    NoticeShown(Notice),
}

#[derive(Debug, Clone)]
pub struct ScriptedPage {
    location: Url,
    anchors: Vec<Anchor>,
    ops: Vec<PageOp>,
    overlay_mounted: bool,
}

impl ScriptedPage {
    pub fn new(location: Url, anchors: Vec<Anchor>) -> Self {
        Self {
            location,
            anchors,
            ops: Vec::new(),
            overlay_mounted: false,
        }
    }

    pub fn ops(&self) -> &[PageOp] {
        &self.ops
    }

    pub fn overlay_mounted(&self) -> bool {
        self.overlay_mounted
    }

    pub fn notices(&self) -> Vec<&Notice> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PageOp::NoticeShown(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }
}

impl PageSurface for ScriptedPage {
    fn location(&self) -> &Url {
        &self.location
    }

    fn anchors(&self) -> Vec<Anchor> {
        self.anchors.clone()
    }

    fn mount_overlay(&mut self, style: &SelectionStyle) {
        self.overlay_mounted = true;
        self.ops.push(PageOp::Mounted {
            border: style.border_color.clone(),
            fill: style.fill_css(),
        });
    }

    fn place_selection(&mut self, area: Rect) {
        self.ops.push(PageOp::Placed(area));
    }

    fn show_count(&mut self, label: &str, at: Point) {
        self.ops.push(PageOp::CountShown {
            label: label.to_string(),
            at,
        });
    }

    fn hide_count(&mut self) {
        self.ops.push(PageOp::CountHidden);
    }

    fn unmount_overlay(&mut self) {
        self.overlay_mounted = false;
        self.ops.push(PageOp::Unmounted);
    }

    fn open_confirm(&mut self, prompt: &ConfirmPrompt) {
        self.ops.push(PageOp::ConfirmOpened(prompt.clone()));
    }

    fn close_confirm(&mut self) {
        self.ops.push(PageOp::ConfirmClosed);
    }

    fn show_notice(&mut self, notice: &Notice) {
        self.ops.push(PageOp::NoticeShown(notice.clone()));
    }
}
