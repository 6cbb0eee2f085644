use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

pub const MIN_MAX_TABS: u32 = 1;
pub const MAX_MAX_TABS: u32 = 50;

/// Store keys owned by the settings surface.
pub const SETTINGS_KEYS: [&str; 6] = [
    "hotkey",
    "openMode",
    "maxTabs",
    "boxColor",
    "sameDomainOnly",
    "showConfirmDialog",
];

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OpenMode {
    /// One tab per link, first one focused.
    #[default]
    NewTab,
    /// One tab per link, none focused.
    BackgroundTab,
    /// A fresh window holding every link.
    NewWindow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_hotkey")]
    pub hotkey: char,
    #[serde(default)]
    pub open_mode: OpenMode,
    #[serde(default = "default_max_tabs")]
    pub max_tabs: u32,
    #[serde(default = "default_box_color")]
    pub box_color: String,
    #[serde(default)]
    pub same_domain_only: bool,
    #[serde(default)]
    pub show_confirm_dialog: bool,
}

fn default_hotkey() -> char {
    'z'
}

fn default_max_tabs() -> u32 {
    10
}

fn default_box_color() -> String {
    "#007bff".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey: default_hotkey(),
            open_mode: OpenMode::default(),
            max_tabs: default_max_tabs(),
            box_color: default_box_color(),
            same_domain_only: false,
            show_confirm_dialog: false,
        }
    }
}

/// Clamp a requested tab cap into the supported range.
pub fn clamp_max_tabs(requested: i64) -> u32 {
    let clamped = requested.clamp(i64::from(MIN_MAX_TABS), i64::from(MAX_MAX_TABS));
    u32::try_from(clamped).unwrap_or(MAX_MAX_TABS)
}

impl Settings {
    /// Build settings from raw store entries, one field at a time.
    ///
    /// Missing or ill-typed values fall back to the default for that field only;
    /// the other fields are still honored.
    pub fn from_entries(entries: &Map<String, Value>) -> Self {
        let defaults = Self::default();

        let hotkey = entries
            .get("hotkey")
            .and_then(Value::as_str)
            .and_then(normalize_hotkey)
            .unwrap_or(defaults.hotkey);

        let open_mode = entries
            .get("openMode")
            .and_then(|value| OpenMode::deserialize(value).ok())
            .unwrap_or(defaults.open_mode);

        let max_tabs = entries
            .get("maxTabs")
            .and_then(|value| {
                value
                    .as_i64()
                    .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
                    .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            })
            .map_or(defaults.max_tabs, clamp_max_tabs);

        let box_color = entries
            .get("boxColor")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|color| !color.is_empty())
            .map_or(defaults.box_color, ToString::to_string);

        let same_domain_only = entries
            .get("sameDomainOnly")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.same_domain_only);

        let show_confirm_dialog = entries
            .get("showConfirmDialog")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.show_confirm_dialog);

        Self {
            hotkey,
            open_mode,
            max_tabs,
            box_color,
            same_domain_only,
            show_confirm_dialog,
        }
    }

    /// Re-apply the field invariants to a value built by hand.
    pub fn normalized(mut self) -> Self {
        self.hotkey = self.hotkey.to_lowercase().next().unwrap_or(default_hotkey());
        self.max_tabs = clamp_max_tabs(i64::from(self.max_tabs));
        if self.box_color.trim().is_empty() {
            self.box_color = default_box_color();
        }
        self
    }

    pub fn matches_hotkey(&self, key: &str) -> bool {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => ch.to_lowercase().eq(self.hotkey.to_lowercase()),
            _ => false,
        }
    }
}

/// First character of `raw`, lowercased. Empty input yields `None`.
fn normalize_hotkey(raw: &str) -> Option<char> {
    raw.trim().chars().next()?.to_lowercase().next()
}
