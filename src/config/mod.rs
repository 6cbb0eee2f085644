pub mod hot_reload;
pub mod loader;
pub mod locale;
pub mod settings;

pub use hot_reload::SettingsHandle;
pub use loader::{default_store_path, open_store};
pub use locale::apply_locale;
pub use settings::{
    MAX_MAX_TABS, MIN_MAX_TABS, OpenMode, SETTINGS_KEYS, Settings, clamp_max_tabs,
};
