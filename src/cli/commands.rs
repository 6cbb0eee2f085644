use clap::{Parser, Subcommand, ValueEnum};
use linksweep::geometry::Point;
use std::path::PathBuf;

/// `linksweep` - drag-select links on a page and open them as tabs.
#[derive(Parser, Debug)]
#[command(name = "linksweep")]
#[command(version = "0.1.0")]
#[command(about = "Drag-select links on a page and open them as tabs.", long_about = None)]
pub struct Cli {
    /// Shared store file (default: ~/.linksweep/store.toml)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// UI language (en, ko)
    #[arg(long, global = true)]
    pub locale: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show or change settings in the shared store
    Settings {
        #[command(subcommand)]
        settings_command: Option<SettingsCommands>,
    },

    /// List origins the selector is allowed to run on
    Origins,

    /// Print the links a drag gesture over a page fixture would collect
    Collect {
        /// Page fixture (TOML with `url` and `[[anchors]]`)
        #[arg(long)]
        page: PathBuf,

        /// Gesture start, as `x,y`
        #[arg(long, value_parser = parse_point)]
        from: Point,

        /// Gesture end, as `x,y`
        #[arg(long, value_parser = parse_point)]
        to: Point,
    },

    /// Run a full gesture against a headless browser and print what it did
    Simulate {
        /// Page fixture (TOML with `url` and `[[anchors]]`)
        #[arg(long)]
        page: PathBuf,

        /// Gesture start, as `x,y`
        #[arg(long, value_parser = parse_point)]
        from: Point,

        /// Gesture end, as `x,y`
        #[arg(long, value_parser = parse_point)]
        to: Point,

        /// Refuse the host-access prompt
        #[arg(long, conflicts_with = "interactive")]
        deny: bool,

        /// Ask on the terminal instead of granting host access automatically
        #[arg(long)]
        interactive: bool,

        /// Answer to the confirm dialog, when it is enabled
        #[arg(long, value_enum, default_value_t = ConfirmChoice::Open)]
        confirm: ConfirmChoice,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Print the effective settings
    Show,

    /// Write one setting (value is parsed as JSON, falling back to a string)
    Set {
        /// Setting key (hotkey, openMode, maxTabs, boxColor, sameDomainOnly, showConfirmDialog)
        key: String,

        /// New value
        value: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Open,
    Cancel,
}

fn parse_point(raw: &str) -> Result<Point, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{raw}`"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in `{raw}`: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in `{raw}`: {e}"))?;
    Ok(Point::new(x, y))
}
