use crate::app::simulate::{self, Gesture, SimulationReport};
use crate::cli::commands::{Cli, Commands, SettingsCommands};
use anyhow::{Result, bail};
use linksweep::config::{SETTINGS_KEYS, Settings, open_store};
use linksweep::coordinator::{
    AllowlistRegistry, AutoDenyPrompt, AutoGrantPrompt, CliPermissionPrompt, PermissionPrompt,
};
use linksweep::geometry::{Point, Rect};
use linksweep::selector::{PageFixture, PageOp, PageSurface, collect_links};
use linksweep::store::SyncStore;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

async fn show_settings(store: &dyn SyncStore) -> Result<()> {
    let settings = Settings::from_entries(&store.get_all().await?);
    println!("{}", t!("cli.settings.title"));
    print!("{}", toml::to_string_pretty(&settings)?);
    Ok(())
}

async fn set_setting(store: &dyn SyncStore, key: &str, raw: &str) -> Result<()> {
    if !SETTINGS_KEYS.contains(&key) {
        bail!(
            "unknown setting `{key}` (expected one of: {})",
            SETTINGS_KEYS.join(", ")
        );
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

    let mut entries = Map::new();
    entries.insert(key.to_string(), value);
    store.set(entries).await?;
    info!(key, "setting updated");

    show_settings(store).await
}

async fn list_origins(store: &dyn SyncStore) -> Result<()> {
    let origins = AllowlistRegistry::default().reload(store).await?;
    if origins.is_empty() {
        println!("{}", t!("cli.origins.empty"));
        return Ok(());
    }
    println!("{}", t!("cli.origins.title", count = origins.len()));
    for origin in origins.as_slice() {
        println!("  {origin}");
    }
    Ok(())
}

async fn collect(store: &dyn SyncStore, page: &Path, from: Point, to: Point) -> Result<()> {
    let settings = Settings::from_entries(&store.get_all().await?);
    let page = PageFixture::load(page).await?.into_page()?;

    let links = collect_links(
        &page.anchors(),
        page.location(),
        Rect::from_corners(from, to),
        settings.same_domain_only,
    );
    if links.is_empty() {
        println!("{}", t!("cli.collect.none"));
    }
    for link in links.as_slice() {
        println!("{link}");
    }
    Ok(())
}

fn print_report(report: &SimulationReport) -> Result<()> {
    for op in &report.page_ops {
        match op {
            PageOp::ConfirmOpened(prompt) => {
                println!("{}", t!("cli.simulate.confirm", text = prompt.message.as_str()));
            }
            PageOp::NoticeShown(notice) => {
                println!("{}", t!("cli.simulate.notice", text = notice.text.as_str()));
            }
            _ => {}
        }
    }

    println!("{}", t!("cli.simulate.ops"));
    for op in &report.host_ops {
        println!("  {}", serde_json::to_string(op)?);
    }
    for outcome in &report.outcomes {
        info!(success = outcome.success, count = outcome.count, "dispatch finished");
    }
    info!(origins = report.allowlist.len(), "allowlist after run");
    Ok(())
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    let store: Arc<dyn SyncStore> = Arc::new(open_store(cli.store.as_deref()).await?);

    match cli.command {
        Commands::Settings { settings_command } => {
            match settings_command.unwrap_or(SettingsCommands::Show) {
                SettingsCommands::Show => show_settings(store.as_ref()).await,
                SettingsCommands::Set { key, value } => {
                    set_setting(store.as_ref(), &key, &value).await
                }
            }
        }

        Commands::Origins => list_origins(store.as_ref()).await,

        Commands::Collect { page, from, to } => collect(store.as_ref(), &page, from, to).await,

        Commands::Simulate {
            page,
            from,
            to,
            deny,
            interactive,
            confirm,
        } => {
            let prompt: Arc<dyn PermissionPrompt> = if deny {
                Arc::new(AutoDenyPrompt {
                    reason: "declined with --deny".into(),
                })
            } else if interactive {
                Arc::new(CliPermissionPrompt::default_timeout())
            } else {
                Arc::new(AutoGrantPrompt)
            };
            let fixture = PageFixture::load(&page).await?;
            let gesture = Gesture { from, to, confirm };

            let report = simulate::run(store, prompt, fixture, gesture).await?;
            print_report(&report)
        }
    }
}
