use crate::cli::commands::ConfirmChoice;
use anyhow::Result;
use linksweep::config::SettingsHandle;
use linksweep::coordinator::{Coordinator, HeadlessHost, HostOp, PermissionPrompt};
use linksweep::geometry::Point;
use linksweep::messaging::{CoordinatorClient, OpenLinksOutcome, spawn_endpoint};
use linksweep::selector::{
    COUNT_REFRESH_WINDOW, Input, KeyPress, PageFixture, PageOp, PageSurface, Phase, Selector,
};
use linksweep::store::SyncStore;
use std::sync::Arc;
use std::time::Instant;

/// A straight drag from `from` to `to` with the hotkey held.
#[derive(Debug, Clone, Copy)]
pub struct Gesture {
    pub from: Point,
    pub to: Point,
    pub confirm: ConfirmChoice,
}

#[derive(Debug)]
pub struct SimulationReport {
    pub page_ops: Vec<PageOp>,
    pub host_ops: Vec<HostOp>,
    pub outcomes: Vec<OpenLinksOutcome>,
    pub allowlist: Vec<String>,
}

/// Load `fixture` into a headless browser tab, run `gesture` through a
/// selector wired to a live coordinator, and report what happened.
pub async fn run(
    store: Arc<dyn SyncStore>,
    prompt: Arc<dyn PermissionPrompt>,
    fixture: PageFixture,
    gesture: Gesture,
) -> Result<SimulationReport> {
    let page = fixture.into_page()?;
    let host = Arc::new(HeadlessHost::new());
    host.open_page(page.location().as_str(), true);

    let coordinator = Arc::new(Coordinator::new(host.clone(), prompt, Arc::clone(&store)));
    coordinator.startup().await?;
    let watcher = coordinator.watch_store();

    let settings = SettingsHandle::from_store(store.as_ref()).await?;
    let hotkey = settings.load().hotkey.to_string();
    let client: Arc<dyn CoordinatorClient> = Arc::new(spawn_endpoint(Arc::clone(&coordinator)));
    let mut selector = Selector::new(page, settings, client);

    let start = Instant::now();
    selector.handle(Input::KeyDown(KeyPress::plain(hotkey.as_str())));
    selector.handle(Input::PointerMove {
        at: gesture.from,
        now: start,
    });
    selector.handle(Input::PointerMove {
        at: gesture.to,
        now: start + COUNT_REFRESH_WINDOW,
    });
    selector.handle(Input::KeyUp(KeyPress::plain(hotkey.as_str())));

    if selector.phase() == Phase::ConfirmPending {
        selector.handle(match gesture.confirm {
            ConfirmChoice::Open => Input::ConfirmClicked,
            ConfirmChoice::Cancel => Input::CancelClicked,
        });
    }

    let outcomes = selector.settle().await;
    watcher.abort();

    Ok(SimulationReport {
        page_ops: selector.page().ops().to_vec(),
        host_ops: host.ops(),
        outcomes,
        allowlist: coordinator.allowlist().as_slice().to_vec(),
    })
}
