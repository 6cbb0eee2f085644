#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use linksweep::config::SettingsHandle;
use linksweep::coordinator::{Coordinator, HeadlessHost, PermissionPrompt, TabId};
use linksweep::geometry::{Point, Rect};
use linksweep::messaging::{CoordinatorClient, spawn_endpoint};
use linksweep::selector::{Anchor, Input, KeyPress, ScriptedPage, Selector};
use linksweep::store::SyncStore;
use url::Url;

pub const PAGE_URL: &str = "https://news.example/front";
pub const PAGE_ORIGIN: &str = "https://news.example";

/// A coordinator on a headless browser with one active tab showing `PAGE_URL`.
pub struct Rig {
    pub host: Arc<HeadlessHost>,
    pub store: Arc<dyn SyncStore>,
    pub coordinator: Arc<Coordinator>,
    pub client: Arc<dyn CoordinatorClient>,
    pub tab: TabId,
}

impl Rig {
    pub async fn start(store: Arc<dyn SyncStore>, prompt: Arc<dyn PermissionPrompt>) -> Self {
        let host = Arc::new(HeadlessHost::new());
        let tab = host.open_page(PAGE_URL, true);
        let coordinator = Arc::new(Coordinator::new(host.clone(), prompt, Arc::clone(&store)));
        coordinator
            .startup()
            .await
            .expect("startup should load the allowlist");
        let client: Arc<dyn CoordinatorClient> =
            Arc::new(spawn_endpoint(Arc::clone(&coordinator)));
        Self {
            host,
            store,
            coordinator,
            client,
            tab,
        }
    }

    pub async fn selector(&self) -> Selector<ScriptedPage> {
        let settings = SettingsHandle::from_store(self.store.as_ref())
            .await
            .expect("settings should load");
        Selector::new(news_page(), settings, Arc::clone(&self.client))
    }
}

/// Three stacked headlines, each 200x20, at y = 10, 40, 70.
pub fn news_page() -> ScriptedPage {
    ScriptedPage::new(
        Url::parse(PAGE_URL).expect("valid page url"),
        vec![
            Anchor::new("/story/1", Rect::new(10.0, 10.0, 200.0, 20.0)),
            Anchor::new("/story/2", Rect::new(10.0, 40.0, 200.0, 20.0)),
            Anchor::new("/story/3", Rect::new(10.0, 70.0, 200.0, 20.0)),
        ],
    )
}

pub fn story(n: usize) -> String {
    format!("https://news.example/story/{n}")
}

/// Hold the default hotkey, drag from `from` to `to`, release.
pub fn drag(selector: &mut Selector<ScriptedPage>, from: Point, to: Point) {
    let now = Instant::now();
    selector.handle(Input::KeyDown(KeyPress::plain("z")));
    selector.handle(Input::PointerMove { at: from, now });
    selector.handle(Input::PointerMove { at: to, now });
    selector.handle(Input::KeyUp(KeyPress::plain("z")));
}

/// Drag over all three headlines.
pub fn drag_all(selector: &mut Selector<ScriptedPage>) {
    drag(selector, Point::new(0.0, 0.0), Point::new(300.0, 120.0));
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
