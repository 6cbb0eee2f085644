use std::sync::Arc;

use linksweep::coordinator::{AutoDenyPrompt, AutoGrantPrompt, BadgeState, HostOp};
use linksweep::geometry::Point;
use linksweep::messaging::{OpenLinksOutcome, RegisterReason};
use linksweep::selector::{Input, KeyPress, PageOp};
use linksweep::store::{ALLOWED_ORIGINS_KEY, MemoryStore, SyncStore};
use serde_json::{Value, json};

use super::sweep_harness::{PAGE_ORIGIN, Rig, drag, drag_all, story};

fn tabs_created(ops: &[HostOp]) -> Vec<(String, bool)> {
    ops.iter()
        .filter_map(|op| match op {
            HostOp::TabCreated { url, active, .. } => Some((url.clone(), *active)),
            _ => None,
        })
        .collect()
}

async fn store_with(entries: Value) -> Arc<dyn SyncStore> {
    let store = MemoryStore::new();
    let Value::Object(map) = entries else {
        panic!("entries must be an object");
    };
    store.set(map).await.expect("memory store accepts writes");
    Arc::new(store)
}

#[tokio::test]
async fn default_sweep_opens_three_tabs_first_active() {
    let rig = Rig::start(Arc::new(MemoryStore::new()), Arc::new(AutoGrantPrompt)).await;
    let mut selector = rig.selector().await;

    drag_all(&mut selector);
    let outcomes = selector.settle().await;

    assert_eq!(outcomes, vec![OpenLinksOutcome { success: true, count: 3 }]);
    assert_eq!(
        tabs_created(&rig.host.ops()),
        vec![(story(1), true), (story(2), false), (story(3), false)]
    );
    assert_eq!(rig.coordinator.allowlist().as_slice(), [PAGE_ORIGIN]);
    assert!(!selector.page().overlay_mounted());
}

#[tokio::test]
async fn tab_cap_truncates_in_order() {
    let store = store_with(json!({ "maxTabs": 2 })).await;
    let rig = Rig::start(store, Arc::new(AutoGrantPrompt)).await;
    let mut selector = rig.selector().await;

    drag_all(&mut selector);
    let outcomes = selector.settle().await;

    assert_eq!(outcomes, vec![OpenLinksOutcome { success: true, count: 2 }]);
    assert_eq!(
        tabs_created(&rig.host.ops()),
        vec![(story(1), true), (story(2), false)]
    );
}

#[tokio::test]
async fn background_mode_focuses_nothing() {
    let store = store_with(json!({ "openMode": "background-tab" })).await;
    let rig = Rig::start(store, Arc::new(AutoGrantPrompt)).await;
    let mut selector = rig.selector().await;

    drag_all(&mut selector);
    selector.settle().await;

    let created = tabs_created(&rig.host.ops());
    assert_eq!(created.len(), 3);
    assert!(created.iter().all(|(_, active)| !active));
}

#[tokio::test]
async fn window_mode_opens_one_window_with_the_rest_inside() {
    let store = store_with(json!({ "openMode": "new-window" })).await;
    let rig = Rig::start(store, Arc::new(AutoGrantPrompt)).await;
    let mut selector = rig.selector().await;

    drag_all(&mut selector);
    selector.settle().await;

    let ops = rig.host.ops();
    let windows: Vec<_> = ops
        .iter()
        .filter_map(|op| match op {
            HostOp::WindowCreated { window_id, url, .. } => Some((*window_id, url.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(windows.len(), 1);
    let (window, first_url) = windows[0].clone();
    assert_eq!(first_url, story(1));

    let in_window: Vec<_> = ops
        .iter()
        .filter_map(|op| match op {
            HostOp::TabCreated {
                window_id,
                url,
                active,
                ..
            } => Some((*window_id, url.clone(), *active)),
            _ => None,
        })
        .collect();
    assert_eq!(
        in_window,
        vec![
            (Some(window), story(2), false),
            (Some(window), story(3), false)
        ]
    );
}

#[tokio::test]
async fn denial_leaves_allowlist_and_badge_untouched() {
    let store: Arc<dyn SyncStore> = Arc::new(MemoryStore::new());
    let prompt = Arc::new(AutoDenyPrompt {
        reason: "user closed the dialog".into(),
    });
    let rig = Rig::start(Arc::clone(&store), prompt).await;
    let mut selector = rig.selector().await;

    let outcome = rig
        .client
        .register_origin(PAGE_ORIGIN)
        .await
        .expect("coordinator reachable");
    assert_eq!(outcome.reason, Some(RegisterReason::UserDenied));

    drag(&mut selector, Point::new(0.0, 0.0), Point::new(5.0, 5.0));
    selector.settle().await;

    assert!(rig.coordinator.allowlist().is_empty());
    assert_eq!(store.get(ALLOWED_ORIGINS_KEY).await.unwrap(), None);
    assert_eq!(rig.host.badge(rig.tab), Some(BadgeState::Cleared));

    let notices = selector.page().notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].text.contains("toolbar icon"));
}

#[tokio::test]
async fn sweep_over_nothing_sends_no_dispatch() {
    let rig = Rig::start(Arc::new(MemoryStore::new()), Arc::new(AutoGrantPrompt)).await;
    let mut selector = rig.selector().await;

    drag(&mut selector, Point::new(400.0, 400.0), Point::new(500.0, 500.0));
    let outcomes = selector.settle().await;

    assert!(outcomes.is_empty());
    assert!(tabs_created(&rig.host.ops()).is_empty());
    assert!(
        selector
            .page()
            .ops()
            .iter()
            .any(|op| matches!(op, PageOp::CountHidden))
    );
}

#[tokio::test]
async fn confirm_cancel_keeps_browser_quiet() {
    let store = store_with(json!({ "showConfirmDialog": true, "openMode": "new-tab" })).await;
    let rig = Rig::start(store, Arc::new(AutoGrantPrompt)).await;
    let mut selector = rig.selector().await;

    drag_all(&mut selector);
    selector.handle(Input::KeyDown(KeyPress::plain("Escape")));
    let outcomes = selector.settle().await;

    assert!(outcomes.is_empty());
    assert!(tabs_created(&rig.host.ops()).is_empty());
    let confirm = selector
        .page()
        .ops()
        .iter()
        .find_map(|op| match op {
            PageOp::ConfirmOpened(prompt) => Some(prompt.message.clone()),
            _ => None,
        })
        .expect("confirm dialog should have opened");
    assert_eq!(confirm, "Open 3 links in new tabs?");
}
