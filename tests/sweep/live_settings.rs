use std::sync::Arc;

use linksweep::config::SettingsHandle;
use linksweep::coordinator::AutoGrantPrompt;
use linksweep::messaging::OpenLinksOutcome;
use linksweep::selector::{Input, KeyPress, Phase, Selector};
use linksweep::store::{MemoryStore, SyncStore};
use serde_json::{Map, Value, json};

use super::sweep_harness::{Rig, drag_all, eventually, news_page};

fn entries(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::test]
async fn store_changes_reach_an_open_page() {
    let store: Arc<dyn SyncStore> = Arc::new(MemoryStore::new());
    let rig = Rig::start(Arc::clone(&store), Arc::new(AutoGrantPrompt)).await;
    let settings = SettingsHandle::from_store(store.as_ref()).await.unwrap();
    let follower = settings.follow(Arc::clone(&store));
    let mut selector = Selector::new(news_page(), settings.clone(), Arc::clone(&rig.client));

    store
        .set(entries(json!({ "maxTabs": 1, "hotkey": "Q" })))
        .await
        .unwrap();
    assert!(eventually(|| settings.load().max_tabs == 1).await);

    // The old hotkey no longer starts a gesture; the new one does.
    selector.handle(Input::KeyDown(KeyPress::plain("z")));
    assert_eq!(selector.phase(), Phase::Idle);
    selector.handle(Input::KeyDown(KeyPress::plain("q")));
    assert_eq!(selector.phase(), Phase::Selecting);
    selector.handle(Input::Abort);

    store.set(entries(json!({ "hotkey": "z" }))).await.unwrap();
    assert!(eventually(|| settings.load().hotkey == 'z').await);

    drag_all(&mut selector);
    let outcomes = selector.settle().await;
    assert_eq!(outcomes, vec![OpenLinksOutcome { success: true, count: 1 }]);

    follower.abort();
}

#[tokio::test]
async fn out_of_range_tab_cap_is_clamped_on_read() {
    let store: Arc<dyn SyncStore> = Arc::new(MemoryStore::new());
    store
        .set(entries(json!({ "maxTabs": 500, "boxColor": "" })))
        .await
        .unwrap();

    let settings = SettingsHandle::from_store(store.as_ref()).await.unwrap();
    let snapshot = settings.load_full();

    assert_eq!(snapshot.max_tabs, 50);
    assert_eq!(snapshot.box_color, "#007bff");
}
