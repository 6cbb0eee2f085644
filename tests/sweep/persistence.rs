use std::sync::Arc;

use linksweep::config::open_store;
use linksweep::coordinator::{AutoDenyPrompt, AutoGrantPrompt};
use linksweep::store::{ALLOWED_ORIGINS_KEY, SyncStore, TomlFileStore};
use serde_json::json;
use tempfile::TempDir;

use super::sweep_harness::{PAGE_ORIGIN, Rig, drag_all};

#[tokio::test]
async fn granted_origin_survives_restart() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.toml");

    {
        let store: Arc<dyn SyncStore> = Arc::new(open_store(Some(&path)).await.unwrap());
        let rig = Rig::start(store, Arc::new(AutoGrantPrompt)).await;
        let mut selector = rig.selector().await;
        drag_all(&mut selector);
        selector.settle().await;
    }

    let reopened = tokio_test::assert_ok!(TomlFileStore::open(&path).await);
    assert_eq!(
        reopened.get(ALLOWED_ORIGINS_KEY).await.unwrap(),
        Some(json!([PAGE_ORIGIN]))
    );

    // A restarted coordinator knows the origin and never prompts for it.
    let prompt = Arc::new(AutoDenyPrompt {
        reason: "should not be asked".into(),
    });
    let rig = Rig::start(Arc::new(reopened), prompt).await;
    let outcome = rig.coordinator.register_origin(PAGE_ORIGIN).await;
    assert!(outcome.success);
    assert_eq!(outcome.origins, Some(vec![PAGE_ORIGIN.to_string()]));
}

#[tokio::test]
async fn second_origin_appends_in_order() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("store.toml");
    let store: Arc<dyn SyncStore> = Arc::new(open_store(Some(&path)).await.unwrap());
    let rig = Rig::start(Arc::clone(&store), Arc::new(AutoGrantPrompt)).await;

    assert!(rig.coordinator.register_origin(PAGE_ORIGIN).await.success);
    assert!(
        rig.coordinator
            .register_origin("https://docs.example/guide?x=1")
            .await
            .success
    );

    let reopened = TomlFileStore::open(&path).await.unwrap();
    assert_eq!(
        reopened.get(ALLOWED_ORIGINS_KEY).await.unwrap(),
        Some(json!([PAGE_ORIGIN, "https://docs.example"]))
    );
}
