use std::sync::Arc;
use std::time::Duration;

use linksweep::BrowserEvent;
use linksweep::coordinator::{AutoDenyPrompt, AutoGrantPrompt, BadgeState, PULSE_DWELL};
use linksweep::store::{ALLOWED_ORIGINS_KEY, MemoryStore, SyncStore};
use serde_json::{Map, json};

use super::sweep_harness::{PAGE_ORIGIN, Rig, eventually};

#[tokio::test(start_paused = true)]
async fn action_click_pulses_then_settles_on_allowed() {
    let rig = Rig::start(Arc::new(MemoryStore::new()), Arc::new(AutoGrantPrompt)).await;
    assert_eq!(rig.host.badge(rig.tab), Some(BadgeState::Cleared));

    rig.coordinator
        .on_event(BrowserEvent::ActionClicked { tab: rig.tab })
        .await;

    assert!(rig.host.injected(rig.tab));
    assert_eq!(rig.host.badge(rig.tab), Some(BadgeState::Executed));

    tokio::time::sleep(PULSE_DWELL - Duration::from_millis(1)).await;
    assert_eq!(rig.host.badge(rig.tab), Some(BadgeState::Executed));

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(rig.host.badge(rig.tab), Some(BadgeState::Allowed));
}

#[tokio::test(start_paused = true)]
async fn refused_action_click_shows_no_pulse() {
    let prompt = Arc::new(AutoDenyPrompt {
        reason: "not now".into(),
    });
    let rig = Rig::start(Arc::new(MemoryStore::new()), prompt).await;

    rig.coordinator
        .on_event(BrowserEvent::ActionClicked { tab: rig.tab })
        .await;
    tokio::time::sleep(PULSE_DWELL * 2).await;

    assert!(!rig.host.injected(rig.tab));
    assert_eq!(rig.host.badge(rig.tab), Some(BadgeState::Cleared));
}

#[tokio::test]
async fn allowlist_written_elsewhere_updates_active_badges() {
    let store: Arc<dyn SyncStore> = Arc::new(MemoryStore::new());
    let prompt = Arc::new(AutoDenyPrompt {
        reason: "unused".into(),
    });
    let rig = Rig::start(Arc::clone(&store), prompt).await;
    let watcher = rig.coordinator.watch_store();

    let mut entries = Map::new();
    entries.insert(ALLOWED_ORIGINS_KEY.into(), json!([PAGE_ORIGIN]));
    store.set(entries).await.unwrap();

    assert!(eventually(|| rig.host.badge(rig.tab) == Some(BadgeState::Allowed)).await);
    assert!(rig.coordinator.allowlist().contains(PAGE_ORIGIN));
    watcher.abort();
}
