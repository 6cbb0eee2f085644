use super::{StoreChange, StoreFuture, SyncStore, announce, change_channel, merge_entries};
use serde_json::{Map, Value};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Process-local store, used by tests and the simulation harness.
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<Map<String, Value>>,
    changes: broadcast::Sender<StoreChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_entries(Map::new())
    }

    pub fn with_entries(entries: Map<String, Value>) -> Self {
        Self {
            entries: Mutex::new(entries),
            changes: change_channel(),
        }
    }

    fn snapshot(&self) -> Map<String, Value> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>> {
        Box::pin(async move {
            Ok(self
                .entries
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .get(key)
                .cloned())
        })
    }

    fn get_all(&self) -> StoreFuture<'_, Map<String, Value>> {
        Box::pin(async move { Ok(self.snapshot()) })
    }

    fn set(&self, entries: Map<String, Value>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let changed = {
                let mut current = self
                    .entries
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                merge_entries(&mut current, entries)
            };
            announce(&self.changes, changed);
            Ok(())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
