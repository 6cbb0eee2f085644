//! Shared key-value store with change notification.
//!
//! Both the page-side selector and the coordinator read settings and the
//! origin allowlist from here; writers broadcast the set of keys that changed.

pub mod file;
pub mod memory;

pub use file::TomlFileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use tokio::sync::broadcast;

/// Key under which the coordinator persists the ordered origin allowlist.
pub const ALLOWED_ORIGINS_KEY: &str = "allowedOrigins";

const CHANGE_CHANNEL_CAPACITY: usize = 64;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Notification emitted after a write, listing keys whose value actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub keys: Vec<String>,
}

impl StoreChange {
    pub fn touches(&self, keys: &[&str]) -> bool {
        self.keys.iter().any(|key| keys.contains(&key.as_str()))
    }
}

pub trait SyncStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>>;

    fn get_all(&self) -> StoreFuture<'_, Map<String, Value>>;

    /// Merge `entries` into the store. Keys whose value is unchanged are not reported.
    fn set(&self, entries: Map<String, Value>) -> StoreFuture<'_, ()>;

    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// Apply `entries` to `current`, returning the keys whose value changed.
fn merge_entries(current: &mut Map<String, Value>, entries: Map<String, Value>) -> Vec<String> {
    let mut changed = Vec::new();
    for (key, value) in entries {
        if current.get(&key) != Some(&value) {
            changed.push(key.clone());
            current.insert(key, value);
        }
    }
    changed
}

fn change_channel() -> broadcast::Sender<StoreChange> {
    broadcast::channel(CHANGE_CHANNEL_CAPACITY).0
}

fn announce(sender: &broadcast::Sender<StoreChange>, keys: Vec<String>) {
    if keys.is_empty() {
        return;
    }
    // No receivers is fine: nobody is listening yet.
    let _ = sender.send(StoreChange { keys });
}
