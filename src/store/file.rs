use super::{StoreChange, StoreFuture, SyncStore, announce, change_channel, merge_entries};
use crate::error::StoreError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Store persisted as a flat TOML table, one top-level key per entry.
#[derive(Debug)]
pub struct TomlFileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
    /// Serializes persist calls so an older snapshot never lands after a newer one.
    write_gate: tokio::sync::Mutex<()>,
    changes: broadcast::Sender<StoreChange>,
}

impl TomlFileStore {
    /// Open the store at `path`. A missing file is an empty store; a malformed
    /// one is logged and treated as empty rather than failing startup.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => toml::from_str::<Map<String, Value>>(&content).unwrap_or_else(|error| {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "failed to parse store; starting empty"
                );
                Map::new()
            }),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(error) => {
                return Err(StoreError::Read {
                    path: path.display().to_string(),
                    message: error.to_string(),
                });
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            write_gate: tokio::sync::Mutex::new(()),
            changes: change_channel(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, snapshot: &Map<String, Value>) -> Result<(), StoreError> {
        let write_error = |message: String| StoreError::Write {
            path: self.path.display().to_string(),
            message,
        };

        let contents = toml::to_string_pretty(snapshot).map_err(|e| write_error(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| write_error(e.to_string()))?;
        }
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| write_error(e.to_string()))
    }
}

impl SyncStore for TomlFileStore {
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
        Box::pin(async move {
            Ok(self
                .entries
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone())
        })
    }

    fn set(&self, entries: Map<String, Value>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let _gate = self.write_gate.lock().await;

            let mut next = self
                .entries
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone();
            let changed = merge_entries(&mut next, entries);
            if changed.is_empty() {
                return Ok(());
            }

            self.persist(&next).await?;
            *self
                .entries
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner) = next;

            tracing::debug!(path = %self.path.display(), keys = ?changed, "store updated");
            announce(&self.changes, changed);
            Ok(())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
