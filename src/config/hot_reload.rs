use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::settings::{SETTINGS_KEYS, Settings};
use crate::error::StoreError;
use crate::store::SyncStore;

/// Live-reloadable settings holder.
///
/// Wraps `Settings` in an `ArcSwap` so readers never block and writers
/// atomically swap the pointer. [`SettingsHandle::follow`] keeps the snapshot
/// in step with store change notifications, so an in-flight gesture sees new
/// values without a page reload.
pub struct SettingsHandle {
    inner: Arc<ArcSwap<Settings>>,
}

impl SettingsHandle {
    /// Create a new handle seeded with `settings`.
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    /// Create a handle seeded from the current store contents.
    pub async fn from_store(store: &dyn SyncStore) -> Result<Self, StoreError> {
        let handle = Self::new(Settings::default());
        handle.reload(store).await?;
        Ok(handle)
    }

    /// Load current settings snapshot. Lock-free.
    pub fn load(&self) -> arc_swap::Guard<Arc<Settings>> {
        self.inner.load()
    }

    /// Return a clone of the current `Arc<Settings>`.
    pub fn load_full(&self) -> Arc<Settings> {
        self.inner.load_full()
    }

    /// Re-read every settings key from the store and swap the snapshot.
    pub async fn reload(&self, store: &dyn SyncStore) -> Result<(), StoreError> {
        let entries = store.get_all().await?;
        let fresh = Settings::from_entries(&entries);
        self.inner.store(Arc::new(fresh));
        tracing::debug!("settings reloaded");
        Ok(())
    }

    /// Manually swap in new settings.
    pub fn store(&self, settings: Settings) {
        self.inner.store(Arc::new(settings.normalized()));
    }

    /// Spawn a task that reloads on every change touching a settings key.
    ///
    /// The task ends when the store's change channel closes.
    pub fn follow(&self, store: Arc<dyn SyncStore>) -> JoinHandle<()> {
        let handle = self.clone();
        let mut changes = store.subscribe();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) if change.touches(&SETTINGS_KEYS) => {
                        if let Err(error) = handle.reload(store.as_ref()).await {
                            tracing::warn!(%error, "failed to reload settings");
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "settings watcher lagged; reloading");
                        if let Err(error) = handle.reload(store.as_ref()).await {
                            tracing::warn!(%error, "failed to reload settings");
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Clone for SettingsHandle {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
