use crate::error::StoreError;
use crate::store::{ALLOWED_ORIGINS_KEY, SyncStore};
use serde_json::{Map, Value};
use std::sync::Mutex;
use url::Url;

/// Serialized origin (`scheme://host[:port]`) of `raw`, if it has one.
///
/// Accepts either a bare origin or any URL on that origin. Opaque origins
/// (`data:`, `about:blank`, `file:`) have no stable identity and yield `None`.
pub fn origin_of(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// Ordered, duplicate-free list of origins the user granted access to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginAllowlist {
    origins: Vec<String>,
}

impl OriginAllowlist {
    /// Build from stored entries, dropping malformed and repeated values.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for entry in entries {
            if let Some(origin) = origin_of(entry.as_ref()) {
                list.insert(origin);
            }
        }
        list
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.iter().any(|known| known == origin)
    }

    /// Append `origin` unless present. Returns whether the list grew.
    pub fn insert(&mut self, origin: String) -> bool {
        if self.contains(&origin) {
            return false;
        }
        self.origins.push(origin);
        true
    }

    pub fn as_slice(&self) -> &[String] {
        &self.origins
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

/// Coordinator-owned view of the allowlist, mirrored into the shared store.
#[derive(Debug, Default)]
pub struct AllowlistRegistry {
    current: Mutex<OriginAllowlist>,
    /// Held across persist so concurrent appends never overwrite each other.
    write_gate: tokio::sync::Mutex<()>,
}

impl AllowlistRegistry {
    pub fn snapshot(&self) -> OriginAllowlist {
        self.current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(origin)
    }

    /// Replace the in-memory list with whatever the store holds.
    pub async fn reload(&self, store: &dyn SyncStore) -> Result<OriginAllowlist, StoreError> {
        let list = match store.get(ALLOWED_ORIGINS_KEY).await? {
            Some(Value::Array(items)) => {
                OriginAllowlist::from_entries(items.iter().filter_map(Value::as_str))
            }
            Some(other) => {
                tracing::warn!(value = %other, "ignoring malformed allowlist entry");
                OriginAllowlist::default()
            }
            None => OriginAllowlist::default(),
        };

        *self
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = list.clone();
        Ok(list)
    }

    /// Append and persist `origin`. Membership is checked again here, after any
    /// await the caller went through, so a racing registration cannot add a
    /// second copy. Returns `Ok(false)` when the origin was already present.
    pub async fn append(&self, store: &dyn SyncStore, origin: &str) -> Result<bool, StoreError> {
        let _gate = self.write_gate.lock().await;

        let mut next = self.snapshot();
        if !next.insert(origin.to_string()) {
            return Ok(false);
        }

        let mut entries = Map::new();
        entries.insert(
            ALLOWED_ORIGINS_KEY.to_string(),
            Value::from(next.as_slice().to_vec()),
        );
        store.set(entries).await?;

        *self
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = next;
        tracing::info!(%origin, "origin added to allowlist");
        Ok(true)
    }
}
