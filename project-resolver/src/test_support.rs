//! Store doubles shared by the unit tests.

use async_trait::async_trait;
use record_store::{Collection, MemoryStore, RecordStore, Selector, StoreError};
use serde_json::Value;
use std::sync::Mutex;

/// Answers positional lookups like a `$in` query: missing entries are
/// dropped instead of kept as `None`.
pub(crate) struct CompactingStore {
    pub(crate) inner: MemoryStore,
}

impl CompactingStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
        }
    }
}

#[async_trait]
impl RecordStore for CompactingStore {
    async fn find(&self, collection: Collection, selector: &Selector) -> Result<Vec<Value>, StoreError> {
        self.inner.find(collection, selector).await
    }

    async fn find_by_ids(
        &self,
        collection: Collection,
        ids: &[Option<String>],
    ) -> Result<Vec<Option<Value>>, StoreError> {
        let found = self.inner.find_by_ids(collection, ids).await?;
        Ok(found.into_iter().filter(Option::is_some).collect())
    }
}

/// Records the ids of every positional lookup it serves.
pub(crate) struct RecordingStore {
    pub(crate) inner: MemoryStore,
    lookups: Mutex<Vec<(Collection, Vec<Option<String>>)>>,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Ids requested from `collection`, one entry per lookup.
    pub(crate) fn lookups(&self, collection: Collection) -> Vec<Vec<Option<String>>> {
        self.lookups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|(c, _)| *c == collection)
            .map(|(_, ids)| ids.clone())
            .collect()
    }
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn find(&self, collection: Collection, selector: &Selector) -> Result<Vec<Value>, StoreError> {
        self.inner.find(collection, selector).await
    }

    async fn find_by_ids(
        &self,
        collection: Collection,
        ids: &[Option<String>],
    ) -> Result<Vec<Option<Value>>, StoreError> {
        self.lookups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((collection, ids.to_vec()));
        self.inner.find_by_ids(collection, ids).await
    }
}
