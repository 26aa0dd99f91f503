//! In-memory record store.
//!
//! Keeps documents per collection in insertion order. Counts round trips and
//! can be switched unavailable, which makes it the store of choice for tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::selector::Selector;
use crate::store::RecordStore;
use crate::types::{Collection, Record};

/// Document store held entirely in memory.
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
    available: AtomicBool,
    call_count: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            call_count: AtomicU32::new(0),
        }
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Toggle availability on a shared store.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of queries served (both `find` and `find_by_ids`).
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    /// Insert a record, replacing any document with the same id in place.
    pub async fn put<T: Record>(&self, record: &T) -> Result<(), StoreError> {
        let doc = serde_json::to_value(record)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(T::COLLECTION).or_default();

        match docs.iter_mut().find(|existing| doc_id(existing) == Some(record.id())) {
            Some(existing) => *existing = doc,
            None => docs.push(doc),
        }

        debug!(collection = %T::COLLECTION, id = %record.id(), "Record stored");
        Ok(())
    }

    /// Insert several records of one type.
    pub async fn put_all<T: Record>(&self, records: &[T]) -> Result<(), StoreError> {
        for record in records {
            self.put(record).await?;
        }
        Ok(())
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn begin_call(&self) -> Result<(), StoreError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store disabled".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn doc_id(doc: &Value) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find(&self, collection: Collection, selector: &Selector) -> Result<Vec<Value>, StoreError> {
        self.begin_call()?;
        selector.validate()?;

        let collections = self.collections.read().await;
        let matches: Vec<Value> = collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| selector.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        debug!(collection = %collection, matches = matches.len(), "find");
        Ok(matches)
    }

    async fn find_by_ids(
        &self,
        collection: Collection,
        ids: &[Option<String>],
    ) -> Result<Vec<Option<Value>>, StoreError> {
        self.begin_call()?;

        let collections = self.collections.read().await;
        let index: HashMap<&str, &Value> = collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter_map(|doc| doc_id(doc).map(|id| (id, doc)))
                    .collect()
            })
            .unwrap_or_default();

        Ok(ids
            .iter()
            .map(|id| {
                id.as_deref()
                    .and_then(|id| index.get(id))
                    .map(|doc| (*doc).clone())
            })
            .collect())
    }
}
