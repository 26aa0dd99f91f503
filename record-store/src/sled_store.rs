//! Sled-backed record store
//!
//! Each collection gets two trees:
//! - `{collection}` maps a big-endian sequence number to the MessagePack
//!   encoded document, so scans return documents in insertion order
//! - `{collection}:ids` maps a document id to its sequence key

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::selector::Selector;
use crate::store::RecordStore;
use crate::types::{Collection, Record};

/// Configuration for the sled store
#[derive(Debug, Clone)]
pub struct SledStoreConfig {
    /// Path to sled database
    pub db_path: PathBuf,
    /// Cache size in bytes
    pub cache_size: u64,
}

impl Default for SledStoreConfig {
    fn default() -> Self {
        Self {
            db_path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("record-store")
                .join("records.sled"),
            cache_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// Record store backed by sled
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open or create a store
    pub async fn new(config: SledStoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let db = sled::Config::new()
            .path(&config.db_path)
            .cache_capacity(config.cache_size)
            .open()?;

        info!(path = %config.db_path.display(), "SledStore initialized");

        Ok(Self { db })
    }

    /// Open a store at a specific path
    pub async fn at_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::new(SledStoreConfig {
            db_path: path.as_ref().to_path_buf(),
            ..Default::default()
        })
        .await
    }

    fn docs(&self, collection: Collection) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(collection.as_str())?)
    }

    fn ids(&self, collection: Collection) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(format!("{}:ids", collection.as_str()))?)
    }

    /// Insert a record, keeping its original position if the id exists
    pub async fn put<T: Record>(&self, record: &T) -> Result<(), StoreError> {
        let doc = serde_json::to_value(record)?;
        let bytes = rmp_serde::to_vec(&doc).map_err(|e| StoreError::Codec(e.to_string()))?;

        let docs = self.docs(T::COLLECTION)?;
        let ids = self.ids(T::COLLECTION)?;

        let seq_key = match ids.get(record.id().as_bytes())? {
            Some(existing) => existing.to_vec(),
            None => {
                let seq = self.db.generate_id()?.to_be_bytes().to_vec();
                ids.insert(record.id().as_bytes(), seq.as_slice())?;
                seq
            }
        };
        docs.insert(seq_key, bytes)?;

        debug!(collection = %T::COLLECTION, id = %record.id(), "Record stored");
        Ok(())
    }

    /// Insert several records of one type
    pub async fn put_all<T: Record>(&self, records: &[T]) -> Result<(), StoreError> {
        for record in records {
            self.put(record).await?;
        }
        Ok(())
    }

    /// Flush changes to disk
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.db.flush_async().await?;
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Result<Value, StoreError> {
        rmp_serde::from_slice(bytes).map_err(|e| StoreError::Codec(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for SledStore {
    async fn find(&self, collection: Collection, selector: &Selector) -> Result<Vec<Value>, StoreError> {
        selector.validate()?;

        let mut matches = Vec::new();
        for item in self.docs(collection)?.iter() {
            let (_, bytes) = item?;
            let doc = Self::decode(&bytes)?;
            if selector.matches(&doc) {
                matches.push(doc);
            }
        }

        debug!(collection = %collection, matches = matches.len(), "find");
        Ok(matches)
    }

    async fn find_by_ids(
        &self,
        collection: Collection,
        ids: &[Option<String>],
    ) -> Result<Vec<Option<Value>>, StoreError> {
        let docs = self.docs(collection)?;
        let index = self.ids(collection)?;

        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            let doc = match id {
                Some(id) => match index.get(id.as_bytes())? {
                    Some(seq_key) => match docs.get(seq_key)? {
                        Some(bytes) => Some(Self::decode(&bytes)?),
                        None => None,
                    },
                    None => None,
                },
                None => None,
            };
            found.push(doc);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store;
    use crate::types::{IdRef, Network, NameRecord};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sled_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::at_path(temp_dir.path().join("test.sled"))
            .await
            .unwrap();

        let network = Network::new("mainnet", 1, 1_000, "0xabc");
        store.put(&network).await.unwrap();

        let found: Vec<Network> = store::find(&store, &Selector::new().eq("name", "mainnet"))
            .await
            .unwrap();
        assert_eq!(found, vec![network.clone()]);

        let by_height: Vec<Network> =
            store::find(&store, &Selector::new().eq("historicBlock.height", 1_000u64))
                .await
                .unwrap();
        assert_eq!(by_height.len(), 1);
    }

    #[tokio::test]
    async fn test_sled_store_order_and_positions() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::at_path(temp_dir.path().join("test.sled"))
            .await
            .unwrap();

        let origin = NameRecord::new(IdRef::new("c1"), None);
        let head = NameRecord::new(IdRef::new("c2"), Some(origin.id_ref()));
        store.put_all(&[head.clone(), origin.clone()]).await.unwrap();

        // Re-inserting keeps the original position
        store.put(&head).await.unwrap();

        let all: Vec<NameRecord> = store::find(&store, &Selector::new()).await.unwrap();
        assert_eq!(all, vec![head.clone(), origin.clone()]);

        let ids = vec![Some(origin.id.clone()), None, Some("nope".to_string())];
        let found: Vec<Option<NameRecord>> = store::find_by_ids(&store, &ids).await.unwrap();
        assert_eq!(found, vec![Some(origin), None, None]);
    }

    #[tokio::test]
    async fn test_flush_keeps_records_readable() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::at_path(temp_dir.path().join("test.sled"))
            .await
            .unwrap();

        let record = NameRecord::new(IdRef::new("c1"), None);
        store.put(&record).await.unwrap();
        store.flush().await.unwrap();

        let found: Vec<Option<NameRecord>> = store::find_by_ids(&store, &[Some(record.id.clone())])
            .await
            .unwrap();
        assert_eq!(found, vec![Some(record)]);
    }
}
