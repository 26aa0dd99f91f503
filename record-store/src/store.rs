//! The record store abstraction.
//!
//! This module defines the `RecordStore` trait: the two query shapes the
//! resolver needs from a document store, plus typed helpers that decode
//! documents into entities.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::selector::Selector;
use crate::types::{Collection, Record};

/// Read access to a document store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find documents matching a selector, in store order.
    async fn find(&self, collection: Collection, selector: &Selector) -> Result<Vec<Value>, StoreError>;

    /// Look up documents by a positional list of ids.
    ///
    /// The result has the same length as `ids`. An absent input entry, or an
    /// id with no document, yields `None` at the same position.
    async fn find_by_ids(
        &self,
        collection: Collection,
        ids: &[Option<String>],
    ) -> Result<Vec<Option<Value>>, StoreError>;
}

/// Find typed records matching a selector.
pub async fn find<T, S>(store: &S, selector: &Selector) -> Result<Vec<T>, StoreError>
where
    T: Record,
    S: RecordStore + ?Sized,
{
    store
        .find(T::COLLECTION, selector)
        .await?
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
        .collect()
}

/// Look up typed records by a positional list of ids.
pub async fn find_by_ids<T, S>(store: &S, ids: &[Option<String>]) -> Result<Vec<Option<T>>, StoreError>
where
    T: Record,
    S: RecordStore + ?Sized,
{
    store
        .find_by_ids(T::COLLECTION, ids)
        .await?
        .into_iter()
        .map(|doc| match doc {
            Some(doc) => serde_json::from_value(doc).map(Some).map_err(StoreError::from),
            None => Ok(None),
        })
        .collect()
}
