//! Record Store - document storage for project workspaces
//!
//! Holds the entities a project workspace is made of and answers the two
//! query shapes name resolution needs:
//!
//! - **Selector queries**: equality and `$in` predicates over dotted field paths
//! - **Positional id lookups**: a list of ids with gaps in, the same gaps out
//!
//! ## Collections
//!
//! | Collection | Entity |
//! |------------|--------|
//! | `projects` | [`Project`] |
//! | `projectNames` | [`ProjectName`] - current binding of a name key |
//! | `nameRecords` | [`NameRecord`] - immutable version chain node |
//! | `contracts` | [`Contract`] |
//! | `contractInstances` | [`ContractInstance`] |
//! | `networks` | [`Network`] |
//! | `networkGenealogies` | [`NetworkGenealogy`] |
//!
//! ## Backends
//!
//! - [`MemoryStore`] - in-memory, counts round trips (tests, fixtures)
//! - [`SledStore`] - persistent, MessagePack documents in sled trees
//!
//! ## Features
//!
//! - `typescript` - derive `ts_rs::TS` for entity types

pub mod error;
pub mod memory;
pub mod selector;
pub mod sled_store;
pub mod store;
pub mod types;

// Re-exports
pub use error::StoreError;
pub use memory::MemoryStore;
pub use selector::{Predicate, Selector};
pub use sled_store::{SledStore, SledStoreConfig};
pub use store::{find, find_by_ids, RecordStore};
pub use types::*;
