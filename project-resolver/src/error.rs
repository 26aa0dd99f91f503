//! Error types for project-resolver

use record_store::StoreError;
use thiserror::Error;

/// Failures from an ancestor-chain resolver.
#[derive(Error, Debug)]
pub enum AncestryError {
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Ancestry resolution failed: {0}")]
    Failed(String),
}

/// Failures surfaced by a resolution call. Nothing is retried and no partial
/// result accompanies an error.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Ancestry error: {0}")]
    Ancestry(#[from] AncestryError),
}
