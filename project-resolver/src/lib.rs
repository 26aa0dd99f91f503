//! Project Resolver - versioned name resolution for project workspaces
//!
//! Finds, for each contract name bound in a project, the deployed instance
//! of the most recent contract version that has one:
//!
//! - **Bindings**: project name keys resolve to the heads of version chains
//! - **History walking**: chains are stepped back one generation at a time,
//!   batched across every name, each name stopping at its first match
//! - **Network ancestry**: optionally only deployments on ancestors of a
//!   target network count
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │             ProjectResolver              │
//! └───────┬──────────────┬───────────────────┘
//!         ▼              ▼
//! ┌──────────────┐ ┌──────────────┐ ┌──────────────────────┐
//! │   bindings   │ │   history    │◄┤       matcher        │
//! │ (name heads) │ │ (generations)│ │ (instances, network) │
//! └──────┬───────┘ └──────┬───────┘ └──────┬────────┬──────┘
//!        ▼                ▼                ▼        ▼
//! ┌──────────────────────────────────────────┐ ┌───────────────────────┐
//! │          RecordStore (record-store)      │ │ AncestorChainResolver │
//! └──────────────────────────────────────────┘ └───────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use project_resolver::{NameFilter, NetworkFilter, ProjectResolver};
//!
//! let resolver = ProjectResolver::with_genealogy(store);
//! let instances = resolver
//!     .resolve_versioned_instances(
//!         &project.id_ref(),
//!         &NameFilter::named("Token"),
//!         Some(&NetworkFilter::named("mainnet")),
//!     )
//!     .await?;
//! ```

pub mod ancestry;
pub mod bindings;
pub mod config;
pub mod error;
pub mod history;
pub mod matcher;
pub mod service;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use ancestry::{AncestorChainResolver, AncestryQuery, GenealogyResolver, StaticAncestry};
pub use bindings::{resolve_name_records, NameFilter};
pub use config::ResolverConfig;
pub use error::{AncestryError, ResolveError};
pub use history::{Generation, HistoryWalker, SlotState};
pub use matcher::{earliest_network, InstanceMatcher, NetworkFilter};
pub use service::ProjectResolver;
