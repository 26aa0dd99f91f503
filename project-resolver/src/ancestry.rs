//! Network ancestry resolution.
//!
//! Deployments only count for a target network when they sit on one of its
//! causal ancestors. This module defines the `AncestorChainResolver` seam
//! and two implementations:
//!
//! - [`GenealogyResolver`] walks `networkGenealogies` records in a store
//! - [`StaticAncestry`] answers from a fixed set (tests, offline use)

use async_trait::async_trait;
use record_store::{self as store, IdRef, Network, NetworkGenealogy, RecordStore, Selector};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::bindings::{resolve_name_records, NameFilter};
use crate::error::AncestryError;

/// Which ancestors to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestryQuery {
    /// Project the network name is bound in
    pub project: IdRef,
    /// Name of the target network
    pub network: String,
    /// Whether the target itself belongs to the result
    pub include_self: bool,
    /// Ancestors below this block height are left out
    pub minimum_height: u64,
}

/// Answers "which networks are ancestors of N at or above height H".
#[async_trait]
pub trait AncestorChainResolver: Send + Sync {
    /// Ids of the matching networks.
    async fn ancestors(&self, query: &AncestryQuery) -> Result<HashSet<String>, AncestryError>;
}

/// Resolves ancestry from genealogy records in a record store.
///
/// The network name is looked up through the project's bindings of the
/// network type; the head of that binding's chain is the target. Ancestors
/// are then collected breadth-first, one selector query and one positional
/// lookup per level.
pub struct GenealogyResolver {
    store: Arc<dyn RecordStore>,
    network_type: String,
}

impl GenealogyResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            network_type: "Network".to_string(),
        }
    }

    /// Binding type network names are registered under.
    pub fn with_network_type(mut self, network_type: impl Into<String>) -> Self {
        self.network_type = network_type.into();
        self
    }

    /// Current network bound to `name` in `project`.
    pub async fn resolve_network(&self, project: &IdRef, name: &str) -> Result<Network, AncestryError> {
        let filter = NameFilter::named(name).with_kind(self.network_type.as_str());
        let heads = resolve_name_records(self.store.as_ref(), project, &filter).await?;

        let Some(head) = heads.into_iter().flatten().next() else {
            return Err(AncestryError::UnknownNetwork(name.to_string()));
        };

        let networks: Vec<Option<Network>> =
            store::find_by_ids(self.store.as_ref(), &[Some(head.resource.id.clone())]).await?;

        networks
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| AncestryError::UnknownNetwork(name.to_string()))
    }
}

#[async_trait]
impl AncestorChainResolver for GenealogyResolver {
    async fn ancestors(&self, query: &AncestryQuery) -> Result<HashSet<String>, AncestryError> {
        let target = self.resolve_network(&query.project, &query.network).await?;

        let mut ancestors = HashSet::new();
        if query.include_self && target.height() >= query.minimum_height {
            ancestors.insert(target.id.clone());
        }

        let mut visited = HashSet::from([target.id.clone()]);
        let mut frontier = vec![target.id.clone()];

        while !frontier.is_empty() {
            let selector = Selector::new().any_of("descendant.id", frontier.clone());
            let edges: Vec<NetworkGenealogy> = store::find(self.store.as_ref(), &selector).await?;

            let parent_ids: Vec<Option<String>> = edges
                .into_iter()
                .map(|edge| edge.ancestor.id)
                .filter(|id| visited.insert(id.clone()))
                .map(Some)
                .collect();
            if parent_ids.is_empty() {
                break;
            }

            let parents: Vec<Option<Network>> = store::find_by_ids(self.store.as_ref(), &parent_ids).await?;

            // Heights only decrease going back, so a parent below the bound
            // ends its branch.
            frontier = parents
                .into_iter()
                .flatten()
                .filter(|parent| parent.height() >= query.minimum_height)
                .map(|parent| {
                    ancestors.insert(parent.id.clone());
                    parent.id
                })
                .collect();
        }

        debug!(
            network = %query.network,
            minimum_height = query.minimum_height,
            ancestors = ancestors.len(),
            "Resolved network ancestry"
        );
        Ok(ancestors)
    }
}

/// Ancestry resolver with a fixed answer.
///
/// Records every query it receives.
pub struct StaticAncestry {
    ancestors: HashSet<String>,
    failure: Option<String>,
    queries: Mutex<Vec<AncestryQuery>>,
}

impl StaticAncestry {
    pub fn new<I, S>(ancestors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ancestors: ancestors.into_iter().map(Into::into).collect(),
            failure: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Fail every query with this message.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<AncestryQuery> {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl AncestorChainResolver for StaticAncestry {
    async fn ancestors(&self, query: &AncestryQuery) -> Result<HashSet<String>, AncestryError> {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(query.clone());

        match &self.failure {
            Some(message) => Err(AncestryError::Failed(message.clone())),
            None => Ok(self.ancestors.clone()),
        }
    }
}
