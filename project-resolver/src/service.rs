//! ProjectResolver - main entry point for versioned name resolution.

use record_store::{ContractInstance, IdRef, NameRecord, RecordStore};
use std::sync::Arc;
use tracing::{debug, info};

use crate::ancestry::{AncestorChainResolver, GenealogyResolver};
use crate::bindings::{resolve_name_records, NameFilter};
use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::history::HistoryWalker;
use crate::matcher::{InstanceMatcher, NetworkFilter};

/// Resolves project names against a record store.
///
/// Read-only; every call owns its walk state, so one resolver can serve
/// concurrent calls.
pub struct ProjectResolver {
    store: Arc<dyn RecordStore>,
    ancestry: Arc<dyn AncestorChainResolver>,
    config: ResolverConfig,
}

impl ProjectResolver {
    /// Create a resolver with an explicit ancestry collaborator.
    pub fn new(store: Arc<dyn RecordStore>, ancestry: Arc<dyn AncestorChainResolver>) -> Self {
        Self {
            store,
            ancestry,
            config: ResolverConfig::default(),
        }
    }

    /// Create a resolver that reads network ancestry from the same store.
    pub fn with_genealogy(store: Arc<dyn RecordStore>) -> Self {
        let ancestry = Arc::new(GenealogyResolver::new(store.clone()));
        Self::new(store, ancestry)
    }

    /// Create with configuration.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Head name records bound in `project` under keys matching `filter`.
    pub async fn resolve_name_records(
        &self,
        project: &IdRef,
        filter: &NameFilter,
    ) -> Result<Vec<Option<NameRecord>>, ResolveError> {
        Ok(resolve_name_records(self.store.as_ref(), project, filter).await?)
    }

    /// For every contract name matching `filter`, the instance of its most
    /// recent version that has one.
    ///
    /// With a network filter, only instances deployed on an ancestor of that
    /// network (or on it) count. Names with no qualifying instance anywhere in
    /// their history are left out. Results follow binding order.
    pub async fn resolve_versioned_instances(
        &self,
        project: &IdRef,
        filter: &NameFilter,
        network: Option<&NetworkFilter>,
    ) -> Result<Vec<ContractInstance>, ResolveError> {
        let contract_filter = NameFilter {
            name: filter.name.clone(),
            kind: Some(self.config.contract_type.clone()),
        };

        let heads = resolve_name_records(self.store.as_ref(), project, &contract_filter).await?;
        let mut found: Vec<Option<ContractInstance>> = vec![None; heads.len()];

        let mut walker = HistoryWalker::new(self.store.as_ref(), heads)
            .with_max_generations(self.config.max_generations);
        let matcher = InstanceMatcher::new(self.store.as_ref(), self.ancestry.as_ref(), project)
            .with_network(network);

        while let Some(generation) = walker.next().await? {
            let matched = matcher.match_generation(&generation).await?;
            debug!(depth = generation.depth, resolved = matched.len(), "Generation matched");

            let mut resolved = Vec::with_capacity(matched.len());
            for (index, instance) in matched {
                found[index] = Some(instance);
                resolved.push(index);
            }
            walker.mark_resolved(resolved);
        }

        let instances: Vec<ContractInstance> = found.into_iter().flatten().collect();
        info!(
            project = %project.id,
            name = ?filter.name,
            network = ?network.map(|n| n.name.as_str()),
            names = walker.len(),
            resolved = instances.len(),
            "Resolved versioned contract instances"
        );
        Ok(instances)
    }
}
