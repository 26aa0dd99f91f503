//! Contract instance matching for one generation of version history.
//!
//! For each generation the matcher:
//! 1. finds instances of any contract the generation names
//! 2. optionally keeps only instances deployed on an ancestor of a target
//!    network, bounded below by the earliest candidate network
//! 3. pairs every slot with the surviving instance of its contract

use record_store::{self as store, ContractInstance, IdRef, Network, RecordStore, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::ancestry::{AncestorChainResolver, AncestryQuery};
use crate::error::ResolveError;
use crate::history::Generation;

/// Restrict matches to ancestors of the named network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFilter {
    pub name: String,
}

impl NetworkFilter {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Network with the lowest block height. Ties keep the first seen.
pub fn earliest_network(networks: &[Network]) -> Option<&Network> {
    networks.iter().min_by_key(|network| network.height())
}

/// Matches contract instances against generations for one project.
pub struct InstanceMatcher<'a, S: ?Sized, A: ?Sized> {
    store: &'a S,
    ancestry: &'a A,
    project: &'a IdRef,
    network: Option<&'a NetworkFilter>,
}

impl<'a, S, A> InstanceMatcher<'a, S, A>
where
    S: RecordStore + ?Sized,
    A: AncestorChainResolver + ?Sized,
{
    pub fn new(store: &'a S, ancestry: &'a A, project: &'a IdRef) -> Self {
        Self {
            store,
            ancestry,
            project,
            network: None,
        }
    }

    pub fn with_network(mut self, network: Option<&'a NetworkFilter>) -> Self {
        self.network = network;
        self
    }

    /// Slots of `generation` that have a valid instance, paired with it.
    ///
    /// When several surviving instances share a contract, the last one in
    /// store order is used.
    pub async fn match_generation(
        &self,
        generation: &Generation,
    ) -> Result<Vec<(usize, ContractInstance)>, ResolveError> {
        let contract_ids = generation.resource_ids();
        if contract_ids.is_empty() {
            return Ok(Vec::new());
        }

        let selector = Selector::new().any_of("contract.id", contract_ids);
        let candidates: Vec<ContractInstance> = store::find(self.store, &selector).await?;
        debug!(depth = generation.depth, candidates = candidates.len(), "Found contract instances");

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let survivors = match self.network {
            Some(filter) => self.filter_by_ancestry(filter, candidates).await?,
            None => candidates,
        };

        let mut by_contract: HashMap<&str, &ContractInstance> = HashMap::new();
        for instance in &survivors {
            by_contract.insert(instance.contract.id.as_str(), instance);
        }

        Ok(generation
            .active()
            .filter_map(|(index, resource)| {
                by_contract
                    .get(resource.id.as_str())
                    .map(|instance| (index, (*instance).clone()))
            })
            .collect())
    }

    /// Keep candidates deployed on an ancestor of the filter's network.
    ///
    /// The ancestor window starts at the lowest block height among the
    /// candidates' own networks.
    pub async fn filter_by_ancestry(
        &self,
        filter: &NetworkFilter,
        candidates: Vec<ContractInstance>,
    ) -> Result<Vec<ContractInstance>, ResolveError> {
        let mut seen = HashSet::new();
        let network_ids: Vec<Option<String>> = candidates
            .iter()
            .filter(|instance| seen.insert(instance.network.id.as_str()))
            .map(|instance| Some(instance.network.id.clone()))
            .collect();

        let networks: Vec<Network> = store::find_by_ids(self.store, &network_ids)
            .await?
            .into_iter()
            .flatten()
            .collect();

        let Some(earliest) = earliest_network(&networks) else {
            debug!(network = %filter.name, "No candidate networks on record");
            return Ok(Vec::new());
        };
        debug!(earliest = %earliest.id, height = earliest.height(), "Earliest candidate network");

        let query = AncestryQuery {
            project: self.project.clone(),
            network: filter.name.clone(),
            include_self: true,
            minimum_height: earliest.height(),
        };
        let ancestors = self.ancestry.ancestors(&query).await?;
        debug!(ancestors = ancestors.len(), "Ancestor window");

        Ok(candidates
            .into_iter()
            .filter(|instance| ancestors.contains(&instance.network.id))
            .collect())
    }
}
