//! Binding resolution: project name keys to the heads of their version chains.

use record_store::{self as store, IdRef, NameRecord, ProjectName, RecordStore, Selector, StoreError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Name key pattern. Absent fields match any value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl NameFilter {
    /// Match every binding in the project.
    pub fn any() -> Self {
        Self::default()
    }

    /// Match bindings with this name, of any type.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: None,
        }
    }

    /// Restrict to one binding type.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Resolve the head name records currently bound in `project` under keys
/// matching `filter`.
///
/// Takes two store round trips: one selector query over bindings, one
/// positional lookup of their records. Results follow the store's binding
/// order; repeated records are kept, and a binding whose record is missing
/// yields `None` in its position.
pub async fn resolve_name_records<S>(
    store: &S,
    project: &IdRef,
    filter: &NameFilter,
) -> Result<Vec<Option<NameRecord>>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let selector = Selector::new()
        .eq("project.id", project.id.as_str())
        .eq_opt("key.name", filter.name.as_deref())
        .eq_opt("key.type", filter.kind.as_deref());

    let bindings: Vec<ProjectName> = store::find(store, &selector).await?;
    debug!(project = %project.id, ?filter, bindings = bindings.len(), "Resolved bindings");

    if bindings.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Option<String>> = bindings
        .iter()
        .map(|binding| Some(binding.name_record.id.clone()))
        .collect();
    let records: Vec<Option<NameRecord>> = store::find_by_ids(store, &ids).await?;

    if records.len() != ids.len() {
        return Err(StoreError::Misaligned {
            expected: ids.len(),
            actual: records.len(),
        });
    }

    for (binding, record) in bindings.iter().zip(&records) {
        if record.is_none() {
            warn!(binding = %binding.id, name_record = %binding.name_record.id, "Binding points at a missing name record");
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CompactingStore;
    use record_store::{MemoryStore, NameKey, Project, Record};

    async fn bind(store: &MemoryStore, project: &Project, name: &str, kind: &str, resource: &str) -> NameRecord {
        let record = NameRecord::new(IdRef::new(resource), None);
        let binding = ProjectName::new(project.id_ref(), NameKey::new(name, kind), record.id_ref());
        store.put(&record).await.unwrap();
        store.put(&binding).await.unwrap();
        record
    }

    #[tokio::test]
    async fn test_resolves_by_name_and_type() {
        let store = MemoryStore::new();
        let project = Project::new("/work/a");
        let token = bind(&store, &project, "Token", "Contract", "c-token").await;
        bind(&store, &project, "Token", "Network", "n-token").await;
        bind(&store, &project, "Sale", "Contract", "c-sale").await;

        let filter = NameFilter::named("Token").with_kind("Contract");
        let records = resolve_name_records(&store, &project.id_ref(), &filter).await.unwrap();
        assert_eq!(records, vec![Some(token)]);
    }

    #[tokio::test]
    async fn test_absent_fields_match_any() {
        let store = MemoryStore::new();
        let project = Project::new("/work/a");
        let token = bind(&store, &project, "Token", "Contract", "c-token").await;
        let sale = bind(&store, &project, "Sale", "Contract", "c-sale").await;
        let mainnet = bind(&store, &project, "mainnet", "Network", "n-main").await;

        let all = resolve_name_records(&store, &project.id_ref(), &NameFilter::any())
            .await
            .unwrap();
        assert_eq!(all, vec![Some(token.clone()), Some(sale.clone()), Some(mainnet)]);

        let contracts = resolve_name_records(
            &store,
            &project.id_ref(),
            &NameFilter::any().with_kind("Contract"),
        )
        .await
        .unwrap();
        assert_eq!(contracts, vec![Some(token), Some(sale)]);
    }

    #[tokio::test]
    async fn test_scoped_to_project() {
        let store = MemoryStore::new();
        let ours = Project::new("/work/a");
        let theirs = Project::new("/work/b");
        bind(&store, &theirs, "Token", "Contract", "c-token").await;

        let records = resolve_name_records(&store, &ours.id_ref(), &NameFilter::named("Token"))
            .await
            .unwrap();
        assert!(records.is_empty());
        // No record lookup for an empty match
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_record_keeps_position() {
        let store = MemoryStore::new();
        let project = Project::new("/work/a");
        let dangling = ProjectName::new(
            project.id_ref(),
            NameKey::new("Ghost", "Contract"),
            IdRef::new("no-such-record"),
        );
        store.put(&dangling).await.unwrap();
        let token = bind(&store, &project, "Token", "Contract", "c-token").await;

        let records = resolve_name_records(&store, &project.id_ref(), &NameFilter::any())
            .await
            .unwrap();
        assert_eq!(records, vec![None, Some(token)]);
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let store = MemoryStore::new().with_available(false);
        let result = resolve_name_records(&store, &IdRef::new("p"), &NameFilter::any()).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_compacted_lookup_is_misaligned() {
        let store = CompactingStore::new();
        let project = Project::new("/work/a");
        let dangling = ProjectName::new(
            project.id_ref(),
            NameKey::new("Ghost", "Contract"),
            IdRef::new("no-such-record"),
        );
        store.inner.put(&dangling).await.unwrap();
        bind(&store.inner, &project, "Token", "Contract", "c-token").await;

        let result = resolve_name_records(&store, &project.id_ref(), &NameFilter::any()).await;
        assert!(matches!(
            result,
            Err(StoreError::Misaligned {
                expected: 2,
                actual: 1
            })
        ));
    }
}
