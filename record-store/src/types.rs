//! Entity types held by the record store.
//!
//! Every entity is stored as a JSON document. Cross-entity references are
//! `{ "id": ... }` objects, so selectors address them as `"<field>.id"`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Named collections in a project workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Projects,
    ProjectNames,
    NameRecords,
    Contracts,
    ContractInstances,
    Networks,
    NetworkGenealogies,
}

impl Collection {
    /// Collection name as used in document stores.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::ProjectNames => "projectNames",
            Collection::NameRecords => "nameRecords",
            Collection::Contracts => "contracts",
            Collection::ContractInstances => "contractInstances",
            Collection::Networks => "networks",
            Collection::NetworkGenealogies => "networkGenealogies",
        }
    }

    /// All collections, in a stable order.
    pub fn all() -> [Collection; 7] {
        [
            Collection::Projects,
            Collection::ProjectNames,
            Collection::NameRecords,
            Collection::Contracts,
            Collection::ContractInstances,
            Collection::Networks,
            Collection::NetworkGenealogies,
        ]
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed document living in exactly one collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    /// Reference to this record, for embedding in other records.
    fn id_ref(&self) -> IdRef {
        IdRef::new(self.id())
    }
}

/// Derive a content-addressed identifier from a collection and the fields
/// that make a record unique.
///
/// Parts are NUL-separated before hashing so `["ab", "c"]` and `["a", "bc"]`
/// never collide.
pub fn content_id(collection: Collection, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(collection.as_str().as_bytes());
    for part in parts {
        hasher.update([0u8]);
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Reference to another record by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct IdRef {
    pub id: String,
}

impl IdRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl From<&str> for IdRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for IdRef {
    fn from(id: String) -> Self {
        Self { id }
    }
}

/// A versioned workspace container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Project {
    pub id: String,
    /// Workspace directory the project was created for
    pub directory: String,
}

impl Project {
    pub fn new(directory: impl Into<String>) -> Self {
        let directory = directory.into();
        Self {
            id: content_id(Collection::Projects, &[&directory]),
            directory,
        }
    }
}

impl Record for Project {
    const COLLECTION: Collection = Collection::Projects;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Key under which a project binds a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct NameKey {
    pub name: String,
    /// Resource type, e.g. "Contract" or "Network"
    #[serde(rename = "type")]
    pub kind: String,
}

impl NameKey {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// Current pointer from a project's name key to the head of a version chain.
///
/// Bindings are never mutated. Rebinding a key inserts a new `ProjectName`
/// with the same id, which supersedes the old one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ProjectName {
    pub id: String,
    pub project: IdRef,
    pub key: NameKey,
    pub name_record: IdRef,
}

impl ProjectName {
    pub fn new(project: IdRef, key: NameKey, name_record: IdRef) -> Self {
        Self {
            id: content_id(
                Collection::ProjectNames,
                &[&project.id, &key.name, &key.kind],
            ),
            project,
            key,
            name_record,
        }
    }
}

impl Record for ProjectName {
    const COLLECTION: Collection = Collection::ProjectNames;

    fn id(&self) -> &str {
        &self.id
    }
}

/// One immutable node of a backward-linked version chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct NameRecord {
    pub id: String,
    /// The versioned resource this node names
    pub resource: IdRef,
    /// Older node in the chain, absent at the chain's origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<IdRef>,
}

impl NameRecord {
    pub fn new(resource: IdRef, previous: Option<IdRef>) -> Self {
        let previous_id = previous.as_ref().map(|p| p.id.as_str()).unwrap_or("");
        Self {
            id: content_id(Collection::NameRecords, &[&resource.id, previous_id]),
            resource,
            previous,
        }
    }
}

impl Record for NameRecord {
    const COLLECTION: Collection = Collection::NameRecords;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A compiled contract; the resource named by contract version chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Contract {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode: Option<String>,
}

impl Contract {
    pub fn new(name: impl Into<String>, bytecode: Option<String>) -> Self {
        let name = name.into();
        Self {
            id: content_id(
                Collection::Contracts,
                &[&name, bytecode.as_deref().unwrap_or("")],
            ),
            name,
            bytecode,
        }
    }
}

impl Record for Contract {
    const COLLECTION: Collection = Collection::Contracts;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A deployment of a contract onto a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ContractInstance {
    pub id: String,
    pub contract: IdRef,
    pub network: IdRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ContractInstance {
    pub fn new(contract: IdRef, network: IdRef, address: Option<String>) -> Self {
        Self {
            id: content_id(
                Collection::ContractInstances,
                &[&contract.id, &network.id, address.as_deref().unwrap_or("")],
            ),
            contract,
            network,
            address,
        }
    }
}

impl Record for ContractInstance {
    const COLLECTION: Collection = Collection::ContractInstances;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Block a network snapshot was taken at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct HistoricBlock {
    pub height: u64,
    pub hash: String,
}

/// A block-chain state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub name: String,
    pub network_id: u64,
    pub historic_block: HistoricBlock,
}

impl Network {
    pub fn new(name: impl Into<String>, network_id: u64, height: u64, hash: impl Into<String>) -> Self {
        let hash = hash.into();
        let network_id_str = network_id.to_string();
        let height_str = height.to_string();
        Self {
            id: content_id(
                Collection::Networks,
                &[&network_id_str, &height_str, &hash],
            ),
            name: name.into(),
            network_id,
            historic_block: HistoricBlock { height, hash },
        }
    }

    pub fn height(&self) -> u64 {
        self.historic_block.height
    }
}

impl Record for Network {
    const COLLECTION: Collection = Collection::Networks;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Direct ancestry edge between two networks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct NetworkGenealogy {
    pub id: String,
    pub ancestor: IdRef,
    pub descendant: IdRef,
}

impl NetworkGenealogy {
    pub fn new(ancestor: IdRef, descendant: IdRef) -> Self {
        Self {
            id: content_id(
                Collection::NetworkGenealogies,
                &[&ancestor.id, &descendant.id],
            ),
            ancestor,
            descendant,
        }
    }
}

impl Record for NetworkGenealogy {
    const COLLECTION: Collection = Collection::NetworkGenealogies;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_is_deterministic() {
        let a = content_id(Collection::Contracts, &["Token", "0x60"]);
        let b = content_id(Collection::Contracts, &["Token", "0x60"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_collections_are_distinct() {
        let names: std::collections::HashSet<&str> = Collection::all().iter().map(|c| c.as_str()).collect();
        assert_eq!(names.len(), Collection::all().len());

        let ids: std::collections::HashSet<String> = Collection::all()
            .iter()
            .map(|c| content_id(*c, &["same"]))
            .collect();
        assert_eq!(ids.len(), Collection::all().len());

        for collection in Collection::all() {
            assert_eq!(collection.to_string(), collection.as_str());
        }
    }

    #[test]
    fn test_content_id_separates_parts() {
        let a = content_id(Collection::Contracts, &["ab", "c"]);
        let b = content_id(Collection::Contracts, &["a", "bc"]);
        assert_ne!(a, b);

        let c = content_id(Collection::Networks, &["ab", "c"]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_binding_id_ignores_target() {
        let project = Project::new("/work/token");
        let key = NameKey::new("Token", "Contract");
        let first = ProjectName::new(project.id_ref(), key.clone(), IdRef::new("r1"));
        let second = ProjectName::new(project.id_ref(), key, IdRef::new("r2"));
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_document_shape() {
        let binding = ProjectName::new(
            IdRef::new("p"),
            NameKey::new("Token", "Contract"),
            IdRef::new("r"),
        );
        let doc = serde_json::to_value(&binding).unwrap();
        assert_eq!(doc["project"]["id"], "p");
        assert_eq!(doc["key"]["type"], "Contract");
        assert_eq!(doc["nameRecord"]["id"], "r");

        let origin = NameRecord::new(IdRef::new("c1"), None);
        let doc = serde_json::to_value(&origin).unwrap();
        assert!(doc.get("previous").is_none());

        let network = Network::new("mainnet", 1, 42, "0xabc");
        let doc = serde_json::to_value(&network).unwrap();
        assert_eq!(doc["historicBlock"]["height"], 42);
        assert_eq!(doc["networkId"], 1);
    }
}
