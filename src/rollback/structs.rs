//! The structs
//!
use std::{collections::{BTreeMap, HashMap}, sync::Arc};
use mongodb::bson::Bson;
use crate::gateway::ShellGateway;

/// The `listDatabases` response, with `nameOnly: true`.
///
/// ```text
/// { databases: [ { name: 'admin' }, { name: 'config' }, { name: 'local' }, { name: 'shop' } ], ok: 1 }
/// ```
#[derive(Debug, Deserialize)]
pub struct ListDatabases {
    pub databases: Vec<ListedDatabase>,
}

#[derive(Debug, Deserialize)]
pub struct ListedDatabase {
    pub name: String,
}

/// The `listCollections` response. A large database returns its collections in more than one batch.
///
/// ```text
/// {
///   cursor: {
///     id: Long("0"),
///     ns: 'shop.$cmd.listCollections',
///     firstBatch: [
///       { name: 'orders', type: 'collection', options: {}, info: { readOnly: false, uuid: new UUID("5b2f3c1e-0001-0203-0405-060708090a0b") }, idIndex: { v: 2, key: { _id: 1 }, name: '_id_' } }
///     ]
///   },
///   ok: 1
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct ListCollections {
    pub cursor: CollectionCursor,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionCursor {
    pub id: i64,
    pub first_batch: Vec<ListedCollection>,
    pub next_batch: Vec<ListedCollection>,
}

#[derive(Debug, Deserialize)]
pub struct ListedCollection {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub info: CollectionInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct CollectionInfo {
    pub uuid: Option<Bson>,
}

/// Collection uuid in canonical string form to `database.collection`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NamespaceDirectory {
    pub namespaces: HashMap<String, String>,
}

/// The namespaces that have a rollback directory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RollbackStatus {
    pub namespaces: BTreeMap<String, bool>,
}

pub struct RollbackCollector {
    pub shell: Arc<dyn ShellGateway>,
}
