//! The structs
//!
use std::collections::BTreeMap;
use mongodb::bson::{Bson, Timestamp};

/// A document from `config.shards`.
///
/// ```text
/// { _id: 'shard01', host: 'shard01/mongo-s1a:27018,mongo-s1b:27018', state: 1, draining: true }
/// ```
#[derive(Debug, Deserialize)]
pub struct ShardRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub draining: bool,
}

/// A document from `config.databases`.
/// `partitioned` is absent on newer versions, where every database can hold sharded collections.
#[derive(Debug, Deserialize)]
pub struct DatabaseRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub partitioned: bool,
}

/// The `balancer` document from `config.settings`.
#[derive(Debug, Deserialize)]
pub struct BalancerSettings {
    #[serde(default)]
    pub stopped: bool,
}

/// A document from `config.collections`.
///
/// Since 5.0 chunks refer to their collection by uuid, and the collection has a `timestamp`.
/// Before that, chunks refer to their collection by namespace.
///
/// ```text
/// { _id: 'shop.orders', lastmodEpoch: ObjectId("..."), lastmod: ISODate("..."), timestamp: Timestamp({ t: 1681196416, i: 4 }), uuid: UUID("5b2f3c1e-..."), key: { customer_id: 'hashed' }, unique: false }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionEntry {
    #[serde(rename = "_id")]
    pub namespace: String,
    pub uuid: Option<Bson>,
    pub timestamp: Option<Timestamp>,
}

/// How the chunks of a collection are matched in `config.chunks`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkKey {
    Uuid(Bson),
    Namespace(String),
}

/// The result of grouping `config.chunks` by shard.
#[derive(Debug, Deserialize)]
pub struct ShardChunkCount {
    #[serde(rename = "_id")]
    pub shard: String,
    #[serde(rename = "nChunks")]
    pub chunks: i64,
}

/// The result of grouping `config.changelog` by namespace.
#[derive(Debug, Deserialize)]
pub struct NamespaceChunkMoves {
    #[serde(rename = "_id")]
    pub namespace: String,
    #[serde(rename = "nChunks")]
    pub moves: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDistribution {
    pub namespace: String,
    pub shard: String,
    pub chunks: i64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ShardCounts {
    pub total: u64,
    pub draining: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DatabaseCounts {
    pub sharded: u64,
    pub unsharded: u64,
}

/// The sharding snapshot. A part is `None` when its query failed.
#[derive(Debug, Default)]
pub struct ShardTopologySnapshot {
    pub shards: Option<ShardCounts>,
    pub databases: Option<DatabaseCounts>,
    pub balancer_enabled: Option<bool>,
    pub chunks: Option<Vec<ChunkDistribution>>,
    pub chunk_moves: Option<BTreeMap<String, i64>>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ShardingCollector;
