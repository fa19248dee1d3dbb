//! The impls and functions
//!
use std::{collections::BTreeMap, time::Instant};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::*;
use mongodb::bson::{self, doc, Document};
use serde::de::DeserializeOwned;
use crate::gateway::{decode, AdminGateway, GatewayError};
use crate::schema::Family;
use crate::sharding::{
    BalancerSettings, ChunkDistribution, ChunkKey, CollectionEntry, DatabaseCounts, DatabaseRecord, NamespaceChunkMoves,
    ShardChunkCount, ShardCounts, ShardRecord, ShardTopologySnapshot, ShardingCollector,
};
use crate::snapshot::{Collector, MetricSink};
use crate::utility::{split_namespace, SYSTEM_NAMESPACE_PATTERN};

const CONFIG: &str = "config";

fn decode_all<T: DeserializeOwned>(
    documents: Vec<Document>,
    what: &str,
) -> Result<Vec<T>, GatewayError>
{
    documents.into_iter().map(|document| decode(document, what)).collect()
}

impl ChunkKey {
    /// A collection with a non-zero timestamp and a uuid has its chunks keyed by uuid,
    /// any other collection by namespace. Both can be present while a cluster is upgraded.
    pub fn for_collection(collection: &CollectionEntry) -> ChunkKey
    {
        let has_timestamp = collection.timestamp.is_some_and(|timestamp| timestamp.time != 0 || timestamp.increment != 0);
        match (&collection.uuid, has_timestamp) {
            (Some(uuid), true) => ChunkKey::Uuid(uuid.clone()),
            _ => ChunkKey::Namespace(collection.namespace.clone()),
        }
    }
    pub fn match_stage(&self) -> Document
    {
        match self {
            ChunkKey::Uuid(uuid) => doc! { "$match": { "uuid": uuid.clone() } },
            ChunkKey::Namespace(namespace) => doc! { "$match": { "ns": namespace.clone() } },
        }
    }
}

/// The pipeline that counts the chunks of a collection per shard.
pub fn chunk_count_pipeline(key: &ChunkKey) -> Vec<Document>
{
    vec![
        key.match_stage(),
        doc! { "$group": { "_id": "$shard", "nChunks": { "$sum": 1 } } },
    ]
}

/// The pipeline that counts the successful chunk moves per namespace since `since`.
pub fn chunk_moves_pipeline(since: DateTime<Utc>) -> Vec<Document>
{
    vec![
        doc! { "$match": {
            "time": { "$gt": bson::DateTime::from_chrono(since) },
            "what": "moveChunk.from",
            "details.errmsg": { "$exists": false },
            "details.note": "success",
        } },
        doc! { "$group": { "_id": "$ns", "nChunks": { "$sum": 1 } } },
        doc! { "$project": { "_id": "$_id", "nChunks": "$nChunks" } },
    ]
}

impl ShardCounts {
    pub fn from_records(shards: &[ShardRecord]) -> ShardCounts
    {
        let draining: Vec<&str> = shards.iter().filter(|shard| shard.draining).map(|shard| shard.id.as_str()).collect();
        if !draining.is_empty() {
            debug!("draining shards: {:?}", draining);
        }
        ShardCounts { total: shards.len() as u64, draining: draining.len() as u64 }
    }
}

impl DatabaseCounts {
    pub fn from_records(databases: &[DatabaseRecord]) -> DatabaseCounts
    {
        let sharded: Vec<&str> = databases.iter().filter(|database| database.partitioned).map(|database| database.id.as_str()).collect();
        debug!("sharded databases: {:?}", sharded);
        DatabaseCounts { sharded: sharded.len() as u64, unsharded: (databases.len() - sharded.len()) as u64 }
    }
}

impl ShardTopologySnapshot {
    pub fn new() -> Self { Default::default() }
    /// The chunk moves per namespace, with every namespace that has chunks but no moves added with 0.
    /// A failed chunk moves read still reports 0 for every namespace with chunks.
    pub fn chunk_moves_filled(&self) -> Option<BTreeMap<String, i64>>
    {
        if self.chunks.is_none() && self.chunk_moves.is_none() {
            return None;
        }
        let mut moves = self.chunk_moves.clone().unwrap_or_default();
        for distribution in self.chunks.iter().flatten() {
            moves.entry(distribution.namespace.clone()).or_insert(0);
        }
        Some(moves)
    }
    pub fn emit(&self, sink: &MetricSink)
    {
        if let Some(shards) = self.shards {
            sink.render_fields(Family::Config, &[
                ("shards", shards.total as f64),
                ("draining_shards", shards.draining as f64),
            ], &[]);
        }
        if let Some(databases) = self.databases {
            sink.render_fields(Family::Config, &[
                ("sharded_databases", databases.sharded as f64),
                ("unsharded_databases", databases.unsharded as f64),
            ], &[]);
        }
        if let Some(balancer_enabled) = self.balancer_enabled {
            sink.render(Family::Config, "balancer_enabled", if balancer_enabled { 1.0 } else { 0.0 }, &[]);
        }
        for distribution in self.chunks.iter().flatten() {
            let (database, collection) = split_namespace(&distribution.namespace);
            sink.render(Family::Config, "chunks", distribution.chunks as f64, &[database.as_str(), collection.as_str(), distribution.shard.as_str()]);
        }
        for (namespace, moves) in self.chunk_moves_filled().iter().flatten() {
            let (database, collection) = split_namespace(namespace);
            sink.render(Family::Config, "last_24h_chunk_moves", *moves as f64, &[database.as_str(), collection.as_str()]);
        }
    }
}

impl ShardingCollector {
    pub async fn read_shards(gateway: &dyn AdminGateway) -> Result<ShardCounts, GatewayError>
    {
        let shards: Vec<ShardRecord> = decode_all(gateway.find(CONFIG, "shards", doc! {}, None, None).await?, "config.shards")?;
        Ok(ShardCounts::from_records(&shards))
    }
    pub async fn read_databases(gateway: &dyn AdminGateway) -> Result<DatabaseCounts, GatewayError>
    {
        let databases: Vec<DatabaseRecord> = decode_all(gateway.find(CONFIG, "databases", doc! {}, None, None).await?, "config.databases")?;
        Ok(DatabaseCounts::from_records(&databases))
    }
    /// The balancer is enabled unless the balancer settings say it is stopped.
    /// No balancer document at all means the balancer was never stopped.
    pub async fn read_balancer_enabled(gateway: &dyn AdminGateway) -> Result<bool, GatewayError>
    {
        let settings = gateway.find(CONFIG, "settings", doc! { "_id": "balancer" }, None, Some(1)).await?;
        match settings.into_iter().next() {
            Some(document) => {
                let settings: BalancerSettings = decode(document, "config.settings")?;
                Ok(!settings.stopped)
            }
            None => Ok(true),
        }
    }
    pub async fn read_chunks(gateway: &dyn AdminGateway) -> Result<Vec<ChunkDistribution>, GatewayError>
    {
        let filter = doc! { "_id": { "$not": { "$regex": SYSTEM_NAMESPACE_PATTERN } } };
        let collections: Vec<CollectionEntry> = decode_all(gateway.find(CONFIG, "collections", filter, None, None).await?, "config.collections")?;

        let mut distribution = Vec::new();
        for collection in collections {
            let key = ChunkKey::for_collection(&collection);
            let counts: Vec<ShardChunkCount> = decode_all(
                gateway.aggregate(CONFIG, Some("chunks"), chunk_count_pipeline(&key)).await?,
                "config.chunks",
            )?;
            distribution.extend(counts.into_iter().map(|count| ChunkDistribution {
                namespace: collection.namespace.clone(),
                shard: count.shard,
                chunks: count.chunks,
            }));
        }
        Ok(distribution)
    }
    pub async fn read_chunk_moves(
        gateway: &dyn AdminGateway,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<String, i64>, GatewayError>
    {
        let since = now - Duration::hours(24);
        let moves: Vec<NamespaceChunkMoves> = decode_all(
            gateway.aggregate(CONFIG, Some("changelog"), chunk_moves_pipeline(since)).await?,
            "config.changelog",
        )?;
        Ok(moves.into_iter().map(|moves| (moves.namespace, moves.moves)).collect())
    }
    /// Read all parts. A failing part is logged and left out.
    pub async fn read_snapshot(gateway: &dyn AdminGateway) -> ShardTopologySnapshot
    {
        let mut snapshot = ShardTopologySnapshot::new();
        snapshot.shards = ShardingCollector::read_shards(gateway).await
            .map_err(|error| error!("Failed to get shards: {}", error))
            .ok();
        snapshot.databases = ShardingCollector::read_databases(gateway).await
            .map_err(|error| error!("Failed to get databases: {}", error))
            .ok();
        snapshot.balancer_enabled = ShardingCollector::read_balancer_enabled(gateway).await
            .map_err(|error| error!("Failed to get balancer settings: {}", error))
            .ok();
        snapshot.chunks = ShardingCollector::read_chunks(gateway).await
            .map_err(|error| error!("Failed to get chunks: {}", error))
            .ok();
        snapshot.chunk_moves = ShardingCollector::read_chunk_moves(gateway, Utc::now()).await
            .map_err(|error| error!("Failed to get chunk moves: {}", error))
            .ok();
        snapshot
    }
}

#[async_trait]
impl Collector for ShardingCollector {
    fn name(&self) -> &'static str
    {
        "shardstats"
    }
    async fn collect(
        &self,
        gateway: &dyn AdminGateway,
        sink: &MetricSink,
    )
    {
        info!("begin sharding");
        let timer = Instant::now();

        ShardingCollector::read_snapshot(gateway).await.emit(sink);

        info!("end sharding: {:?}", timer.elapsed());
    }
}
