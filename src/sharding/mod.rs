//! Module for the sharding metrics, read from the config database on a config server.
//!
//! Five independent parts make up the sharding snapshot:
//! - shards: `config.shards`, the total and the draining shards.
//! - databases: `config.databases`, partitioned (sharded) and unpartitioned databases.
//! - balancer: `config.settings`, the balancer document.
//! - chunks: `config.chunks` grouped by shard for every user collection in `config.collections`.
//! - chunk moves: successful `moveChunk.from` events in `config.changelog` over the last 24 hours.
//!
//! A part whose query fails is left out, the others are still reported.
//! A collection with chunks but without chunk moves is reported with 0 chunk moves.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
