//! The descriptor table
//!
use crate::schema::{Family, MetricDescriptor, ValueKind};

const NAMESPACE: &[&str] = &["database", "collection"];
const NAMESPACE_SHARD: &[&str] = &["database", "collection", "shard"];
const ROLE: &[&str] = &["role"];
const NONE: &[&str] = &[];

macro_rules! descriptor {
    ($family:ident, $field:literal, $kind:ident, $labels:expr, $help:literal) => {
        MetricDescriptor {
            family: Family::$family,
            field: $field,
            help: $help,
            label_names: $labels,
            kind: ValueKind::$kind,
        }
    };
}

pub(crate) static DESCRIPTORS: &[MetricDescriptor] = &[
    // replica set status and config
    descriptor!(ReplStats, "heartbeat_delay", Gauge, NONE, "Largest heartbeat delay in seconds among the other replica set members"),
    descriptor!(ReplStats, "lag", Gauge, NONE, "Replication optime lag behind the primary in seconds"),
    descriptor!(ReplStats, "odd_state", Gauge, NONE, "State of a member outside primary, secondary, startup2 or arbiter, 1 (primary) when there is none"),
    descriptor!(ReplStats, "elected_before_secs", Gauge, NONE, "Seconds elapsed since the primary was elected"),
    descriptor!(ReplStats, "status", Gauge, NONE, "Replica set state of this member"),
    descriptor!(ReplStats, "version", Gauge, NONE, "Version in the replica set config"),
    descriptor!(ReplStats, "term", Gauge, NONE, "Term in the replica set config"),
    descriptor!(ReplStats, "protocolVersion", Gauge, NONE, "ProtocolVersion in the replica set config"),
    descriptor!(ReplStats, "arbiterOnly", Gauge, NONE, "ArbiterOnly of this member in the replica set config"),
    descriptor!(ReplStats, "buildIndexes", Gauge, NONE, "BuildIndexes of this member in the replica set config"),
    descriptor!(ReplStats, "hidden", Gauge, NONE, "Hidden of this member in the replica set config"),
    descriptor!(ReplStats, "priority", Gauge, NONE, "Priority of this member in the replica set config"),
    descriptor!(ReplStats, "votes", Gauge, NONE, "Votes of this member in the replica set config"),
    // replication role
    descriptor!(ReplRole, "role", Gauge, ROLE, "Replication role, 1 for the role of this node"),
    // oplog
    descriptor!(Oplog, "logSizeMB", Gauge, NONE, "Allocated size of the oplog in MB"),
    descriptor!(Oplog, "usedMB", Gauge, NONE, "Used size of the oplog in MB"),
    descriptor!(Oplog, "timeDiff", Gauge, NONE, "Seconds between the first and the last oplog entry"),
    descriptor!(Oplog, "firstTs", Gauge, NONE, "Timestamp of the first oplog entry"),
    descriptor!(Oplog, "lastTs", Gauge, NONE, "Timestamp of the last oplog entry"),
    // top
    descriptor!(Top, "insert_count", Counter, NAMESPACE, "Usage statistics for insert count"),
    descriptor!(Top, "insert_time", Counter, NAMESPACE, "Usage statistics for insert time"),
    descriptor!(Top, "queries_count", Counter, NAMESPACE, "Usage statistics for queries count"),
    descriptor!(Top, "queries_time", Counter, NAMESPACE, "Usage statistics for queries time"),
    descriptor!(Top, "update_count", Counter, NAMESPACE, "Usage statistics for update count"),
    descriptor!(Top, "update_time", Counter, NAMESPACE, "Usage statistics for update time"),
    descriptor!(Top, "remove_count", Counter, NAMESPACE, "Usage statistics for remove count"),
    descriptor!(Top, "remove_time", Counter, NAMESPACE, "Usage statistics for remove time"),
    descriptor!(Top, "getmore_count", Counter, NAMESPACE, "Usage statistics for getmore count"),
    descriptor!(Top, "getmore_time", Counter, NAMESPACE, "Usage statistics for getmore time"),
    descriptor!(Top, "commands_count", Counter, NAMESPACE, "Usage statistics for commands count"),
    descriptor!(Top, "commands_time", Counter, NAMESPACE, "Usage statistics for commands time"),
    // current operations
    descriptor!(Process, "slow_query_count", Gauge, NAMESPACE, "Number of operations running longer than slowms"),
    descriptor!(Process, "slow_query_count_total", Gauge, NONE, "Total number of operations running longer than slowms"),
    descriptor!(Process, "longest_running_query_secs", Gauge, NAMESPACE, "Longest running operation in seconds"),
    descriptor!(Process, "longest_running_query_secs_total", Gauge, NONE, "Longest running operation over all namespaces in seconds"),
    descriptor!(Process, "collscan_count", Gauge, NAMESPACE, "Number of operations doing a collection scan"),
    descriptor!(Process, "collscan_count_total", Gauge, NONE, "Total number of operations doing a collection scan"),
    descriptor!(Process, "waiting_for_lock_count", Gauge, NAMESPACE, "Number of operations waiting for a lock"),
    descriptor!(Process, "waiting_for_lock_count_total", Gauge, NONE, "Total number of operations waiting for a lock"),
    descriptor!(Process, "waiting_for_latch_count", Gauge, NAMESPACE, "Number of operations waiting for a latch"),
    descriptor!(Process, "waiting_for_latch_count_total", Gauge, NONE, "Total number of operations waiting for a latch"),
    descriptor!(Process, "waiting_for_flow_control_count", Gauge, NAMESPACE, "Number of operations waiting for flow control"),
    descriptor!(Process, "waiting_for_flow_control_count_total", Gauge, NONE, "Total number of operations waiting for flow control"),
    descriptor!(Process, "transaction_count", Gauge, NAMESPACE, "Number of operations in a transaction"),
    descriptor!(Process, "transaction_count_total", Gauge, NONE, "Total number of operations in a transaction"),
    // sharding
    descriptor!(Config, "shards", Gauge, NONE, "Number of shards"),
    descriptor!(Config, "draining_shards", Gauge, NONE, "Number of draining shards"),
    descriptor!(Config, "sharded_databases", Gauge, NONE, "Number of sharded databases"),
    descriptor!(Config, "unsharded_databases", Gauge, NONE, "Number of unsharded databases"),
    descriptor!(Config, "balancer_enabled", Gauge, NONE, "Balancer is enabled"),
    descriptor!(Config, "chunks", Gauge, NAMESPACE_SHARD, "Number of chunks for each collection on each shard"),
    descriptor!(Config, "last_24h_chunk_moves", Gauge, NAMESPACE, "Number of chunk moves in the last 24 hours"),
    // system
    descriptor!(System, "snapshot_allocation", Gauge, NONE, "Data allocation percentage of the LVM snapshot volume"),
    descriptor!(System, "rollback_directory", Gauge, NAMESPACE, "A rollback directory exists for the collection"),
    // instance
    descriptor!(Instance, "version", Gauge, NONE, "The major.minor version of MongoDB"),
];
