//! mongo_stats: a prometheus exporter for MongoDB.
//!
//! The exporter connects to a single mongod or mongos, and for every scrape runs a set of
//! collectors that turn administrative command output into prometheus metrics:
//! - replication state (`replSetGetStatus`, `replSetGetConfig`)
//! - slow running operations (`$currentOp`)
//! - usage statistics (`top`)
//! - oplog window (`collStats` and `local.oplog.rs`)
//! - sharding distribution (the `config` database, on a config server)
//! - rollback directories and LVM snapshot allocation (local host only)
//! - instance version (`buildinfo`)
//!
#[macro_use]
extern crate serde_derive;

use clap::Parser;

pub mod utility;
pub mod schema;
pub mod gateway;
pub mod snapshot;
pub mod replication;
pub mod currentop;
pub mod sharding;
pub mod rollback;
pub mod oplog;
pub mod top;
pub mod instance;
pub mod exposition;
pub mod exporter;
pub mod server;

const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_LISTEN_ADDRESS: &str = ":9100";
pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";
/// The scrape timeout used when prometheus does not send the timeout header.
pub const DEFAULT_SCRAPE_TIMEOUT_SECS: f64 = 10.0;
/// The slowms value used when the server does not report `operationProfiling.slowOpThresholdMs`.
pub const DEFAULT_SLOW_MS: i64 = 100;
/// The mongod default for `storage.dbPath`.
pub const DEFAULT_DB_PATH: &str = "/data/db";
/// The namespace used when an operation has no namespace, or a collection uuid cannot be resolved.
pub const UNKNOWN_NAMESPACE: &str = "unknown.unknown";
/// The interval between connection attempts at startup.
pub const CONNECT_RETRY_SECS: u64 = 5;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Opts {
    /// MongoDB connection URI
    #[arg(long = "mongodb.uri", env = "MONGODB_URI", default_value = DEFAULT_URI)]
    pub mongodb_uri: String,
    /// Monitor user, overrides the user in the URI
    #[arg(long = "mongodb.user", env = "MONGODB_USER")]
    pub mongodb_user: Option<String>,
    /// Monitor user password, overrides the password in the URI
    #[arg(long = "mongodb.password", env = "MONGODB_PASSWORD", hide_env_values = true)]
    pub mongodb_password: Option<String>,
    /// Use one long-lived client for all scrapes instead of a client per scrape
    #[arg(long = "mongodb.global-conn-pool")]
    pub global_conn_pool: bool,
    /// Connect directly to the host in the URI instead of discovering the topology
    #[arg(long = "mongodb.direct-connect", default_value_t = true, action = clap::ArgAction::Set)]
    pub direct_connect: bool,
    /// Connection and server selection timeout in milliseconds
    #[arg(long = "mongodb.connect-timeout-ms", default_value_t = 5000)]
    pub connect_timeout_ms: u64,
    /// Address to listen on for the web interface and telemetry
    #[arg(long = "web.listen-address", default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen_address: String,
    /// Path under which to expose metrics
    #[arg(long = "web.telemetry-path", default_value = DEFAULT_TELEMETRY_PATH)]
    pub telemetry_path: String,
    /// Seconds subtracted from the prometheus scrape timeout to get the collection deadline
    #[arg(long = "web.timeout-offset", default_value_t = 1.0)]
    pub timeout_offset: f64,
    /// Only log messages with the given severity or above
    #[arg(long = "log.level", default_value = "error", value_parser = ["trace", "debug", "info", "warn", "error", "fatal"])]
    pub log_level: String,
    /// Enable replica set status metrics
    #[arg(long = "collector.replicasetstatus")]
    pub collector_replicasetstatus: bool,
    /// Enable top (usage statistics) metrics
    #[arg(long = "collector.topmetrics")]
    pub collector_topmetrics: bool,
    /// Enable slow current operation metrics
    #[arg(long = "collector.currentopmetrics")]
    pub collector_currentopmetrics: bool,
    /// Enable oplog window metrics
    #[arg(long = "collector.oplogstats")]
    pub collector_oplogstats: bool,
    /// Enable sharding metrics (config server only)
    #[arg(long = "collector.shardstats")]
    pub collector_shardstats: bool,
    /// Enable LVM snapshot allocation metrics (local host only)
    #[arg(long = "collector.lvmsnapshotstats")]
    pub collector_lvmsnapshotstats: bool,
    /// Enable rollback directory metrics (local host only)
    #[arg(long = "collector.rollbackstats")]
    pub collector_rollbackstats: bool,
    /// Enable instance version metrics
    #[arg(long = "collector.instance")]
    pub collector_instance: bool,
    /// Enable all collectors
    #[arg(long = "collect-all")]
    pub collect_all: bool,
    /// The mount point of the LVM backup volume
    #[arg(long = "lvm-backup-dir")]
    pub lvm_backup_dir: Option<String>,
}
