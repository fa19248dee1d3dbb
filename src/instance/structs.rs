//! The structs
//!
use std::sync::Arc;
use crate::gateway::ShellGateway;

/// The parts of `hello` that determine the topology.
///
/// ```text
/// { isWritablePrimary: true, msg: 'isdbgrid', maxBsonObjectSize: 16777216, ..., ok: 1 }
/// ```
/// `msg: 'isdbgrid'` is only present on a mongos.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hello {
    pub set_name: Option<String>,
    pub msg: Option<String>,
    pub me: Option<String>,
    pub arbiter_only: bool,
}

/// The parts of `getCmdLineOpts` that are used.
///
/// ```text
/// {
///   argv: [ 'mongod', '--config', '/etc/mongod.conf' ],
///   parsed: {
///     config: '/etc/mongod.conf',
///     operationProfiling: { slowOpThresholdMs: 200 },
///     replication: { replSetName: 'cfg' },
///     sharding: { clusterRole: 'configsvr' },
///     storage: { dbPath: '/var/lib/mongo' }
///   },
///   ok: 1
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CmdLineOpts {
    pub parsed: ParsedOpts,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedOpts {
    pub operation_profiling: OperationProfilingOpts,
    pub sharding: ShardingOpts,
    pub storage: StorageOpts,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperationProfilingOpts {
    pub slow_op_threshold_ms: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShardingOpts {
    pub cluster_role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageOpts {
    pub db_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BuildInfo {
    pub version: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InstanceCollector;

pub struct SnapshotAllocationCollector {
    pub shell: Arc<dyn ShellGateway>,
    /// The mount point of the LVM backup volume.
    pub backup_dir: String,
}
