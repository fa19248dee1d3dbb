//! The structs
//!
use std::{collections::BTreeSet, sync::Arc};
use crate::gateway::{Connector, ShellGateway};

/// The collectors, in the order they run in a scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectorKind {
    ReplicaSetStatus,
    TopMetrics,
    CurrentOpMetrics,
    OplogStatus,
    ShardStats,
    LvmSnapshotStats,
    RollbackStats,
    InstanceMetrics,
}

/// The enabled collectors.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Enablement {
    pub enabled: BTreeSet<CollectorKind>,
}

/// What the server said about itself at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub is_mongos: bool,
    pub is_arbiter: bool,
    pub is_config_server: bool,
    pub slow_ms: i64,
}

pub struct Exporter {
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) shell: Arc<dyn ShellGateway>,
    pub enablement: Enablement,
    pub topology: Topology,
    pub lvm_backup_dir: String,
    /// Seconds subtracted from the scrape timeout.
    pub timeout_offset: f64,
}
