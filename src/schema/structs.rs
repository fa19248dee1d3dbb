//! The structs
//!
use std::collections::HashMap;

/// The metric families. Each family maps to a fixed prefix of the exposed metric name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    /// `mongodb_replstats`: derived replica set status and config.
    ReplStats,
    /// `mongodb_repl`: the replication role indicator.
    ReplRole,
    /// `mongodb_oplogstats`: oplog size and window.
    Oplog,
    /// `mongodb_process`: slow running operations per namespace and in total.
    Process,
    /// `mongodb_config`: sharding statistics from the config database.
    Config,
    /// `mongodb_system`: host level data, rollback directories and LVM snapshot allocation.
    System,
    /// `mongodb_instance`: instance version.
    Instance,
    /// `mongodb_top`: usage statistics per namespace.
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Counter,
    Gauge,
}

/// The description of a single metric.
#[derive(Debug, PartialEq)]
pub struct MetricDescriptor {
    pub family: Family,
    pub field: &'static str,
    pub help: &'static str,
    pub label_names: &'static [&'static str],
    pub kind: ValueKind,
}

/// A single value for a descriptor, with exactly one label value per label name.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricInstance {
    pub descriptor: &'static MetricDescriptor,
    pub value: f64,
    pub label_values: Vec<String>,
}

/// The lookup table from (family, field) to descriptor.
#[derive(Debug)]
pub struct SchemaRegistry {
    pub(crate) descriptors: &'static [MetricDescriptor],
    pub(crate) index: HashMap<(Family, &'static str), &'static MetricDescriptor>,
}
