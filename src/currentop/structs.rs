//! The structs
//!
use std::collections::BTreeMap;
use mongodb::bson::{Bson, Document};

/// An operation as projected by the `$currentOp` pipeline.
///
/// ```text
/// {
///   microsecs_running: Long("2873210"),
///   op: 'query',
///   ns: 'shop.orders',
///   command: { find: 'orders', filter: { status: 'open' }, '$db': 'shop' },
///   planSummary: 'COLLSCAN',
///   waitingForLock: false,
///   waitingForFlowControl: false
/// }
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrentOpRecord {
    #[serde(rename = "microsecs_running")]
    pub microsecs_running: i64,
    pub op: String,
    pub ns: String,
    pub waiting_for_lock: bool,
    pub plan_summary: Option<String>,
    pub waiting_for_flow_control: bool,
    pub waiting_for_latch: Option<Bson>,
    pub transaction: Option<Bson>,
    pub msg: Option<String>,
    pub command: Option<Document>,
}

/// The counters for one namespace, or for all namespaces together.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NamespaceAggregate {
    pub slow_query_count: u64,
    pub longest_running_query_secs: f64,
    pub collscan_count: u64,
    pub waiting_for_lock_count: u64,
    pub waiting_for_latch_count: u64,
    pub waiting_for_flow_control_count: u64,
    pub transaction_count: u64,
}

/// The aggregates per namespace, and the grand total.
#[derive(Debug, Default)]
pub struct AllNamespaceAggregates {
    pub namespaces: BTreeMap<String, NamespaceAggregate>,
    pub total: NamespaceAggregate,
}

#[derive(Debug, Clone, Copy)]
pub struct CurrentOpCollector {
    /// The server slowOpThresholdMs: only operations running longer are reported.
    pub slow_ms: i64,
}
