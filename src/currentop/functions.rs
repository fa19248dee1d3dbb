//! The impls and functions
//!
use std::time::Instant;
use async_trait::async_trait;
use log::*;
use mongodb::bson::{doc, Bson, Document};
use crate::gateway::{decode, AdminGateway, GatewayError};
use crate::currentop::{AllNamespaceAggregates, CurrentOpCollector, CurrentOpRecord, NamespaceAggregate};
use crate::schema::Family;
use crate::snapshot::{Collector, MetricSink};
use crate::utility::{normalize_namespace, split_namespace, SYSTEM_NAMESPACE_PATTERN};

/// The pipeline that returns the client operations running longer than `slow_ms`,
/// outside of the system namespaces.
pub fn current_op_pipeline(slow_ms: i64) -> Vec<Document>
{
    vec![
        doc! { "$currentOp": {
            "allUsers": true,
            "idleConnections": false,
            "idleSessions": true,
            "idleCursors": false,
            "localOps": true,
            "truncateOps": true,
        } },
        doc! { "$match": {
            "microsecs_running": { "$gt": slow_ms * 1000 },
            "ns": { "$not": { "$regex": SYSTEM_NAMESPACE_PATTERN } },
            "desc": { "$regex": "^conn" },
            "op": { "$nin": ["", "none"] },
        } },
        doc! { "$project": {
            "_id": 0,
            "microsecs_running": 1,
            "op": 1,
            "ns": 1,
            "waitingForLock": 1,
            "planSummary": 1,
            "waitingForFlowControl": 1,
            "waitingForLatch": 1,
            "transaction": 1,
            "msg": 1,
            "command": 1,
        } },
    ]
}

impl CurrentOpRecord {
    /// Index builds run for a long time by nature, and are not slow queries.
    pub fn is_index_build(&self) -> bool
    {
        if let Some(command) = &self.command {
            if command.contains_key("createIndexes") {
                return true;
            }
            if let Some(Bson::String(truncated)) = command.get("$truncated") {
                if truncated.starts_with("{ createIndexes") {
                    return true;
                }
            }
        }
        self.msg.as_deref().is_some_and(|msg| msg.contains("Index Build"))
    }
}

impl NamespaceAggregate {
    fn add(&mut self, operation: &CurrentOpRecord)
    {
        self.slow_query_count += 1;
        self.longest_running_query_secs = self.longest_running_query_secs.max(operation.microsecs_running as f64 / 1_000_000.0);
        if operation.plan_summary.as_deref() == Some("COLLSCAN") {
            self.collscan_count += 1;
        }
        if operation.waiting_for_lock {
            self.waiting_for_lock_count += 1;
        }
        if operation.waiting_for_latch.is_some() {
            self.waiting_for_latch_count += 1;
        }
        if operation.waiting_for_flow_control {
            self.waiting_for_flow_control_count += 1;
        }
        if operation.transaction.is_some() {
            self.transaction_count += 1;
        }
    }
    /// The field names and values, with the `_total` suffix for the grand total.
    pub fn fields(&self, total: bool) -> Vec<(String, f64)>
    {
        let suffix = if total { "_total" } else { "" };
        [
            ("slow_query_count", self.slow_query_count as f64),
            ("longest_running_query_secs", self.longest_running_query_secs),
            ("collscan_count", self.collscan_count as f64),
            ("waiting_for_lock_count", self.waiting_for_lock_count as f64),
            ("waiting_for_latch_count", self.waiting_for_latch_count as f64),
            ("waiting_for_flow_control_count", self.waiting_for_flow_control_count as f64),
            ("transaction_count", self.transaction_count as f64),
        ]
        .into_iter()
        .map(|(field, value)| (format!("{}{}", field, suffix), value))
        .collect()
    }
}

impl AllNamespaceAggregates {
    pub fn new() -> Self { Default::default() }
    /// Count every operation in its namespace and in the grand total.
    /// Every operation counts as a slow query: the pipeline only returns operations over slowms.
    pub fn aggregate(operations: &[CurrentOpRecord]) -> AllNamespaceAggregates
    {
        let mut aggregates = AllNamespaceAggregates::new();
        for operation in operations {
            aggregates.namespaces
                .entry(normalize_namespace(&operation.ns))
                .or_default()
                .add(operation);
            aggregates.total.add(operation);
        }
        aggregates
    }
    pub fn emit(&self, sink: &MetricSink)
    {
        for (namespace, aggregate) in &self.namespaces {
            let (database, collection) = split_namespace(namespace);
            for (field, value) in aggregate.fields(false) {
                sink.render(Family::Process, &field, value, &[database.as_str(), collection.as_str()]);
            }
        }
        for (field, value) in self.total.fields(true) {
            sink.render(Family::Process, &field, value, &[]);
        }
    }
}

impl CurrentOpCollector {
    pub async fn read_operations(
        &self,
        gateway: &dyn AdminGateway,
    ) -> Result<Vec<CurrentOpRecord>, GatewayError>
    {
        gateway
            .aggregate("admin", None, current_op_pipeline(self.slow_ms))
            .await?
            .into_iter()
            .map(|document| decode(document, "$currentOp"))
            .collect()
    }
}

#[async_trait]
impl Collector for CurrentOpCollector {
    fn name(&self) -> &'static str
    {
        "currentopmetrics"
    }
    async fn collect(
        &self,
        gateway: &dyn AdminGateway,
        sink: &MetricSink,
    )
    {
        info!("begin currentop");
        let timer = Instant::now();

        let operations = match self.read_operations(gateway).await {
            Ok(operations) => operations,
            Err(error) => {
                error!("Failed to get currentOp: {}", error);
                return;
            }
        };
        let operations: Vec<CurrentOpRecord> = operations
            .into_iter()
            .filter(|operation| !operation.is_index_build())
            .collect();

        AllNamespaceAggregates::aggregate(&operations).emit(sink);

        info!("end currentop: {} operations, {:?}", operations.len(), timer.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::gateway::fake::FakeGateway;
    use crate::snapshot::SnapshotCache;

    fn operation(ns: &str, microsecs_running: i64) -> CurrentOpRecord {
        CurrentOpRecord {
            microsecs_running,
            op: "query".to_string(),
            ns: ns.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn unit_parse_current_op() {
        // This is what the $currentOp pipeline returns for a collection scan in a transaction.
        let record: CurrentOpRecord = decode(doc! {
            "microsecs_running": Bson::Int64(2_873_210),
            "op": "query",
            "ns": "shop.orders",
            "command": { "find": "orders", "filter": { "status": "open" }, "$db": "shop" },
            "planSummary": "COLLSCAN",
            "waitingForLock": false,
            "waitingForFlowControl": true,
            "waitingForLatch": { "timestamp": Bson::DateTime(mongodb::bson::DateTime::from_millis(0)), "captureName": "CollectionShardingRuntime::_metadataManagerLock" },
            "transaction": { "parameters": { "txnNumber": Bson::Int64(1), "autocommit": false } },
        }, "$currentOp").unwrap();
        assert_eq!(record.microsecs_running, 2_873_210);
        assert_eq!(record.plan_summary.as_deref(), Some("COLLSCAN"));
        assert!(record.waiting_for_flow_control);
        assert!(record.waiting_for_latch.is_some());
        assert!(record.transaction.is_some());
        assert!(record.msg.is_none());
        assert!(!record.is_index_build());
    }

    #[test]
    fn unit_parse_current_op_presence_fields_of_any_type() {
        let record: CurrentOpRecord = decode(doc! {
            "microsecs_running": Bson::Int64(150_000),
            "op": "update",
            "ns": "shop.orders",
            "waitingForLatch": true,
            "transaction": "txn-1",
        }, "$currentOp").unwrap();
        let aggregates = AllNamespaceAggregates::aggregate(&[record]);
        assert_eq!(aggregates.total.waiting_for_latch_count, 1);
        assert_eq!(aggregates.total.transaction_count, 1);
    }

    #[test]
    fn unit_index_builds_are_recognised() {
        let mut create_indexes = operation("shop.orders", 1);
        create_indexes.command = Some(doc! { "createIndexes": "orders", "indexes": [] });
        assert!(create_indexes.is_index_build());

        let mut truncated = operation("shop.orders", 1);
        truncated.command = Some(doc! { "$truncated": "{ createIndexes: \"orders\", indexes: [ { key: { a: 1 } } ] ..." });
        assert!(truncated.is_index_build());

        let mut message = operation("shop.orders", 1);
        message.msg = Some("Index Build: scanning collection".to_string());
        assert!(message.command.is_none());
        assert!(message.is_index_build());

        let mut other_truncated = operation("shop.orders", 1);
        other_truncated.command = Some(doc! { "$truncated": "{ find: \"orders\", filter: { ..." });
        assert!(!other_truncated.is_index_build());

        assert!(!operation("shop.orders", 1).is_index_build());
    }

    #[test]
    fn unit_aggregate_per_namespace_and_total() {
        let mut collscan = operation("shop.orders", 4_500_000);
        collscan.plan_summary = Some("COLLSCAN".to_string());
        collscan.waiting_for_lock = true;
        let mut in_transaction = operation("shop.orders", 1_200_000);
        in_transaction.transaction = Some(Bson::Document(doc! { "parameters": { "autocommit": false } }));
        let mut latched = operation("shop.customers", 7_000_000);
        latched.waiting_for_latch = Some(Bson::Document(doc! { "captureName": "AnonymousLatch" }));
        latched.waiting_for_flow_control = true;
        let unknown = operation("", 300_000);

        let aggregates = AllNamespaceAggregates::aggregate(&[collscan, in_transaction, latched, unknown]);

        assert_eq!(aggregates.namespaces.len(), 3);
        assert_eq!(aggregates.namespaces["shop.orders"], NamespaceAggregate {
            slow_query_count: 2,
            longest_running_query_secs: 4.5,
            collscan_count: 1,
            waiting_for_lock_count: 1,
            waiting_for_latch_count: 0,
            waiting_for_flow_control_count: 0,
            transaction_count: 1,
        });
        assert_eq!(aggregates.namespaces["unknown.unknown"].slow_query_count, 1);
        assert_eq!(aggregates.total, NamespaceAggregate {
            slow_query_count: 4,
            longest_running_query_secs: 7.0,
            collscan_count: 1,
            waiting_for_lock_count: 1,
            waiting_for_latch_count: 1,
            waiting_for_flow_control_count: 1,
            transaction_count: 1,
        });
    }

    #[test]
    fn unit_total_matches_namespaces() {
        let operations: Vec<CurrentOpRecord> = (0..25)
            .map(|number| operation(&format!("db{}.coll{}", number % 4, number % 3), (number * 137_000) % 2_000_000 + 100_001))
            .collect();
        let aggregates = AllNamespaceAggregates::aggregate(&operations);

        let count: u64 = aggregates.namespaces.values().map(|aggregate| aggregate.slow_query_count).sum();
        assert_eq!(aggregates.total.slow_query_count, count);
        let longest = aggregates.namespaces.values().map(|aggregate| aggregate.longest_running_query_secs).fold(0.0, f64::max);
        assert_eq!(aggregates.total.longest_running_query_secs, longest);
    }

    #[test]
    fn unit_longest_running_is_a_max() {
        let aggregates = AllNamespaceAggregates::aggregate(&[
            operation("shop.orders", 3_000_000),
            operation("shop.orders", 2_000_000),
        ]);
        assert_eq!(aggregates.namespaces["shop.orders"].longest_running_query_secs, 3.0);
    }

    #[test]
    fn unit_pipeline_threshold() {
        let pipeline = current_op_pipeline(250);
        assert_eq!(pipeline.len(), 3);
        let matching = pipeline[1].get_document("$match").unwrap();
        assert_eq!(matching.get_document("microsecs_running").unwrap().get_i64("$gt").unwrap(), 250_000);
    }

    #[tokio::test]
    async fn unit_collect_skips_index_builds() {
        let gateway = FakeGateway::new().with_aggregate("admin", vec![
            doc! { "microsecs_running": Bson::Int64(1_500_000), "op": "query", "ns": "shop.orders", "planSummary": "COLLSCAN", "command": { "find": "orders" } },
            doc! { "microsecs_running": Bson::Int64(90_000_000), "op": "command", "ns": "shop.orders", "command": { "createIndexes": "orders" } },
            doc! { "microsecs_running": Bson::Int64(60_000_000), "op": "command", "ns": "shop.orders", "msg": "Index Build: draining writes received during build" },
        ]);
        let cache = SnapshotCache::new(Arc::new(CurrentOpCollector { slow_ms: 100 }));
        cache.prime(Arc::new(gateway), |_| {}).await;
        let metrics = cache.replay().await;

        assert_eq!(metrics.len(), 14);
        let slow = metrics.iter().find(|metric| metric.descriptor.fq_name() == "mongodb_process_slow_query_count").unwrap();
        assert_eq!(slow.label_values, vec!["shop".to_string(), "orders".to_string()]);
        assert_eq!(slow.value, 1.0);
        let longest = metrics.iter().find(|metric| metric.descriptor.fq_name() == "mongodb_process_longest_running_query_secs_total").unwrap();
        assert!(longest.label_values.is_empty());
        assert_eq!(longest.value, 1.5);
    }

    #[tokio::test]
    async fn unit_collect_no_operations_emits_zero_totals() {
        let gateway = FakeGateway::new().with_aggregate("admin", vec![]);
        let cache = SnapshotCache::new(Arc::new(CurrentOpCollector { slow_ms: 100 }));
        cache.prime(Arc::new(gateway), |_| {}).await;
        let metrics = cache.replay().await;
        assert_eq!(metrics.len(), 7);
        assert!(metrics.iter().all(|metric| metric.value == 0.0 && metric.label_values.is_empty()));
    }
}
