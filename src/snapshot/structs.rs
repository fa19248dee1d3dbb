//! The structs
//!
use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::{mpsc::UnboundedSender, Mutex};
use crate::gateway::AdminGateway;
use crate::schema::MetricInstance;

/// A metric source: one aggregation pass over the output of administrative commands.
///
/// A collector never returns an error. When a command fails it logs the failure and emits
/// whatever it can without it.
#[async_trait]
pub trait Collector: Send + Sync {
    /// The name used in `collect[]` and in log messages.
    fn name(&self) -> &'static str;
    async fn collect(
        &self,
        gateway: &dyn AdminGateway,
        sink: &MetricSink,
    );
}

/// The sending side of the channel a collector emits into.
#[derive(Debug, Clone)]
pub struct MetricSink {
    pub(crate) sender: UnboundedSender<MetricInstance>,
}

/// The per source cache of the metrics of the last prime.
pub struct SnapshotCache {
    pub(crate) collector: Arc<dyn Collector>,
    pub(crate) buffer: Mutex<Vec<MetricInstance>>,
}
