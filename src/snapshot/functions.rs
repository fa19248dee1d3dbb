//! The impls and functions
//!
use std::{sync::Arc, time::Instant};
use log::*;
use tokio::sync::{mpsc, mpsc::UnboundedReceiver, Mutex};
use crate::gateway::AdminGateway;
use crate::schema::{Family, MetricDescriptor, MetricInstance, SCHEMA};
use crate::snapshot::{Collector, MetricSink, SnapshotCache};

impl MetricSink {
    pub fn channel() -> (Self, UnboundedReceiver<MetricInstance>)
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        (MetricSink { sender }, receiver)
    }
    pub fn emit(&self, instance: MetricInstance)
    {
        if self.sender.send(instance).is_err() {
            debug!("metric emitted after the snapshot cache stopped receiving");
        }
    }
    /// Render a value through the schema registry and emit it.
    pub fn render(
        &self,
        family: Family,
        field: &str,
        value: f64,
        label_values: &[&str],
    )
    {
        self.emit(SCHEMA.render(family, field, value, label_values));
    }
    /// Render a list of (field, value) pairs that share the same label values.
    pub fn render_fields(
        &self,
        family: Family,
        fields: &[(&str, f64)],
        label_values: &[&str],
    )
    {
        for (field, value) in fields {
            self.render(family, field, *value, label_values);
        }
    }
}

impl SnapshotCache {
    pub fn new(collector: Arc<dyn Collector>) -> Self
    {
        SnapshotCache {
            collector,
            buffer: Mutex::new(Vec::new()),
        }
    }
    pub fn name(&self) -> &'static str
    {
        self.collector.name()
    }
    /// Run the collector once and capture its output.
    ///
    /// The lock is held from emptying the buffer until the collector has finished
    /// and every metric it emitted is in the buffer.
    pub async fn prime<F>(
        &self,
        gateway: Arc<dyn AdminGateway>,
        mut on_descriptor: F,
    )
    where
        F: FnMut(&'static MetricDescriptor),
    {
        info!("begin prime: {}", self.name());
        let timer = Instant::now();

        let mut buffer = self.buffer.lock().await;
        buffer.clear();

        let (sink, mut receiver) = MetricSink::channel();
        let collector = self.collector.clone();
        let handle = tokio::spawn(async move {
            collector.collect(gateway.as_ref(), &sink).await;
        });

        while let Some(instance) = receiver.recv().await {
            on_descriptor(instance.descriptor);
            buffer.push(instance);
        }
        if let Err(error) = handle.await {
            error!("collector {} aborted after {} metrics: {}", self.name(), buffer.len(), error);
        }

        info!("end prime: {}: {} metrics, {:?}", self.name(), buffer.len(), timer.elapsed());
    }
    /// The metrics of the last prime. The collector is not run.
    pub async fn replay(&self) -> Vec<MetricInstance>
    {
        self.buffer.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use crate::gateway::fake::FakeGateway;

    /// Emits one lag value and one role indicator per run, with the run number as the lag value.
    struct CountingCollector {
        runs: AtomicUsize,
        panic_after_first_metric: bool,
    }

    #[async_trait]
    impl Collector for CountingCollector {
        fn name(&self) -> &'static str {
            "counting"
        }
        async fn collect(&self, _gateway: &dyn AdminGateway, sink: &MetricSink) {
            let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            sink.render(Family::ReplStats, "lag", run as f64, &[]);
            if self.panic_after_first_metric {
                panic!("collector failure");
            }
            sink.render(Family::ReplRole, "role", 1.0, &["primary"]);
        }
    }

    fn counting(panic_after_first_metric: bool) -> Arc<CountingCollector> {
        Arc::new(CountingCollector { runs: AtomicUsize::new(0), panic_after_first_metric })
    }

    #[tokio::test]
    async fn unit_replay_does_not_rerun_collector() {
        let collector = counting(false);
        let cache = SnapshotCache::new(collector.clone());
        let gateway: Arc<dyn AdminGateway> = Arc::new(FakeGateway::new());

        let mut descriptors = Vec::new();
        cache.prime(gateway, |descriptor| descriptors.push(descriptor.fq_name())).await;
        assert_eq!(descriptors, vec!["mongodb_replstats_lag", "mongodb_repl_role"]);

        let first = cache.replay().await;
        let second = cache.replay().await;
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(collector.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unit_prime_replaces_buffer() {
        let collector = counting(false);
        let cache = SnapshotCache::new(collector.clone());
        let gateway: Arc<dyn AdminGateway> = Arc::new(FakeGateway::new());

        cache.prime(gateway.clone(), |_| {}).await;
        cache.prime(gateway, |_| {}).await;

        let metrics = cache.replay().await;
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].value, 2.0);
        assert_eq!(collector.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unit_aborted_collector_keeps_partial_buffer() {
        let cache = SnapshotCache::new(counting(true));
        let gateway: Arc<dyn AdminGateway> = Arc::new(FakeGateway::new());

        cache.prime(gateway, |_| {}).await;

        let metrics = cache.replay().await;
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].descriptor.fq_name(), "mongodb_replstats_lag");
    }

    /// Emits one metric, then holds the run open until released.
    struct GatedCollector {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl Collector for GatedCollector {
        fn name(&self) -> &'static str {
            "gated"
        }
        async fn collect(&self, _gateway: &dyn AdminGateway, sink: &MetricSink) {
            sink.render(Family::ReplStats, "lag", 1.0, &[]);
            self.started.notify_one();
            self.release.notified().await;
            sink.render(Family::ReplRole, "role", 1.0, &["primary"]);
        }
    }

    #[tokio::test]
    async fn unit_replay_waits_for_prime() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let cache = Arc::new(SnapshotCache::new(Arc::new(GatedCollector { started: started.clone(), release: release.clone() })));
        let gateway: Arc<dyn AdminGateway> = Arc::new(FakeGateway::new());

        let priming = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.prime(gateway, |_| {}).await })
        };
        started.notified().await;

        let replaying = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.replay().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!replaying.is_finished(), "replay returned while prime was running");

        release.notify_one();
        priming.await.unwrap();
        let metrics = replaying.await.unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[1].descriptor.fq_name(), "mongodb_repl_role");
    }

    #[tokio::test]
    async fn unit_replay_before_prime_is_empty() {
        let cache = SnapshotCache::new(counting(false));
        assert!(cache.replay().await.is_empty());
    }
}
