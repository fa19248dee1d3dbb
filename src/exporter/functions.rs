//! The impls and functions
//!
use std::{collections::BTreeSet, sync::Arc, time::{Duration, Instant}};
use anyhow::{bail, Context, Result};
use log::*;
use crate::currentop::CurrentOpCollector;
use crate::exporter::{CollectorKind, Enablement, Exporter, Topology};
use crate::exposition::encode_text;
use crate::gateway::{AdminGateway, Connector, ShellGateway};
use crate::instance::{CmdLineOpts, Hello, InstanceCollector, SnapshotAllocationCollector};
use crate::oplog::OplogCollector;
use crate::replication::ReplicationCollector;
use crate::rollback::RollbackCollector;
use crate::sharding::ShardingCollector;
use crate::snapshot::{Collector, SnapshotCache};
use crate::top::TopCollector;
use crate::utility::is_localhost_uri;
use crate::{Opts, CONNECT_RETRY_SECS, DEFAULT_SCRAPE_TIMEOUT_SECS};

/// The programs the snapshot allocation collector runs.
const SNAPSHOT_PROGRAMS: [&str; 3] = ["df", "lvs", "sudo"];

impl CollectorKind {
    pub const ALL: [CollectorKind; 8] = [
        CollectorKind::ReplicaSetStatus,
        CollectorKind::TopMetrics,
        CollectorKind::CurrentOpMetrics,
        CollectorKind::OplogStatus,
        CollectorKind::ShardStats,
        CollectorKind::LvmSnapshotStats,
        CollectorKind::RollbackStats,
        CollectorKind::InstanceMetrics,
    ];
    /// The name used in the `collect[]` query parameter.
    pub fn query_name(&self) -> &'static str
    {
        match self {
            CollectorKind::ReplicaSetStatus => "replicasetstatus",
            CollectorKind::TopMetrics => "topmetrics",
            CollectorKind::CurrentOpMetrics => "currentopmetrics",
            CollectorKind::OplogStatus => "oplogstatus",
            CollectorKind::ShardStats => "shardstats",
            CollectorKind::LvmSnapshotStats => "lvmsnapshotstats",
            CollectorKind::RollbackStats => "rollbackstats",
            CollectorKind::InstanceMetrics => "instancemetrics",
        }
    }
    pub fn from_query_name(name: &str) -> Option<CollectorKind>
    {
        CollectorKind::ALL.into_iter().find(|kind| kind.query_name() == name)
    }
}

impl Enablement {
    pub fn new() -> Self { Default::default() }
    /// The collectors enabled with `--collector.<name>` flags, or all of them with `--collect-all`.
    pub fn from_opts(opts: &Opts) -> Self
    {
        if opts.collect_all {
            return Enablement { enabled: CollectorKind::ALL.into_iter().collect() };
        }
        let flags = [
            (CollectorKind::ReplicaSetStatus, opts.collector_replicasetstatus),
            (CollectorKind::TopMetrics, opts.collector_topmetrics),
            (CollectorKind::CurrentOpMetrics, opts.collector_currentopmetrics),
            (CollectorKind::OplogStatus, opts.collector_oplogstats),
            (CollectorKind::ShardStats, opts.collector_shardstats),
            (CollectorKind::LvmSnapshotStats, opts.collector_lvmsnapshotstats),
            (CollectorKind::RollbackStats, opts.collector_rollbackstats),
            (CollectorKind::InstanceMetrics, opts.collector_instance),
        ];
        Enablement {
            enabled: flags.into_iter().filter(|(_, enabled)| *enabled).map(|(kind, _)| kind).collect(),
        }
    }
    pub fn is_enabled(&self, kind: CollectorKind) -> bool
    {
        self.enabled.contains(&kind)
    }
    pub fn disable(
        &mut self,
        kind: CollectorKind,
        reason: &str,
    )
    {
        if self.enabled.remove(&kind) {
            warn!("Disabling {} because {}", kind.query_name(), reason);
        }
    }
    /// The collectors for a scrape: the requested collectors that are enabled.
    /// Unknown names are ignored; no names at all means all enabled collectors.
    pub fn for_request(&self, filters: &[String]) -> Enablement
    {
        if filters.is_empty() {
            return self.clone();
        }
        let requested: BTreeSet<CollectorKind> = filters
            .iter()
            .filter_map(|filter| {
                let kind = CollectorKind::from_query_name(filter);
                if kind.is_none() {
                    debug!("ignoring unknown collector in collect[]: {}", filter);
                }
                kind
            })
            .collect();
        Enablement {
            enabled: self.enabled.intersection(&requested).copied().collect(),
        }
    }
    pub fn names(&self) -> Vec<&'static str>
    {
        self.enabled.iter().map(|kind| kind.query_name()).collect()
    }
}

impl Topology {
    pub async fn detect(gateway: &dyn AdminGateway) -> Result<Self>
    {
        let hello = Hello::read(gateway)
            .await
            .with_context(|| "Failed to get hello result")?;
        let cmd_line_opts = CmdLineOpts::read(gateway)
            .await
            .with_context(|| "Failed to get command line options")?;
        let topology = Topology {
            is_mongos: hello.is_mongos(),
            is_arbiter: hello.arbiter_only,
            is_config_server: cmd_line_opts.is_config_server(),
            slow_ms: cmd_line_opts.slow_ms(),
        };
        info!(
            "topology of {} (replica set {}): {:?}",
            hello.me.as_deref().unwrap_or("standalone"),
            hello.set_name.as_deref().unwrap_or("none"),
            topology,
        );
        Ok(topology)
    }
}

/// Disable the collectors that cannot work against this server or on this host.
/// Snapshot allocation against the local host without a backup directory is an error.
pub fn validate(
    mut enablement: Enablement,
    topology: &Topology,
    uri: &str,
    lvm_backup_dir: Option<&str>,
    shell: &dyn ShellGateway,
) -> Result<Enablement>
{
    let is_localhost = is_localhost_uri(uri);
    if !is_localhost {
        enablement.disable(CollectorKind::LvmSnapshotStats, "it is not supported for a remote MongoDB");
        enablement.disable(CollectorKind::RollbackStats, "it is not supported for a remote MongoDB");
    }

    if topology.is_arbiter {
        for kind in CollectorKind::ALL.into_iter().filter(|kind| *kind != CollectorKind::ReplicaSetStatus) {
            enablement.disable(kind, "this is an arbiter");
        }
    }
    if topology.is_mongos {
        for kind in [
            CollectorKind::LvmSnapshotStats,
            CollectorKind::RollbackStats,
            CollectorKind::OplogStatus,
            CollectorKind::CurrentOpMetrics,
            CollectorKind::TopMetrics,
        ] {
            enablement.disable(kind, "this is a mongos");
        }
    }
    if !topology.is_config_server {
        enablement.disable(CollectorKind::ShardStats, "this is not a config server");
    }

    if enablement.is_enabled(CollectorKind::LvmSnapshotStats) {
        if let Some(program) = SNAPSHOT_PROGRAMS.iter().find(|program| !shell.has_program(program)) {
            enablement.disable(CollectorKind::LvmSnapshotStats, &format!("{} cannot be found in PATH", program));
        }
    }
    if is_localhost
        && enablement.is_enabled(CollectorKind::LvmSnapshotStats)
        && lvm_backup_dir.map_or(true, |dir| dir.is_empty())
    {
        bail!("--lvm-backup-dir must be set for snapshot allocation metrics of a local MongoDB");
    }

    Ok(enablement)
}

/// The time a scrape may take: the prometheus scrape timeout header (10 seconds without it)
/// minus the offset, and at least one second.
pub fn scrape_timeout(
    header: Option<&str>,
    offset: f64,
) -> Duration
{
    let seconds = header
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
        .unwrap_or(DEFAULT_SCRAPE_TIMEOUT_SECS);
    Duration::from_secs_f64((seconds - offset).max(1.0))
}

/// Connect, retrying every few seconds until the server answers.
pub async fn connect_with_retry(connector: &dyn Connector) -> Arc<dyn AdminGateway>
{
    loop {
        let deadline = tokio::time::Instant::now() + Duration::from_secs_f64(DEFAULT_SCRAPE_TIMEOUT_SECS);
        match connector.connect(deadline).await {
            Ok(gateway) => return gateway,
            Err(error) => {
                error!("Cannot connect to MongoDB: {:#}", error);
                tokio::time::sleep(Duration::from_secs(CONNECT_RETRY_SECS)).await;
            }
        }
    }
}

impl Exporter {
    /// An exporter for a known topology, without startup validation.
    pub fn new(
        connector: Arc<dyn Connector>,
        shell: Arc<dyn ShellGateway>,
        enablement: Enablement,
        topology: Topology,
    ) -> Self
    {
        Exporter {
            connector,
            shell,
            enablement,
            topology,
            lvm_backup_dir: String::new(),
            timeout_offset: 1.0,
        }
    }
    /// Connect, detect the topology and validate the enabled collectors.
    pub async fn start(
        opts: &Opts,
        connector: Arc<dyn Connector>,
        shell: Arc<dyn ShellGateway>,
    ) -> Result<Self>
    {
        info!("begin start");
        let timer = Instant::now();

        let timeout_offset = if opts.timeout_offset > 0.0 {
            opts.timeout_offset
        } else {
            warn!("Timeout offset needs to be greater than 0, falling back to 1");
            1.0
        };

        let gateway = connect_with_retry(connector.as_ref()).await;
        let topology = Topology::detect(gateway.as_ref()).await?;
        let enablement = validate(
            Enablement::from_opts(opts),
            &topology,
            &opts.mongodb_uri,
            opts.lvm_backup_dir.as_deref(),
            shell.as_ref(),
        ).with_context(|| "Failed to validate options")?;
        info!("enabled collectors: {:?}", enablement.names());

        info!("end start: {:?}", timer.elapsed());
        Ok(Exporter {
            connector,
            shell,
            enablement,
            topology,
            lvm_backup_dir: opts.lvm_backup_dir.clone().unwrap_or_default(),
            timeout_offset,
        })
    }
    pub fn collector(&self, kind: CollectorKind) -> Arc<dyn Collector>
    {
        match kind {
            CollectorKind::ReplicaSetStatus => Arc::new(ReplicationCollector { is_mongos: self.topology.is_mongos }),
            CollectorKind::TopMetrics => Arc::new(TopCollector),
            CollectorKind::CurrentOpMetrics => Arc::new(CurrentOpCollector { slow_ms: self.topology.slow_ms }),
            CollectorKind::OplogStatus => Arc::new(OplogCollector),
            CollectorKind::ShardStats => Arc::new(ShardingCollector),
            CollectorKind::LvmSnapshotStats => Arc::new(SnapshotAllocationCollector {
                shell: self.shell.clone(),
                backup_dir: self.lvm_backup_dir.clone(),
            }),
            CollectorKind::RollbackStats => Arc::new(RollbackCollector { shell: self.shell.clone() }),
            CollectorKind::InstanceMetrics => Arc::new(InstanceCollector),
        }
    }
    /// A fresh snapshot cache for every collector of the scrape.
    pub fn sources(&self, filters: &[String]) -> Vec<SnapshotCache>
    {
        self.enablement
            .for_request(filters)
            .enabled
            .into_iter()
            .map(|kind| SnapshotCache::new(self.collector(kind)))
            .collect()
    }
    /// Run a scrape and return the metrics in the prometheus text format.
    ///
    /// Failing commands only leave out their metrics. Not being able to connect fails the scrape.
    pub async fn scrape(
        &self,
        filters: &[String],
        timeout: Duration,
    ) -> Result<String>
    {
        info!("begin scrape");
        let timer = Instant::now();

        let deadline = tokio::time::Instant::now() + timeout;
        let sources = self.sources(filters);
        let gateway = self.connector.connect(deadline).await?;

        let mut described = BTreeSet::new();
        for source in &sources {
            source.prime(gateway.clone(), |descriptor| {
                described.insert(descriptor.fq_name());
            }).await;
        }
        let mut instances = Vec::new();
        for source in &sources {
            instances.extend(source.replay().await);
        }
        debug!("scrape: {} metric names: {:?}", described.len(), described);
        let text = encode_text(&instances)?;

        info!("end scrape: {} sources, {} metrics, {:?}", sources.len(), instances.len(), timer.elapsed());
        Ok(text)
    }
}
