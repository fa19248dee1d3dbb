//! The impls and functions
//!
use std::time::Instant;
use anyhow::Result;
use async_trait::async_trait;
use log::*;
use mongodb::bson::doc;
use crate::gateway::{decode, AdminGateway, GatewayError, ShellGateway};
use crate::instance::{BuildInfo, CmdLineOpts, Hello, InstanceCollector, SnapshotAllocationCollector};
use crate::schema::Family;
use crate::snapshot::{Collector, MetricSink};
use crate::{DEFAULT_DB_PATH, DEFAULT_SLOW_MS};

impl Hello {
    pub async fn read(gateway: &dyn AdminGateway) -> Result<Self, GatewayError>
    {
        decode(gateway.run_command("admin", doc! { "hello": 1 }).await?, "hello")
    }
    /// A mongos identifies itself with `msg: "isdbgrid"`.
    pub fn is_mongos(&self) -> bool
    {
        self.msg.as_deref() == Some("isdbgrid")
    }
}

impl CmdLineOpts {
    pub async fn read(gateway: &dyn AdminGateway) -> Result<Self, GatewayError>
    {
        decode(gateway.run_command("admin", doc! { "getCmdLineOpts": 1 }).await?, "getCmdLineOpts")
    }
    pub fn slow_ms(&self) -> i64
    {
        self.parsed.operation_profiling.slow_op_threshold_ms.unwrap_or(DEFAULT_SLOW_MS)
    }
    pub fn db_path(&self) -> &str
    {
        self.parsed.storage.db_path.as_deref().filter(|path| !path.is_empty()).unwrap_or(DEFAULT_DB_PATH)
    }
    pub fn is_config_server(&self) -> bool
    {
        self.parsed.sharding.cluster_role.as_deref() == Some("configsvr")
    }
}

/// The major and minor version as a number: `6.0.5` becomes 6.0.
pub fn parse_major_minor(version: &str) -> Option<f64>
{
    let mut parts = version.split('.');
    let major = parts.next()?;
    let minor = parts.next()?;
    format!("{}.{}", major, minor).parse::<f64>().ok()
}

/// True when a line of `df` output ends with the mount point.
///
/// ```text
/// Filesystem                 1K-blocks     Used Available Use% Mounted on
/// /dev/mapper/vg0-lv_data    104806400 52403200  52403200  50% /data
/// /dev/mapper/vg0-snap_data   10475520  1047552   9427968  10% /backup
/// ```
pub fn mount_listed(
    df_output: &str,
    mount_point: &str,
) -> bool
{
    df_output.lines().any(|line| line.trim_end().ends_with(mount_point))
}

/// The data allocation of the snapshot volume: the first row of `lvs` output with a positive number
/// in the sixth column, 0 when there is none.
///
/// ```text
///   LV        VG  Attr       LSize   Pool Origin  Data%  Meta%  Move Log Cpy%Sync Convert
///   lv_data   vg0 owi-aos--- 100.00g
///   snap_data vg0 swi-aos---  10.00g      lv_data 12.47
/// ```
pub fn parse_lvs_allocation(lvs_output: &str) -> f64
{
    lvs_output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(5))
        .filter(|column| column.chars().all(|character| character.is_ascii_digit() || character == '.'))
        .filter_map(|column| column.parse::<f64>().ok())
        .find(|allocation| *allocation > 0.0)
        .unwrap_or(0.0)
}

/// Read the snapshot allocation, 0 when the backup directory is not mounted.
pub fn read_snapshot_allocation(
    shell: &dyn ShellGateway,
    backup_dir: &str,
) -> Result<f64>
{
    let df_output = shell.run("df", &[])?;
    if !mount_listed(&df_output, backup_dir) {
        debug!("{} is not mounted", backup_dir);
        return Ok(0.0);
    }
    let lvs_output = shell.run("sudo", &["-n", "lvs"])?;
    Ok(parse_lvs_allocation(&lvs_output))
}

#[async_trait]
impl Collector for InstanceCollector {
    fn name(&self) -> &'static str
    {
        "instancemetrics"
    }
    async fn collect(
        &self,
        gateway: &dyn AdminGateway,
        sink: &MetricSink,
    )
    {
        let build_info: BuildInfo = match gateway.run_command("admin", doc! { "buildinfo": 1 }).await.and_then(|response| decode(response, "buildinfo")) {
            Ok(build_info) => build_info,
            Err(error) => {
                error!("Failed to get buildinfo: {}", error);
                return;
            }
        };
        match parse_major_minor(&build_info.version) {
            Some(version) => sink.render(Family::Instance, "version", version, &[]),
            None => error!("Failed to parse major version: {}", build_info.version),
        }
    }
}

#[async_trait]
impl Collector for SnapshotAllocationCollector {
    fn name(&self) -> &'static str
    {
        "lvmsnapshotstats"
    }
    async fn collect(
        &self,
        _gateway: &dyn AdminGateway,
        sink: &MetricSink,
    )
    {
        info!("begin snapshot allocation");
        let timer = Instant::now();

        let shell = self.shell.clone();
        let backup_dir = self.backup_dir.clone();
        match tokio::task::spawn_blocking(move || read_snapshot_allocation(shell.as_ref(), &backup_dir)).await {
            Ok(Ok(allocation)) => sink.render(Family::System, "snapshot_allocation", allocation, &[]),
            Ok(Err(error)) => error!("Failed to get snapshot allocated size: {:#}", error),
            Err(error) => error!("Failed to get snapshot allocated size: {}", error),
        }

        info!("end snapshot allocation: {:?}", timer.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::gateway::fake::{FakeGateway, FakeShell};
    use crate::snapshot::SnapshotCache;

    const DF: &str = "Filesystem                 1K-blocks     Used Available Use% Mounted on
/dev/mapper/vg0-lv_data    104806400 52403200  52403200  50% /data
/dev/mapper/vg0-snap_data   10475520  1047552   9427968  10% /backup
tmpfs                        1631508        0   1631508   0% /run/user/1000
";

    const LVS: &str = "  LV        VG  Attr       LSize   Pool Origin  Data%  Meta%  Move Log Cpy%Sync Convert
  lv_data   vg0 owi-aos--- 100.00g
  lv_root   vg0 -wi-ao----  20.00g
  snap_data vg0 swi-aos---  10.00g      lv_data 12.47
";

    #[test]
    fn unit_parse_hello() {
        let hello: Hello = decode(doc! { "isWritablePrimary": true, "msg": "isdbgrid", "maxWireVersion": 17, "ok": 1.0 }, "hello").unwrap();
        assert!(hello.is_mongos());
        assert!(!hello.arbiter_only);

        let hello: Hello = decode(doc! { "isWritablePrimary": false, "secondary": false, "arbiterOnly": true, "setName": "rs0", "ok": 1.0 }, "hello").unwrap();
        assert!(!hello.is_mongos());
        assert!(hello.arbiter_only);
        assert_eq!(hello.set_name.as_deref(), Some("rs0"));
    }

    #[test]
    fn unit_parse_cmd_line_opts() {
        let opts: CmdLineOpts = decode(doc! {
            "argv": ["mongod", "--config", "/etc/mongod.conf"],
            "parsed": {
                "config": "/etc/mongod.conf",
                "operationProfiling": { "slowOpThresholdMs": 200 },
                "replication": { "replSetName": "cfg" },
                "sharding": { "clusterRole": "configsvr" },
                "storage": { "dbPath": "/var/lib/mongo" },
            },
            "ok": 1.0,
        }, "getCmdLineOpts").unwrap();
        assert_eq!(opts.slow_ms(), 200);
        assert_eq!(opts.db_path(), "/var/lib/mongo");
        assert!(opts.is_config_server());

        let defaults: CmdLineOpts = decode(doc! { "argv": ["mongod"], "parsed": {}, "ok": 1.0 }, "getCmdLineOpts").unwrap();
        assert_eq!(defaults.slow_ms(), 100);
        assert_eq!(defaults.db_path(), "/data/db");
        assert!(!defaults.is_config_server());
    }

    #[test]
    fn unit_parse_major_minor() {
        assert_eq!(parse_major_minor("6.0.5"), Some(6.0));
        assert_eq!(parse_major_minor("4.4.19-ent"), Some(4.4));
        assert_eq!(parse_major_minor("7"), None);
        assert_eq!(parse_major_minor("x.y.z"), None);
    }

    #[test]
    fn unit_mount_listed() {
        assert!(mount_listed(DF, "/backup"));
        assert!(!mount_listed(DF, "/snapshots"));
    }

    #[test]
    fn unit_parse_lvs_allocation() {
        assert_eq!(parse_lvs_allocation(LVS), 12.47);
        assert_eq!(parse_lvs_allocation("  LV      VG  Attr       LSize\n  lv_data vg0 owi-aos--- 100.00g\n"), 0.0);
        assert_eq!(parse_lvs_allocation(""), 0.0);
    }

    #[test]
    fn unit_snapshot_allocation_not_mounted() {
        let shell = FakeShell::new().with_output("df", DF);
        assert_eq!(read_snapshot_allocation(&shell, "/snapshots").unwrap(), 0.0);
    }

    #[test]
    fn unit_snapshot_allocation_lvs_failure() {
        let shell = FakeShell::new().with_output("df", DF);
        assert!(read_snapshot_allocation(&shell, "/backup").is_err());
    }

    #[tokio::test]
    async fn unit_collect_snapshot_allocation() {
        let shell = FakeShell::new().with_output("df", DF).with_output("sudo -n lvs", LVS);
        let cache = SnapshotCache::new(Arc::new(SnapshotAllocationCollector { shell: Arc::new(shell), backup_dir: "/backup".to_string() }));
        cache.prime(Arc::new(FakeGateway::new()), |_| {}).await;
        let metrics = cache.replay().await;
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].descriptor.fq_name(), "mongodb_system_snapshot_allocation");
        assert_eq!(metrics[0].value, 12.47);
    }

    #[tokio::test]
    async fn unit_collect_instance_version() {
        let gateway = FakeGateway::new().with_command("admin", "buildinfo", doc! { "version": "6.0.5", "gitVersion": "c9a99c120371d4d4c52cbb15dac34a36ce8d3b1d", "ok": 1.0 });
        let cache = SnapshotCache::new(Arc::new(InstanceCollector));
        cache.prime(Arc::new(gateway), |_| {}).await;
        let metrics = cache.replay().await;
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].descriptor.fq_name(), "mongodb_instance_version");
        assert_eq!(metrics[0].value, 6.0);
    }
}
