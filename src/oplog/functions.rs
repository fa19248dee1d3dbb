//! The impls and functions
//!
use std::time::Instant;
use async_trait::async_trait;
use log::*;
use mongodb::bson::{doc, Document};
use crate::gateway::{decode, AdminGateway, GatewayError};
use crate::oplog::{CollectionSize, OplogCollector, OplogEntry, OplogWindow};
use crate::schema::Family;
use crate::snapshot::{Collector, MetricSink};

const LOCAL: &str = "local";
const OPLOG: &str = "oplog.rs";
const MB: i32 = 1024 * 1024;

impl OplogWindow {
    /// Seconds between the first and the last entry.
    pub fn time_diff(&self) -> i64
    {
        self.last_ts as i64 - self.first_ts as i64
    }
    pub fn fields(&self) -> Vec<(&'static str, f64)>
    {
        vec![
            ("logSizeMB", self.log_size_mb),
            ("usedMB", self.used_mb),
            ("timeDiff", self.time_diff() as f64),
            ("firstTs", self.first_ts as f64),
            ("lastTs", self.last_ts as f64),
        ]
    }
}

impl OplogCollector {
    pub async fn read_size(gateway: &dyn AdminGateway) -> Result<CollectionSize, GatewayError>
    {
        decode(gateway.run_command(LOCAL, doc! { "collStats": OPLOG, "scale": MB }).await?, "collStats oplog.rs")
    }
    /// The timestamp (seconds) of the first entry in `sort` order.
    pub async fn read_timestamp(
        gateway: &dyn AdminGateway,
        sort: Document,
    ) -> anyhow::Result<u32>
    {
        let entries = gateway.find(LOCAL, OPLOG, doc! {}, Some(sort), Some(1)).await?;
        match entries.into_iter().next() {
            Some(entry) => Ok(decode::<OplogEntry>(entry, "local.oplog.rs")?.ts.time),
            None => anyhow::bail!("objects not found in local.oplog.rs, is this a new and empty instance?"),
        }
    }
    pub async fn read_window(gateway: &dyn AdminGateway) -> anyhow::Result<OplogWindow>
    {
        let size = OplogCollector::read_size(gateway).await?;
        let first_ts = OplogCollector::read_timestamp(gateway, doc! { "$natural": 1 }).await?;
        let last_ts = OplogCollector::read_timestamp(gateway, doc! { "$natural": -1 }).await?;
        Ok(OplogWindow {
            log_size_mb: size.max_size,
            used_mb: size.size,
            first_ts,
            last_ts,
        })
    }
}

#[async_trait]
impl Collector for OplogCollector {
    fn name(&self) -> &'static str
    {
        "oplogstatus"
    }
    async fn collect(
        &self,
        gateway: &dyn AdminGateway,
        sink: &MetricSink,
    )
    {
        info!("begin oplog");
        let timer = Instant::now();

        match OplogCollector::read_window(gateway).await {
            Ok(window) => sink.render_fields(Family::Oplog, &window.fields(), &[]),
            Err(error) => error!("Failed to get oplog window: {:#}", error),
        }

        info!("end oplog: {:?}", timer.elapsed());
    }
}
