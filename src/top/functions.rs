//! The impls and functions
//!
use std::time::Instant;
use async_trait::async_trait;
use log::*;
use mongodb::bson::{doc, Bson};
use crate::gateway::{decode, AdminGateway, GatewayError};
use crate::schema::Family;
use crate::snapshot::{Collector, MetricSink};
use crate::top::{NamespaceUsage, TopCollector, TopResponse, TopUsage};
use crate::utility::{is_internal_database_namespace, split_namespace};

impl NamespaceUsage {
    pub fn fields(&self) -> Vec<(&'static str, f64)>
    {
        vec![
            ("insert_count", self.insert.count as f64),
            ("insert_time", self.insert.time as f64),
            ("queries_count", self.queries.count as f64),
            ("queries_time", self.queries.time as f64),
            ("update_count", self.update.count as f64),
            ("update_time", self.update.time as f64),
            ("remove_count", self.remove.count as f64),
            ("remove_time", self.remove.time as f64),
            ("getmore_count", self.getmore.count as f64),
            ("getmore_time", self.getmore.time as f64),
            ("commands_count", self.commands.count as f64),
            ("commands_time", self.commands.time as f64),
        ]
    }
}

impl TopUsage {
    pub fn new() -> Self { Default::default() }
    /// The usage per namespace, without `note` and without the internal databases.
    pub fn from_response(response: TopResponse) -> Result<Self, GatewayError>
    {
        let mut usage = TopUsage::new();
        for (namespace, value) in response.totals {
            if namespace == "note" || is_internal_database_namespace(&namespace) {
                continue;
            }
            match value {
                Bson::Document(document) => {
                    let namespace_usage: NamespaceUsage = decode(document, "top")?;
                    usage.namespaces.insert(namespace, namespace_usage);
                }
                other => debug!("top: skipping {} of type {:?}", namespace, other.element_type()),
            }
        }
        Ok(usage)
    }
    pub fn emit(&self, sink: &MetricSink)
    {
        for (namespace, namespace_usage) in &self.namespaces {
            let (database, collection) = split_namespace(namespace);
            sink.render_fields(Family::Top, &namespace_usage.fields(), &[database.as_str(), collection.as_str()]);
        }
    }
}

impl TopCollector {
    pub async fn read_usage(gateway: &dyn AdminGateway) -> Result<TopUsage, GatewayError>
    {
        let response: TopResponse = decode(gateway.run_command("admin", doc! { "top": 1 }).await?, "top")?;
        TopUsage::from_response(response)
    }
}

#[async_trait]
impl Collector for TopCollector {
    fn name(&self) -> &'static str
    {
        "topmetrics"
    }
    async fn collect(
        &self,
        gateway: &dyn AdminGateway,
        sink: &MetricSink,
    )
    {
        info!("begin top");
        let timer = Instant::now();

        match TopCollector::read_usage(gateway).await {
            Ok(usage) => usage.emit(sink),
            Err(error) => error!("Failed to get top command: {}", error),
        }

        info!("end top: {:?}", timer.elapsed());
    }
}
