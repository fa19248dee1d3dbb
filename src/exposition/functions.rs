//! The impls and functions
//!
use anyhow::{Context, Result};
use itertools::Itertools;
use prometheus::{proto, Encoder, TextEncoder};
use crate::schema::{MetricInstance, ValueKind};

fn metric(instance: &MetricInstance) -> proto::Metric
{
    let mut metric = proto::Metric::default();
    for (name, value) in instance.descriptor.label_names.iter().zip(instance.label_values.iter()) {
        let mut label = proto::LabelPair::default();
        label.set_name(name.to_string());
        label.set_value(value.clone());
        metric.mut_label().push(label);
    }
    match instance.descriptor.kind {
        ValueKind::Counter => {
            let mut counter = proto::Counter::default();
            counter.set_value(instance.value);
            metric.set_counter(counter);
        }
        ValueKind::Gauge => {
            let mut gauge = proto::Gauge::default();
            gauge.set_value(instance.value);
            metric.set_gauge(gauge);
        }
    }
    metric
}

/// Group the metric instances into metric families, ordered by name.
/// Within a family, the instances keep the order in which they were collected.
pub fn metric_families(instances: &[MetricInstance]) -> Vec<proto::MetricFamily>
{
    instances
        .iter()
        .sorted_by_key(|instance| instance.descriptor.fq_name())
        .group_by(|instance| instance.descriptor.fq_name())
        .into_iter()
        .map(|(name, group)| {
            let mut group = group.peekable();
            let mut family = proto::MetricFamily::default();
            family.set_name(name);
            if let Some(first) = group.peek() {
                family.set_help(first.descriptor.help.to_string());
                family.set_field_type(match first.descriptor.kind {
                    ValueKind::Counter => proto::MetricType::COUNTER,
                    ValueKind::Gauge => proto::MetricType::GAUGE,
                });
            }
            for instance in group {
                family.mut_metric().push(metric(instance));
            }
            family
        })
        .collect()
}

/// Encode the metric instances in the prometheus text format.
pub fn encode_text(instances: &[MetricInstance]) -> Result<String>
{
    let families = metric_families(instances);
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&families, &mut buffer)
        .with_context(|| format!("Error encoding {} metric families", families.len()))?;
    String::from_utf8(buffer).with_context(|| "Error converting the encoded metrics to text")
}
