//! The impls and functions
//!
use std::collections::{HashMap, HashSet};
use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use crate::schema::{Family, MetricDescriptor, MetricInstance, SchemaRegistry};
use crate::schema::table::DESCRIPTORS;

/// The process wide registry.
pub static SCHEMA: Lazy<SchemaRegistry> = Lazy::new(|| SchemaRegistry::from_table(DESCRIPTORS));

static METRIC_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").unwrap());
static LABEL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap());

impl Family {
    pub fn prefix(&self) -> &'static str
    {
        match self {
            Family::ReplStats => "mongodb_replstats",
            Family::ReplRole => "mongodb_repl",
            Family::Oplog => "mongodb_oplogstats",
            Family::Process => "mongodb_process",
            Family::Config => "mongodb_config",
            Family::System => "mongodb_system",
            Family::Instance => "mongodb_instance",
            Family::Top => "mongodb_top",
        }
    }
}

impl MetricDescriptor {
    /// The exposed metric name.
    pub fn fq_name(&self) -> String
    {
        format!("{}_{}", self.family.prefix(), self.field)
    }
}

impl SchemaRegistry {
    pub fn from_table(descriptors: &'static [MetricDescriptor]) -> Self
    {
        let index: HashMap<(Family, &'static str), &'static MetricDescriptor> = descriptors
            .iter()
            .map(|descriptor| ((descriptor.family, descriptor.field), descriptor))
            .collect();
        SchemaRegistry { descriptors, index }
    }
    pub fn lookup(
        &self,
        family: Family,
        field: &str,
    ) -> Option<&'static MetricDescriptor>
    {
        self.index.get(&(family, field)).copied()
    }
    pub fn descriptors(&self) -> &'static [MetricDescriptor]
    {
        self.descriptors
    }
    /// Create a metric instance.
    ///
    /// A field without a descriptor, or a label value count that does not match the descriptor,
    /// is a bug in the collector and panics. [SchemaRegistry::validate] and the unit tests
    /// of every collector are there to catch this before a scrape ever does.
    pub fn render(
        &self,
        family: Family,
        field: &str,
        value: f64,
        label_values: &[&str],
    ) -> MetricInstance
    {
        let descriptor = self
            .lookup(family, field)
            .unwrap_or_else(|| panic!("no metric descriptor for {}_{}", family.prefix(), field));
        assert_eq!(
            descriptor.label_names.len(),
            label_values.len(),
            "label values for {} do not match label names {:?}",
            descriptor.fq_name(),
            descriptor.label_names,
        );
        MetricInstance {
            descriptor,
            value,
            label_values: label_values.iter().map(|value| value.to_string()).collect(),
        }
    }
    /// Check the descriptor table: unique (family, field) keys, valid metric and label names,
    /// and non-empty help text. This runs at startup.
    pub fn validate(&self) -> Result<()>
    {
        let mut problems: Vec<String> = Vec::new();
        let mut seen: HashSet<(Family, &str)> = HashSet::new();

        for descriptor in self.descriptors {
            let name = descriptor.fq_name();
            if !seen.insert((descriptor.family, descriptor.field)) {
                problems.push(format!("duplicate descriptor {}", name));
            }
            if descriptor.field.is_empty() || !METRIC_NAME.is_match(&name) {
                problems.push(format!("invalid metric name {}", name));
            }
            if descriptor.help.trim().is_empty() {
                problems.push(format!("empty help text for {}", name));
            }
            let mut labels: HashSet<&str> = HashSet::new();
            for label in descriptor.label_names {
                if !LABEL_NAME.is_match(label) || label.starts_with("__") {
                    problems.push(format!("invalid label name {} for {}", label, name));
                }
                if !labels.insert(label) {
                    problems.push(format!("duplicate label name {} for {}", label, name));
                }
            }
        }

        if !problems.is_empty() {
            bail!("metric schema is invalid: {}", problems.join(", "));
        }
        Ok(())
    }
}
