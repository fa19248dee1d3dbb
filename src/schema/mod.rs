//! Module for the metric schema registry.
//!
//! Every metric the exporter produces is described once here: the family it belongs to,
//! the field name, the help text, the label names and whether it is a counter or a gauge.
//! The exposed prometheus name is `<family prefix>_<field>`, for example `mongodb_replstats_lag`.
//!
//! The registry is built once, on first use, and never changes afterwards.
//! Collectors never construct a metric by hand: they pass a family, a field, a value
//! and the label values to [SchemaRegistry::render].
//!
mod structs;
mod table;
mod functions;

pub use structs::*;
pub use functions::*;
