//! Module for the text exposition of the metrics of a scrape.
//!
//! The metric instances of all sources are grouped into prometheus metric families by metric name,
//! with the help text and type of their descriptor, and encoded in the prometheus text format.
//!
mod functions;

pub use functions::*;
