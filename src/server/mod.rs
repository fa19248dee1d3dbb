//! Module for the web server.
//!
//! `/` serves a landing page, the telemetry path (`/metrics` by default) serves a scrape.
//! The scrape timeout is taken from the `X-Prometheus-Scrape-Timeout-Seconds` header, and collectors
//! can be selected with repeated `collect[]` query parameters:
//!
//! ```text
//! curl -H 'X-Prometheus-Scrape-Timeout-Seconds: 10' 'http://localhost:9100/metrics?collect[]=replicasetstatus&collect[]=oplogstatus'
//! ```
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
