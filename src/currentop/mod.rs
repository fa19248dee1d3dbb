//! Module for the slow running operation metrics.
//!
//! The operations are read with a `$currentOp` aggregation on the admin database, which already
//! filters on operations running longer than slowms, on client connections, and on non system namespaces.
//! Index builds are dropped afterwards, and the remaining operations are counted per namespace
//! (`mongodb_process_*{database, collection}`) and in total (`mongodb_process_*_total`).
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
