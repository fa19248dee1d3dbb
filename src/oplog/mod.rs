//! Module for the oplog window metrics.
//!
//! The size of `local.oplog.rs` is read with `collStats`, scaled to MB, and the timestamps of the first
//! and the last entry with a natural order find. The difference between the two timestamps is the
//! oplog window in seconds.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
