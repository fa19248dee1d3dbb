//! Module for the replica set status metrics.
//!
//! The replica set status is read with `replSetGetStatus`, the member configuration with `replSetGetConfig`.
//! From these, the following is derived for the member the exporter is connected to:
//! - `mongodb_repl_role`: primary, secondary or other.
//! - `mongodb_replstats_*`: heartbeat delay, lag, odd state, seconds since election,
//!   own state, and the config version, term, protocol version and member settings.
//!
//! On a mongos there is no replica set, and only the role indicator is reported, with role "other".
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
