//! Module for the exporter: the set of collectors and the scrape.
//!
//! At startup the exporter connects (retrying until the server answers), detects the topology with `hello`
//! and `getCmdLineOpts`, and disables the collectors that do not fit the topology:
//! - an arbiter keeps only the replica set status.
//! - a mongos has no oplog, current operations, top, rollback or snapshot metrics.
//! - sharding metrics need a config server.
//! - rollback and snapshot metrics need the server on the local host, snapshot metrics also need `df`, `lvs` and `sudo`.
//!
//! A scrape selects collectors with the `collect[]` query parameter (or takes all enabled collectors), connects,
//! primes a fresh snapshot cache per collector, and encodes what the caches replay.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
