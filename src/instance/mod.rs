//! Module for the instance level information.
//!
//! - `hello` and `getCmdLineOpts`: the topology of the instance (mongos, arbiter, cluster role),
//!   the slow operation threshold and the data directory. These are used to validate the collectors
//!   at startup, and by the current operation and rollback collectors.
//! - `buildinfo`: `mongodb_instance_version`, the major.minor version as a number.
//! - LVM: `mongodb_system_snapshot_allocation`, the data allocation of the LVM snapshot volume
//!   when the backup directory is mounted. This uses `df` and `sudo -n lvs` on the local host.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
