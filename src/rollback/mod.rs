//! Module for the rollback directory metrics.
//!
//! When a member rolls back, the documents it had to undo are written to `<dbPath>/rollback/<collection uuid>/`.
//! The collector lists the collection uuids in the rollback directory, resolves every uuid to its namespace
//! using `listDatabases` and `listCollections`, and reports `mongodb_system_rollback_directory` with value 1
//! per namespace. A uuid that cannot be resolved is reported under `unknown.unknown`.
//!
//! There is no rollback directory on a member that never rolled back, which is reported as no metrics at all.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
