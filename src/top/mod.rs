//! Module for the `top` usage statistics.
//!
//! `top` reports the time spent and the number of operations per namespace since the server started,
//! split into insert, queries, update, remove, getmore and commands. These are exposed as counters
//! `mongodb_top_<operation>_time` and `mongodb_top_<operation>_count` per database and collection.
//! The namespaces of the admin, config and local databases are skipped.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
