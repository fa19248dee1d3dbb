//! Module with helpers shared by the collectors and the exporter.
//!
//! - namespace handling: splitting `database.collection`, recognising system namespaces.
//! - connection string inspection: the hosts in a MongoDB URI, and whether they are all local.
//! - the listen address for the web server.
//!
mod functions;

pub use functions::*;
