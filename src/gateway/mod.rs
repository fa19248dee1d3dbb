//! Module for the gateways to the outside world.
//!
//! - [AdminGateway]: runs administrative commands, finds and aggregations against MongoDB.
//!   [MongoGateway] implements it with the official driver, bounding every call by the scrape deadline.
//! - [Connector]: hands out an [AdminGateway] for a scrape, either from one global client or from a new client.
//! - [ShellGateway]: directory checks and external utilities on the local host, implemented by [OsShell].
//!
//! The collectors only see the traits, which makes it possible to test them with the fakes in `fake`.
//!
mod structs;
mod functions;
#[cfg(test)]
pub mod fake;

pub use structs::*;
pub use functions::*;
