//! The structs
//!
use std::sync::Arc;
use crate::exporter::Exporter;

#[derive(Clone)]
pub struct ServerState {
    pub exporter: Arc<Exporter>,
    pub telemetry_path: String,
}
