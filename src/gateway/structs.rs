//! The traits and structs
//!
use std::{path::Path, sync::Arc, time::Duration};
use async_trait::async_trait;
use mongodb::{bson::Document, Client};
use tokio::{sync::Mutex, time::Instant};

/// The typed failures of the admin command gateway.
///
/// None of these abort a scrape: the collector that gets one logs it and skips the metrics
/// the failing command would have produced.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{what} failed: {source}")]
    Command {
        what: String,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("{what} did not finish before the scrape deadline")]
    Timeout {
        what: String,
    },
    #[error("cannot decode the response of {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: mongodb::bson::de::Error,
    },
    #[error("unexpected identifier encoding for {namespace}: {found}")]
    UnexpectedIdentifier {
        namespace: String,
        found: String,
    },
}

/// Administrative access to a MongoDB instance.
#[async_trait]
pub trait AdminGateway: Send + Sync {
    /// Run a database command, for example `{ replSetGetStatus: 1 }` against `admin`.
    async fn run_command(
        &self,
        database: &str,
        command: Document,
    ) -> Result<Document, GatewayError>;
    /// Find documents in a collection, optionally sorted and limited.
    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        sort: Option<Document>,
        limit: Option<i64>,
    ) -> Result<Vec<Document>, GatewayError>;
    /// Run an aggregation pipeline on a collection, or on the database when there is no collection
    /// (which is what `$currentOp` requires).
    async fn aggregate(
        &self,
        database: &str,
        collection: Option<&str>,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, GatewayError>;
}

/// Hands out the gateway a scrape uses.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        deadline: Instant,
    ) -> anyhow::Result<Arc<dyn AdminGateway>>;
}

/// Local host access for the rollback and LVM snapshot collectors.
pub trait ShellGateway: Send + Sync {
    fn dir_exists(&self, path: &Path) -> bool;
    /// The names of the entries in a directory.
    fn list_dir(&self, path: &Path) -> anyhow::Result<Vec<String>>;
    /// Run a program and return its standard output.
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<String>;
    /// True when the program can be found in PATH.
    fn has_program(&self, program: &str) -> bool;
}

/// The [AdminGateway] on top of a driver client.
/// Every call made through it must finish before `deadline`.
#[derive(Debug, Clone)]
pub struct MongoGateway {
    pub(crate) client: Client,
    pub(crate) deadline: Instant,
}

/// The settings needed to create a client.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub uri: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub direct_connect: bool,
    pub connect_timeout: Duration,
}

/// The [Connector] for MongoDB.
///
/// With a global pool, the client is created by the first scrape that can connect and reused afterwards.
/// Without it, every scrape gets a new client that is dropped when the scrape ends.
#[derive(Debug)]
pub struct MongoConnector {
    pub(crate) settings: ConnectionSettings,
    pub(crate) global: Option<Mutex<Option<Client>>>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsShell;
