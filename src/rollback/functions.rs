//! The impls and functions
//!
use std::{path::{Path, PathBuf}, sync::Arc, time::Instant};
use async_trait::async_trait;
use log::*;
use mongodb::bson::{doc, spec::BinarySubtype, Bson};
use uuid::Uuid;
use crate::gateway::{decode, AdminGateway, GatewayError, ShellGateway};
use crate::instance::CmdLineOpts;
use crate::rollback::{ListCollections, ListDatabases, ListedCollection, NamespaceDirectory, RollbackCollector, RollbackStatus};
use crate::schema::Family;
use crate::snapshot::{Collector, MetricSink};
use crate::utility::split_namespace;
use crate::UNKNOWN_NAMESPACE;

/// The canonical string form of a collection uuid, for example `5b2f3c1e-0001-0203-0405-060708090a0b`.
///
/// The uuid must be binary data of subtype 4 (or the legacy subtype 3) holding 16 bytes.
pub fn collection_uuid(
    namespace: &str,
    uuid: Option<&Bson>,
) -> Result<String, GatewayError>
{
    let unexpected = |found: String| GatewayError::UnexpectedIdentifier { namespace: namespace.to_string(), found };
    match uuid {
        Some(Bson::Binary(binary)) if matches!(binary.subtype, BinarySubtype::Uuid | BinarySubtype::UuidOld) => {
            Uuid::from_slice(&binary.bytes)
                .map(|uuid| uuid.to_string())
                .map_err(|_| unexpected(format!("binary uuid of {} bytes", binary.bytes.len())))
        }
        Some(Bson::Binary(binary)) => Err(unexpected(format!("binary of subtype {:?}", binary.subtype))),
        Some(other) => Err(unexpected(format!("{:?}", other.element_type()))),
        None => Err(unexpected("no uuid".to_string())),
    }
}

/// All collections of a database, following the cursor when the collections do not fit in the first batch.
async fn list_collections(
    gateway: &dyn AdminGateway,
    database: &str,
) -> Result<Vec<ListedCollection>, GatewayError>
{
    let response: ListCollections = decode(
        gateway.run_command(database, doc! { "listCollections": 1, "filter": { "type": "collection" } }).await?,
        "listCollections",
    )?;
    let mut cursor = response.cursor;
    let mut collections = std::mem::take(&mut cursor.first_batch);
    while cursor.id != 0 {
        let response: ListCollections = decode(
            gateway.run_command(database, doc! { "getMore": cursor.id, "collection": "$cmd.listCollections" }).await?,
            "getMore listCollections",
        )?;
        cursor = response.cursor;
        collections.append(&mut cursor.next_batch);
    }
    Ok(collections)
}

impl NamespaceDirectory {
    pub fn new() -> Self { Default::default() }
    /// Build the directory from every collection of every database.
    /// A collection uuid in an unexpected form fails the whole directory.
    pub async fn read(gateway: &dyn AdminGateway) -> Result<Self, GatewayError>
    {
        let databases: ListDatabases = decode(
            gateway.run_command("admin", doc! { "listDatabases": 1, "nameOnly": true }).await?,
            "listDatabases",
        )?;

        let mut directory = NamespaceDirectory::new();
        for database in databases.databases {
            for collection in list_collections(gateway, &database.name).await? {
                if collection.kind != "collection" {
                    continue;
                }
                let namespace = format!("{}.{}", database.name, collection.name);
                let uuid = collection_uuid(&namespace, collection.info.uuid.as_ref())?;
                directory.namespaces.insert(uuid, namespace);
            }
        }
        debug!("namespace directory: {} collections", directory.namespaces.len());
        Ok(directory)
    }
    pub fn resolve(&self, uuid: &str) -> Option<&str>
    {
        self.namespaces.get(uuid).map(String::as_str)
    }
}

impl RollbackStatus {
    pub fn new() -> Self { Default::default() }
    /// Map the rollback directory entries to their namespaces. An entry that is not a known
    /// collection uuid is logged and mapped to `unknown.unknown`.
    pub fn resolve(
        entries: &[String],
        directory: &NamespaceDirectory,
    ) -> Self
    {
        let mut status = RollbackStatus::new();
        for entry in entries.iter().map(|entry| entry.trim()).filter(|entry| !entry.is_empty()) {
            let namespace = match directory.resolve(entry) {
                Some(namespace) => namespace,
                None => {
                    warn!("Unknown collection UUID: {}", entry);
                    UNKNOWN_NAMESPACE
                }
            };
            status.namespaces.insert(namespace.to_string(), true);
        }
        status
    }
    pub fn emit(&self, sink: &MetricSink)
    {
        for (namespace, _) in self.namespaces.iter().filter(|(_, present)| **present) {
            let (database, collection) = split_namespace(namespace);
            sink.render(Family::System, "rollback_directory", 1.0, &[database.as_str(), collection.as_str()]);
        }
    }
}

impl RollbackCollector {
    pub fn rollback_dir(db_path: &str) -> PathBuf
    {
        Path::new(db_path).join("rollback")
    }
    /// The entries of the rollback directory. A missing rollback directory means there was no rollback.
    pub fn list_entries(
        shell: &dyn ShellGateway,
        rollback_dir: &Path,
    ) -> anyhow::Result<Vec<String>>
    {
        if !shell.dir_exists(rollback_dir) {
            debug!("no rollback directory: {}", rollback_dir.display());
            return Ok(Vec::new());
        }
        shell.list_dir(rollback_dir)
    }
    async fn read_status(&self, gateway: &dyn AdminGateway) -> anyhow::Result<RollbackStatus>
    {
        let cmd_line_opts = CmdLineOpts::read(gateway).await?;
        let rollback_dir = RollbackCollector::rollback_dir(cmd_line_opts.db_path());

        let shell = Arc::clone(&self.shell);
        let entries = tokio::task::spawn_blocking(move || RollbackCollector::list_entries(shell.as_ref(), &rollback_dir)).await??;
        if entries.is_empty() {
            return Ok(RollbackStatus::new());
        }

        let directory = NamespaceDirectory::read(gateway).await?;
        Ok(RollbackStatus::resolve(&entries, &directory))
    }
}

#[async_trait]
impl Collector for RollbackCollector {
    fn name(&self) -> &'static str
    {
        "rollbackstats"
    }
    async fn collect(
        &self,
        gateway: &dyn AdminGateway,
        sink: &MetricSink,
    )
    {
        info!("begin rollback");
        let timer = Instant::now();

        match self.read_status(gateway).await {
            Ok(status) => status.emit(sink),
            Err(error) => error!("Failed to get rollback status: {:#}", error),
        }

        info!("end rollback: {:?}", timer.elapsed());
    }
}
