//! Test doubles for the gateways.
//!
//! [FakeGateway] answers from canned responses, keyed by `database.commandName` for commands
//! and `database.collection` (or `database` for a database aggregation) for finds and aggregations.
//! Anything that has no canned response fails with [GatewayError::Timeout], which is how the tests
//! simulate a failing command.
//!
use std::{collections::{HashMap, HashSet}, path::{Path, PathBuf}, sync::Arc};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use mongodb::bson::Document;
use tokio::time::Instant;
use crate::gateway::{AdminGateway, Connector, GatewayError, ShellGateway};

type FindResponder = Box<dyn Fn(&Document, Option<&Document>) -> Vec<Document> + Send + Sync>;
type AggregateResponder = Box<dyn Fn(&[Document]) -> Vec<Document> + Send + Sync>;

#[derive(Default)]
pub struct FakeGateway {
    commands: HashMap<String, Document>,
    finds: HashMap<String, FindResponder>,
    aggregates: HashMap<String, AggregateResponder>,
}

impl FakeGateway {
    pub fn new() -> Self { Default::default() }
    pub fn with_command(
        mut self,
        database: &str,
        command: &str,
        response: Document,
    ) -> Self
    {
        self.commands.insert(format!("{}.{}", database, command), response);
        self
    }
    pub fn with_find(
        mut self,
        namespace: &str,
        documents: Vec<Document>,
    ) -> Self
    {
        self.finds.insert(namespace.to_string(), Box::new(move |_, _| documents.clone()));
        self
    }
    /// A find whose response depends on the filter and the sort.
    pub fn with_find_fn(
        mut self,
        namespace: &str,
        responder: impl Fn(&Document, Option<&Document>) -> Vec<Document> + Send + Sync + 'static,
    ) -> Self
    {
        self.finds.insert(namespace.to_string(), Box::new(responder));
        self
    }
    pub fn with_aggregate(
        mut self,
        namespace: &str,
        documents: Vec<Document>,
    ) -> Self
    {
        self.aggregates.insert(namespace.to_string(), Box::new(move |_| documents.clone()));
        self
    }
    /// An aggregation whose response depends on the pipeline.
    pub fn with_aggregate_fn(
        mut self,
        namespace: &str,
        responder: impl Fn(&[Document]) -> Vec<Document> + Send + Sync + 'static,
    ) -> Self
    {
        self.aggregates.insert(namespace.to_string(), Box::new(responder));
        self
    }
}

#[async_trait]
impl AdminGateway for FakeGateway {
    async fn run_command(
        &self,
        database: &str,
        command: Document,
    ) -> Result<Document, GatewayError>
    {
        let name = command.keys().next().cloned().unwrap_or_default();
        let key = format!("{}.{}", database, name);
        self.commands.get(&key).cloned().ok_or(GatewayError::Timeout { what: key })
    }
    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        sort: Option<Document>,
        _limit: Option<i64>,
    ) -> Result<Vec<Document>, GatewayError>
    {
        let key = format!("{}.{}", database, collection);
        match self.finds.get(&key) {
            Some(responder) => Ok(responder(&filter, sort.as_ref())),
            None => Err(GatewayError::Timeout { what: format!("find on {}", key) }),
        }
    }
    async fn aggregate(
        &self,
        database: &str,
        collection: Option<&str>,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, GatewayError>
    {
        let key = match collection {
            Some(collection) => format!("{}.{}", database, collection),
            None => database.to_string(),
        };
        match self.aggregates.get(&key) {
            Some(responder) => Ok(responder(&pipeline)),
            None => Err(GatewayError::Timeout { what: format!("aggregate on {}", key) }),
        }
    }
}

/// Hands out the same fake gateway for every scrape, or fails like an unreachable server.
pub struct FakeConnector {
    pub gateway: Option<Arc<FakeGateway>>,
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        _deadline: Instant,
    ) -> Result<Arc<dyn AdminGateway>>
    {
        match &self.gateway {
            Some(gateway) => Ok(gateway.clone()),
            None => Err(anyhow!("Cannot connect to MongoDB: connection refused")),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeShell {
    directories: HashMap<PathBuf, Vec<String>>,
    outputs: HashMap<String, String>,
    programs: HashSet<String>,
}

impl FakeShell {
    pub fn new() -> Self { Default::default() }
    pub fn with_dir(
        mut self,
        path: &str,
        entries: &[&str],
    ) -> Self
    {
        self.directories.insert(PathBuf::from(path), entries.iter().map(|entry| entry.to_string()).collect());
        self
    }
    /// The output of a command line, for example `sudo -n lvs`.
    pub fn with_output(
        mut self,
        command_line: &str,
        output: &str,
    ) -> Self
    {
        self.outputs.insert(command_line.to_string(), output.to_string());
        self
    }
    pub fn with_programs(
        mut self,
        programs: &[&str],
    ) -> Self
    {
        self.programs.extend(programs.iter().map(|program| program.to_string()));
        self
    }
}

impl ShellGateway for FakeShell {
    fn dir_exists(&self, path: &Path) -> bool
    {
        self.directories.contains_key(path)
    }
    fn list_dir(&self, path: &Path) -> Result<Vec<String>>
    {
        self.directories.get(path).cloned().ok_or_else(|| anyhow!("Cannot read directory: {}", path.display()))
    }
    fn run(&self, program: &str, args: &[&str]) -> Result<String>
    {
        let command_line = std::iter::once(program).chain(args.iter().copied()).collect::<Vec<_>>().join(" ");
        self.outputs.get(&command_line).cloned().ok_or_else(|| anyhow!("Cannot execute: {}", command_line))
    }
    fn has_program(&self, program: &str) -> bool
    {
        self.programs.contains(program)
    }
}
