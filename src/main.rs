//! The mongo_stats binary: parse the options, start the exporter and serve the metrics.
//!
use std::sync::Arc;
use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use mongo_stats::exporter::Exporter;
use mongo_stats::gateway::{ConnectionSettings, MongoConnector, OsShell};
use mongo_stats::schema::SCHEMA;
use mongo_stats::server::{serve, telemetry_path};
use mongo_stats::Opts;

#[tokio::main]
async fn main() -> Result<()>
{
    dotenv().ok();
    let opts = Opts::parse();

    // env_logger has no fatal level
    let log_level = if opts.log_level == "fatal" { "error" } else { opts.log_level.as_str() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    SCHEMA.validate()?;

    let connector = Arc::new(MongoConnector::new(ConnectionSettings::from_opts(&opts), opts.global_conn_pool));
    let exporter = Exporter::start(&opts, connector, Arc::new(OsShell)).await?;

    serve(&opts.listen_address, &telemetry_path(&opts.telemetry_path), exporter).await
}
