//! The impls and functions
//!
use std::sync::Arc;
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use log::*;
use tokio::net::TcpListener;
use crate::exporter::{scrape_timeout, Exporter};
use crate::server::ServerState;
use crate::utility::socket_address;
use crate::DEFAULT_TELEMETRY_PATH;

pub const SCRAPE_TIMEOUT_HEADER: &str = "X-Prometheus-Scrape-Timeout-Seconds";
const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

/// The telemetry path, `/metrics` when it is empty.
pub fn telemetry_path(path: &str) -> String
{
    if path.is_empty() {
        warn!("Web telemetry path \"\" invalid, falling back to \"{}\" instead", DEFAULT_TELEMETRY_PATH);
        return DEFAULT_TELEMETRY_PATH.to_string();
    }
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// The values of the repeated `collect[]` query parameter.
pub fn collect_filters(params: Vec<(String, String)>) -> Vec<String>
{
    params
        .into_iter()
        .filter(|(name, _)| name == "collect[]")
        .map(|(_, value)| value)
        .collect()
}

async fn landing_page(State(state): State<ServerState>) -> Html<String>
{
    Html(format!(
        "<html>\n<head><title>mongo_stats</title></head>\n<body>\n<h1>mongo_stats</h1>\n<p><a href='{}'>Metrics</a></p>\n</body>\n</html>\n",
        state.telemetry_path
    ))
}

async fn metrics(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response
{
    let filters = collect_filters(params);
    let timeout = scrape_timeout(
        headers.get(SCRAPE_TIMEOUT_HEADER).and_then(|value| value.to_str().ok()),
        state.exporter.timeout_offset,
    );
    match state.exporter.scrape(&filters, timeout).await {
        Ok(text) => ([(header::CONTENT_TYPE, TEXT_FORMAT)], text).into_response(),
        Err(error) => {
            error!("Scrape failed: {:#}", error);
            (StatusCode::SERVICE_UNAVAILABLE, format!("{:#}\n", error)).into_response()
        }
    }
}

pub fn router(
    exporter: Arc<Exporter>,
    telemetry_path: &str,
) -> Router
{
    let state = ServerState { exporter, telemetry_path: telemetry_path.to_string() };
    let router = Router::new().route(telemetry_path, get(metrics));
    let router = if telemetry_path == "/" {
        router
    } else {
        router.route("/", get(landing_page))
    };
    router.with_state(state)
}

/// Serve on `--web.listen-address` until the process is stopped.
pub async fn serve(
    listen_address: &str,
    telemetry_path: &str,
    exporter: Exporter,
) -> Result<()>
{
    let address = socket_address(listen_address);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Cannot listen on {}", address))?;
    info!("Listening on {}, metrics at {}", address, telemetry_path);
    axum::serve(listener, router(Arc::new(exporter), telemetry_path))
        .await
        .with_context(|| "Error running the web server")?;
    Ok(())
}
