mod api;
mod cancellation;
mod keywords;
mod session;
mod types;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use rxconnector::{Connector, ConnectorConfig, SimulatedBackend, SystemProcessHost};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use cancellation::RequestManager;
use session::AppState;

const MAX_REQUEST_BYTES: usize = 2 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "rxconnector-server")]
#[command(about = "Remote keyword server for desktop UI automation")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "RXCONNECTOR_IP", default_value = "0.0.0.0")]
    ip: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "RXCONNECTOR_PORT", default_value_t = 11000)]
    port: u16,

    /// Scene file (JSON) for the simulated desktop
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Connector settings (JSON); missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// error, warn, info or debug
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable CORS for all origins
    #[arg(long)]
    cors: bool,
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let log_level = level
        .map(|level| match level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;

    Ok(())
}

async fn shutdown_signal(requests: RequestManager) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    info!("Shutting down, cancelling {} request(s)", requests.active_count().await);
    requests.cancel_all().await;
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref())?;

    info!("🚀 Starting rxconnector-server v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => ConnectorConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ConnectorConfig::default(),
    };
    info!("🔧 Config: {:?}", config);

    let backend = match &args.scene {
        Some(path) => SimulatedBackend::from_file(path)
            .with_context(|| format!("Failed to load scene {}", path.display()))?,
        None => {
            warn!("No --scene given, serving an empty simulated desktop");
            SimulatedBackend::new()
        }
    };

    let connector = Connector::new(Arc::new(backend), Arc::new(SystemProcessHost), config);
    let state = Arc::new(AppState::new(connector));
    let requests = state.requests.clone();

    let mut app = Router::new()
        .route("/api/health", get(api::health))
        .route("/api/keywords", get(api::list_keywords))
        .route("/api/keywords/{name}", get(api::describe_keyword))
        .route("/api/run_keyword", post(api::run_keyword))
        .route("/api/requests/{id}/cancel", post(api::cancel_request))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .layer(TraceLayer::new_for_http());

    if args.cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let addr = SocketAddr::new(args.ip, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("✅ Server listening on http://{}", addr);
    info!("🔧 CORS: {}", if args.cors { "enabled" } else { "disabled" });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(requests))
        .await?;

    Ok(())
}
