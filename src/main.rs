//! Memoserve - A concurrent TCP server with memoized responses
//!
//! Startup wires the subsystems together in dependency order: the log
//! sink first (it is a required dependency of everything else), then the
//! cache, the admission gate, the backend registry, and the plugins.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memoserve::admission::AdmissionGate;
use memoserve::backends::BackendRegistry;
use memoserve::cache::ResponseCache;
use memoserve::config::Config;
use memoserve::logsink::LogSink;
use memoserve::plugins::{AuditPlugin, PluginRegistry};
use memoserve::server::{self, ServerState};

/// Main entry point for the Memoserve server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for diagnostics
/// 2. Load configuration from environment variables
/// 3. Open the activity log sink (fatal if the file cannot be opened)
/// 4. Build cache, admission gate, backend registry, and plugins
/// 5. Bind the TCP listener and accept until SIGINT/SIGTERM
/// 6. Drain the log sink before exit
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memoserve=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Memoserve");

    let config = Config::from_env();
    info!(
        "Configuration loaded: pool_size={}, cache_capacity={}, log_buffer={}, port={}",
        config.pool_size, config.cache_capacity, config.log_buffer_size, config.server_port
    );

    // The activity log is a required dependency; an unopenable file
    // aborts startup.
    let (sink, log_writer) = LogSink::open(&config.log_file, config.log_buffer_size).await?;
    sink.log("System started");

    let cache = ResponseCache::new(config.cache_capacity)?;
    sink.log(format!(
        "Response cache created with capacity {}",
        config.cache_capacity
    ));

    let gate = AdmissionGate::new(config.pool_size)?;
    sink.log(format!("Worker pool sized at {}", config.pool_size));

    let mut backends = BackendRegistry::new();
    for addr in &config.backends {
        backends.add(*addr);
    }
    sink.log(format!(
        "Backend registry configured with {} entries",
        backends.len()
    ));

    let mut plugins = PluginRegistry::new();
    if let Err(err) = plugins.register(Box::new(AuditPlugin::new(sink.clone())), &config) {
        warn!("skipping plugin: {err}");
    }
    sink.log(format!(
        "Plugin system initialized with {} plugins",
        plugins.len()
    ));

    let state = ServerState::new(cache, gate, sink.clone(), plugins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {addr}");
    sink.log(format!("Server running on port {}", config.server_port));

    server::run(listener, state.clone(), shutdown_signal()).await?;

    // Record final cache counters, then let the sink drain everything
    // already enqueued before the process exits.
    let stats = state.cache.lock().await.stats();
    sink.log(format!(
        "Final cache stats: {}",
        serde_json::to_string(&stats)?
    ));
    if sink.dropped_lines() > 0 {
        sink.log(format!(
            "Log lines dropped under load: {}",
            sink.dropped_lines()
        ));
    }

    drop(state);
    sink.shutdown(log_writer).await;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
