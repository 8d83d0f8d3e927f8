//! Server Module
//!
//! Shared server state and the TCP accept loop.

mod pipeline;

use std::future::Future;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};

use std::sync::Arc;

use crate::admission::AdmissionGate;
use crate::cache::ResponseCache;
use crate::error::Result;
use crate::logsink::LogSink;
use crate::plugins::PluginRegistry;

// == Server State ==
/// Everything a request handler needs, cloned into each connection task.
///
/// The former process-wide singletons live here as explicit shared
/// objects: the cache behind its one mutex, the admission gate, the log
/// sink producer handle, and the read-only plugin registry.
#[derive(Clone)]
pub struct ServerState {
    /// Shared response cache; lock held only for in-memory operations
    pub cache: Arc<Mutex<ResponseCache>>,
    /// Bounds concurrently executing handlers
    pub gate: AdmissionGate,
    /// Activity log producer handle
    pub sink: LogSink,
    /// Post-processing hooks, frozen before serving starts
    pub plugins: Arc<PluginRegistry>,
}

impl ServerState {
    /// Assembles the state from its constructed components.
    pub fn new(
        cache: ResponseCache,
        gate: AdmissionGate,
        sink: LogSink,
        plugins: PluginRegistry,
    ) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
            gate,
            sink,
            plugins: Arc::new(plugins),
        }
    }
}

// == Accept Loop ==
/// Accepts connections until the shutdown future resolves.
///
/// Every accepted connection gets its own task immediately; the admission
/// gate inside the pipeline is what bounds concurrent work, not the task
/// count. Accept errors abandon that connection attempt only.
pub async fn run(
    listener: TcpListener,
    state: ServerState,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received, no longer accepting connections");
                state.sink.log("Server stopped accepting connections");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let state = state.clone();
                        tokio::spawn(async move {
                            pipeline::handle_connection(stream, peer, state).await;
                        });
                    }
                    Err(err) => {
                        warn!("accept error: {err}");
                        state.sink.log(format!("Accept error: {err}"));
                    }
                }
            }
        }
    }

    Ok(())
}
