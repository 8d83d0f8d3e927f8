//! Request Pipeline Module
//!
//! Per-connection orchestration: admit, read, consult the cache, compute
//! or serve, log, notify plugins, respond, release.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::protocol::{compute_value, render_response, ResponseSource, MAX_REQUEST_BYTES};
use crate::server::ServerState;

/// Runs one connection through the full pipeline.
///
/// Every exit path releases the admission slot and closes the connection:
/// the permit and the stream are both dropped when this function returns,
/// whichever branch it returns from. I/O errors are logged and abandon
/// only this connection.
pub(crate) async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, state: ServerState) {
    // Admitted: block here until a worker slot frees up.
    let _permit = state.gate.acquire().await;
    state.sink.log(format!("Processing request from {peer}"));

    // Received: a zero-byte read is an orderly disconnect.
    let mut buffer = [0u8; MAX_REQUEST_BYTES];
    let read = match stream.read(&mut buffer).await {
        Ok(0) => {
            state.sink.log(format!("Client {peer} disconnected"));
            return;
        }
        Ok(n) => n,
        Err(err) => {
            state.sink.log(format!("Error receiving data from {peer}: {err}"));
            return;
        }
    };
    let request = String::from_utf8_lossy(&buffer[..read]).into_owned();

    // CacheChecked: the raw request text is the cache key. On a miss the
    // computed value is stored before the lock is released, so the
    // lookup-compute-store step is atomic per key.
    let (source, value) = {
        let mut cache = state.cache.lock().await;
        match cache.get(&request) {
            Some(value) => (ResponseSource::CacheHit, value),
            None => {
                let value = compute_value(&request);
                cache.put(request.clone(), value.clone());
                (ResponseSource::Computed, value)
            }
        }
    };
    match source {
        ResponseSource::CacheHit => state.sink.log(format!("Cache HIT: {}", preview(&request))),
        ResponseSource::Computed => state.sink.log(format!("Cache MISS: {}", preview(&request))),
    }

    // PluginNotified: fire-and-forget, failures stay inside the registry.
    state.plugins.notify_all(request.as_bytes());

    // Responded: best-effort write, no retry loop.
    let response = render_response(source, &value);
    if let Err(err) = stream.write_all(response.as_bytes()).await {
        state.sink.log(format!("Error sending response to {peer}: {err}"));
    }

    // Released: permit and stream drop here on every path above.
}

/// Short, single-line rendering of a request for log messages.
fn preview(request: &str) -> String {
    request.chars().take(48).collect::<String>().escape_debug().to_string()
}
