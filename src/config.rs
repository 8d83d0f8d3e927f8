//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::net::SocketAddr;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Capacity values are validated by the components that consume them: a zero
/// pool size, cache capacity, or log buffer size aborts startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of requests allowed to execute concurrently
    pub pool_size: usize,
    /// Maximum number of memoized responses the cache can hold
    pub cache_capacity: usize,
    /// Number of log lines the sink buffers before dropping
    pub log_buffer_size: usize,
    /// TCP listen port
    pub server_port: u16,
    /// Path of the append-only activity log
    pub log_file: String,
    /// Backend addresses registered at startup (never routed to; see backends module)
    pub backends: Vec<SocketAddr>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `POOL_SIZE` - Concurrent request execution slots (default: 10)
    /// - `CACHE_CAPACITY` - Maximum memoized responses (default: 100)
    /// - `LOG_BUFFER_SIZE` - Buffered log lines before dropping (default: 1000)
    /// - `SERVER_PORT` - TCP listen port (default: 9090)
    /// - `LOG_FILE` - Activity log path (default: server.log)
    /// - `BACKENDS` - Comma-separated backend socket addresses (default: none)
    pub fn from_env() -> Self {
        Self {
            pool_size: env::var("POOL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            cache_capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            log_buffer_size: env::var("LOG_BUFFER_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9090),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "server.log".to_string()),
            backends: env::var("BACKENDS")
                .map(|v| parse_backends(&v))
                .unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool_size: 10,
            cache_capacity: 100,
            log_buffer_size: 1000,
            server_port: 9090,
            log_file: "server.log".to_string(),
            backends: Vec::new(),
        }
    }
}

/// Parses a comma-separated address list, skipping entries that do not parse.
fn parse_backends(raw: &str) -> Vec<SocketAddr> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}
