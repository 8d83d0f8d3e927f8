//! Memoserve - A concurrent TCP server with memoized responses
//!
//! Bounds concurrent request handling with an admission gate, memoizes
//! computed responses in a shared LRU cache, and persists activity logs
//! through an asynchronous non-blocking sink.

pub mod admission;
pub mod backends;
pub mod cache;
pub mod config;
pub mod error;
pub mod logsink;
pub mod plugins;
pub mod protocol;
pub mod server;

pub use admission::AdmissionGate;
pub use cache::ResponseCache;
pub use config::Config;
pub use error::{Result, ServerError};
pub use logsink::LogSink;
pub use server::ServerState;
