//! Error types for the server
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Server Error Enum ==
/// Unified error type for server construction and I/O.
///
/// Only startup can surface these to the caller: per-connection I/O
/// failures are handled at the connection boundary and never propagate
/// out of the request pipeline.
#[derive(Error, Debug)]
pub enum ServerError {
    /// A bounded component was configured with capacity zero
    #[error("{component} capacity must be at least 1")]
    InvalidCapacity {
        /// Which component rejected its configuration
        component: &'static str,
    },

    /// A plugin refused to initialize and was not registered
    #[error("plugin '{name}' failed to initialize: {reason}")]
    PluginInit {
        /// Name the plugin reported
        name: String,
        /// What the plugin's `init` returned
        reason: anyhow::Error,
    },

    /// Socket or file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the server.
pub type Result<T> = std::result::Result<T, ServerError>;
