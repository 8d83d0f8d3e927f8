//! Plugin Module
//!
//! Post-processing hooks invoked with the raw request payload after cache
//! resolution. Plugins are compiled-in implementations of the [`Plugin`]
//! trait; registration order is invocation order, and nothing the server
//! returns to a client depends on plugin output.

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::logsink::LogSink;

// == Plugin Trait ==
/// A post-processing hook with the two required entry points.
///
/// `init` runs once at registration with the server configuration;
/// returning an error disqualifies the plugin. `process` runs once per
/// request, after the cache was consulted, and is fire-and-forget:
/// failures are logged and swallowed.
pub trait Plugin: Send + Sync {
    /// Name used in diagnostics and registration logs.
    fn name(&self) -> &str;

    /// One-time setup at registration.
    fn init(&mut self, config: &Config) -> anyhow::Result<()>;

    /// Per-request hook, handed the raw request bytes.
    fn process(&self, request: &[u8]) -> anyhow::Result<()>;
}

// == Plugin Registry ==
/// Ordered collection of registered plugins.
///
/// Registration happens before the server starts serving; afterwards the
/// registry is shared read-only across handler tasks and needs no lock.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    // == Constructor ==
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Initializes a plugin and appends it to the invocation order.
    ///
    /// A failed `init` leaves the registry unchanged.
    pub fn register(&mut self, mut plugin: Box<dyn Plugin>, config: &Config) -> Result<()> {
        let name = plugin.name().to_string();
        plugin.init(config).map_err(|reason| ServerError::PluginInit {
            name: name.clone(),
            reason,
        })?;
        info!("plugin registered: {name}");
        self.plugins.push(plugin);
        Ok(())
    }

    // == Notify All ==
    /// Invokes every plugin with the request bytes, in registration order.
    ///
    /// A failing plugin does not stop the others and never fails the
    /// request.
    pub fn notify_all(&self, request: &[u8]) {
        for plugin in &self.plugins {
            if let Err(err) = plugin.process(request) {
                warn!(plugin = plugin.name(), "plugin process failed: {err:#}");
            }
        }
    }

    // == Length ==
    /// Returns the number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

// == Audit Plugin ==
/// Built-in plugin recording a preview of every request in the activity log.
pub struct AuditPlugin {
    sink: LogSink,
}

impl AuditPlugin {
    /// Longest request preview written to the log.
    const PREVIEW_BYTES: usize = 64;

    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }
}

impl Plugin for AuditPlugin {
    fn name(&self) -> &str {
        "audit"
    }

    fn init(&mut self, _config: &Config) -> anyhow::Result<()> {
        Ok(())
    }

    fn process(&self, request: &[u8]) -> anyhow::Result<()> {
        let preview_len = request.len().min(Self::PREVIEW_BYTES);
        let preview = String::from_utf8_lossy(&request[..preview_len]);
        self.sink.log(format!(
            "Plugin audit: {} byte request: {preview}",
            request.len()
        ));
        Ok(())
    }
}
