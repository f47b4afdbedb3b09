//! Run settings: connection, workflow options and logging.

use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logging configuration, built once at start-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Log everything down to trace level.
    pub verbose: bool,
}

impl LogConfig {
    /// Logging configuration for the given verbosity.
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Default filter directive for this verbosity.
    #[must_use]
    pub fn directive(&self) -> &'static str {
        if self.verbose {
            "trace"
        } else {
            "info"
        }
    }

    /// Filter honoring `RUST_LOG` when it is set.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directive()))
    }

    /// Install the global subscriber.
    ///
    /// # Errors
    /// Returns an error if a subscriber is already installed.
    pub fn install(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(self.filter())
            .try_init()
            .map_err(|e| anyhow!("Failed to install log subscriber: {e}"))
    }
}

/// Options the workflows read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Buffer file content for `add-file` and fetch directly for `read-file`.
    pub read_direct: bool,
    /// Parent machine hostname for `create-device` and `container`.
    pub parent: Option<String>,
}

impl WorkflowOptions {
    /// Options with an empty parent treated as unset.
    #[must_use]
    pub fn new(read_direct: bool, parent: impl Into<String>) -> Self {
        let parent = parent.into();
        Self {
            read_direct,
            parent: (!parent.is_empty()).then_some(parent),
        }
    }
}

/// Everything one invocation needs.
#[derive(Clone)]
pub struct Settings {
    /// Controller base URL.
    pub base_url: String,
    /// MAAS API key.
    pub api_key: String,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Workflow options.
    pub workflow: WorkflowOptions,
    /// Logging configuration.
    pub logging: LogConfig,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("workflow", &self.workflow)
            .field("logging", &self.logging)
            .finish()
    }
}
