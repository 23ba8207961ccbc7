//! Error types for the gateway binary.
//!
//! [`ServerBinError`] wraps every failure mode during startup and
//! shutdown so `main` can propagate with `?`.

/// Top-level error for the gateway binary.
#[derive(Debug, thiserror::Error)]
pub enum ServerBinError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: courier_core::config::ConfigError,
    },

    /// The log filter directive could not be parsed.
    #[error("invalid log filter {directive:?}: {message}")]
    LogFilter {
        /// The rejected directive.
        directive: String,
        /// Description of the parse failure.
        message: String,
    },

    /// The gateway failed to bind or start.
    #[error("gateway error: {source}")]
    Gateway {
        /// The underlying startup error.
        #[from]
        source: courier_gateway::StartupError,
    },

    /// The gateway task panicked or was cancelled.
    #[error("gateway task failed: {message}")]
    Join {
        /// Description of the join failure.
        message: String,
    },
}
