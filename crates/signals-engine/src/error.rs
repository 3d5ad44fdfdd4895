//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the tick loop so
//! that `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: signals_core::config::ConfigError,
    },

    /// Network construction or graph compilation failed.
    #[error("network error: {source}")]
    Network {
        /// The underlying network error.
        #[from]
        source: signals_network::NetworkError,
    },

    /// The tick loop failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: signals_core::tick::TickError,
    },
}
