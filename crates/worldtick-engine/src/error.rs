//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure that can stop a run so `main` can
//! propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: worldtick_core::ConfigError,
    },

    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying store error.
        #[from]
        source: worldtick_core::CoreError,
    },
}
