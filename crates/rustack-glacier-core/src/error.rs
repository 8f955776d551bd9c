//! Error types for the Glacier core.

/// Core error type for Glacier configuration.
#[derive(Debug, thiserror::Error)]
pub enum GlacierError {
    /// A configuration value is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for Glacier core operations.
pub type GlacierResult<T> = Result<T, GlacierError>;
