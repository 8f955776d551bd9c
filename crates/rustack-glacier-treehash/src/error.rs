//! Error types for tree hash computation.

/// Errors produced by the tree hashers.
#[derive(Debug, thiserror::Error)]
pub enum TreeHashError {
    /// Data was written to a hasher that has already been closed.
    #[error("tree hasher is closed; call reset() before writing again")]
    InvalidState,

    /// A result was read from a hasher that has not been closed yet.
    #[error("tree hash is not ready; call close() first")]
    NotReady,

    /// A hex digest string was not exactly 64 hexadecimal characters.
    #[error("invalid hex digest: {0}")]
    HexDecode(String),

    /// A multipart part size is not a power-of-two number of MiB between 1 MiB and 4 GiB.
    #[error("invalid part size: {0} bytes")]
    InvalidPartSize(u64),
}
