//! Error types for SigV4 request signing.
//!
//! All signing failures are represented by [`AuthError`]. No partially built
//! canonical request or signature is ever returned alongside an error.

/// Errors that can occur while signing a request with AWS Signature Version 4.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The query string contains a malformed percent-escape.
    #[error("Malformed query string: {0}")]
    Encoding(String),

    /// The request body could not be read in full.
    #[error("Failed to read request body: {0}")]
    Io(#[from] std::io::Error),

    /// The request date is not in a recognized format.
    #[error("Unparseable request date: {0}")]
    DateParse(String),

    /// A credential scope component is malformed.
    #[error("Invalid credential scope: {0}")]
    InvalidScope(String),

    /// The access key ID was not found in the credential store.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// A header value is not visible ASCII, or a computed value is not a valid header.
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(String),
}
