//! AWS Signature Version 4 request signing for Amazon S3 Glacier.
//!
//! Signing runs in four steps, each exposed on its own so callers can stop at
//! any stage or verify someone else's signature:
//!
//! 1. [`canonical`] serializes the request into a [`CanonicalRequest`].
//! 2. [`sigv4::build_string_to_sign`] binds its hash to a timestamp and a
//!    [`CredentialScope`].
//! 3. [`sigv4::derive_signing_key`] turns the secret access key into a
//!    [`SigningKey`] scoped to one day and region of one service.
//! 4. [`sigv4::compute_signature`] produces the hex signature.
//!
//! [`RequestSigner`] runs the whole chain over an [`http::request::Parts`]
//! and sets the `Authorization` header.
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request construction
//! - [`credentials`] - Credentials and credential providers
//! - [`error`] - Signing error types
//! - [`signer`] - End-to-end request signing
//! - [`sigv4`] - String to sign, key derivation and signature

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod signer;
pub mod sigv4;

pub use canonical::{CanonicalInput, CanonicalRequest, build_canonical_request};
pub use credentials::{CredentialProvider, Credentials, StaticCredentialProvider};
pub use error::AuthError;
pub use signer::{RequestSigner, SigningOutput, build_authorization_header};
pub use sigv4::{
    CredentialScope, SigningKey, build_string_to_sign, compute_signature, derive_signing_key,
    hash_payload,
};
