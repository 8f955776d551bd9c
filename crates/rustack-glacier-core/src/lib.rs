//! Shared configuration and region types for the Rustack Glacier signing core.
//!
//! This crate holds the pieces every other Glacier crate needs but which carry
//! no cryptography of their own: the [`GlacierConfig`] loaded from the
//! environment, the [`AwsRegion`] identifier and the core error type.

mod config;
mod error;
mod types;

pub use config::GlacierConfig;
pub use error::{GlacierError, GlacierResult};
pub use types::{AwsRegion, is_valid_scope_component};
