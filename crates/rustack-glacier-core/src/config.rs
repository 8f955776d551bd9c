//! Glacier signing configuration.
//!
//! Provides [`GlacierConfig`] for the request signer. Values are loaded from
//! environment variables, falling back to the public AWS defaults.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{GlacierError, GlacierResult};
use crate::types::{AwsRegion, is_valid_scope_component};

/// Glacier signing configuration.
///
/// # Examples
///
/// ```
/// use rustack_glacier_core::GlacierConfig;
///
/// let config = GlacierConfig::default();
/// assert_eq!(config.service, "glacier");
/// assert!(config.sign_payload);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GlacierConfig {
    /// Region used in the credential scope and the endpoint host.
    #[builder(default)]
    pub default_region: AwsRegion,

    /// Service name used in the credential scope.
    #[builder(default = String::from("glacier"))]
    pub service: String,

    /// Whether the signer adds an `x-amz-content-sha256` header with the body digest.
    #[builder(default = true)]
    pub sign_payload: bool,
}

impl Default for GlacierConfig {
    fn default() -> Self {
        Self {
            default_region: AwsRegion::default(),
            service: String::from("glacier"),
            sign_payload: true,
        }
    }
}

impl GlacierConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DEFAULT_REGION` / `AWS_DEFAULT_REGION` | `us-east-1` |
    /// | `GLACIER_SERVICE` | `glacier` |
    /// | `GLACIER_SIGN_PAYLOAD` | `true` |
    ///
    /// `DEFAULT_REGION` wins when both region variables are set.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("AWS_DEFAULT_REGION") {
            config.default_region = AwsRegion::new(v);
        }
        if let Ok(v) = std::env::var("DEFAULT_REGION") {
            config.default_region = AwsRegion::new(v);
        }
        if let Ok(v) = std::env::var("GLACIER_SERVICE") {
            config.service = v;
        }
        if let Ok(v) = std::env::var("GLACIER_SIGN_PAYLOAD") {
            config.sign_payload = parse_bool(&v);
        }

        config
    }

    /// Check that the scope components are usable.
    ///
    /// Region and service end up as `/`-separated components of the credential
    /// scope, so each must pass [`is_valid_scope_component`].
    pub fn validate(&self) -> GlacierResult<()> {
        check_scope_component("default_region", self.default_region.as_str())?;
        check_scope_component("service", &self.service)
    }
}

fn check_scope_component(field: &str, value: &str) -> GlacierResult<()> {
    if is_valid_scope_component(value) {
        Ok(())
    } else {
        Err(GlacierError::Config(format!(
            "{field} must be non-empty without '/' or whitespace, got {value:?}"
        )))
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
