//! Common AWS type definitions shared across the Glacier crates.

use std::fmt;

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Region used when none is configured.
    pub const DEFAULT: &str = "us-east-1";

    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The Glacier endpoint host for this region.
    ///
    /// # Examples
    ///
    /// ```
    /// use rustack_glacier_core::AwsRegion;
    ///
    /// let region = AwsRegion::default();
    /// assert_eq!(region.glacier_endpoint(), "glacier.us-east-1.amazonaws.com");
    /// ```
    #[must_use]
    pub fn glacier_endpoint(&self) -> String {
        format!("glacier.{}.amazonaws.com", self.0)
    }
}

/// Whether `value` can be a region or service component of a credential scope.
///
/// Components are joined with `/`, so they must be non-empty and contain
/// neither `/` nor whitespace.
///
/// # Examples
///
/// ```
/// use rustack_glacier_core::is_valid_scope_component;
///
/// assert!(is_valid_scope_component("us-east-1"));
/// assert!(!is_valid_scope_component("us east"));
/// assert!(!is_valid_scope_component(""));
/// ```
#[must_use]
pub fn is_valid_scope_component(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(|c| c == '/' || c.is_whitespace())
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_region() {
        let region = AwsRegion::new("eu-west-1");
        assert_eq!(region.as_str(), "eu-west-1");
        assert_eq!(region.to_string(), "eu-west-1");
    }

    #[test]
    fn test_should_use_default_region() {
        let region = AwsRegion::default();
        assert_eq!(region.as_str(), "us-east-1");
    }

    #[test]
    fn test_should_validate_scope_components() {
        assert!(is_valid_scope_component("glacier"));
        assert!(is_valid_scope_component("eu-central-1"));
        assert!(!is_valid_scope_component(""));
        assert!(!is_valid_scope_component("us-east-1/x"));
        assert!(!is_valid_scope_component("us-east-1 "));
        assert!(!is_valid_scope_component("gla\tcier"));
    }

    #[test]
    fn test_should_build_glacier_endpoint_for_region() {
        let region = AwsRegion::new("ap-northeast-1");
        assert_eq!(
            region.glacier_endpoint(),
            "glacier.ap-northeast-1.amazonaws.com"
        );
    }
}
