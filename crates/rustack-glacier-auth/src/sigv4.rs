//! AWS Signature Version 4 primitives.
//!
//! This module implements the signing chain that follows canonicalization:
//!
//! 1. Build the string to sign from the request timestamp, the credential
//!    scope and the hash of the canonical request.
//! 2. Derive the signing key from the secret access key and the scope
//!    components with four chained HMAC-SHA256 calls.
//! 3. Compute the signature as the hex HMAC-SHA256 of the string to sign
//!    under the derived key.
//!
//! The raw secret is only ever used as input to [`derive_signing_key`]; the
//! signature itself is always keyed by the derived [`SigningKey`].

use std::fmt;
use std::io::{self, Read};

use chrono::{DateTime, NaiveDateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};
use rustack_glacier_core::is_valid_scope_component;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::CanonicalRequest;
use crate::error::AuthError;

/// The only algorithm supported by this implementation.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Literal terminator of every credential scope.
const SCOPE_TERMINATOR: &str = "aws4_request";

/// Compact ISO 8601 timestamp format (`YYYYMMDDThhmmssZ`).
const ISO8601_BASIC: &str = "%Y%m%dT%H%M%SZ";

/// Short date format used in the credential scope (`YYYYMMDD`).
const DATE_SHORT: &str = "%Y%m%d";

/// Read size used when hashing a body from a reader.
const READ_BUF_SIZE: usize = 64 * 1024;

type HmacSha256 = Hmac<Sha256>;

/// The `date/region/service/aws4_request` scope a signing key is valid for.
///
/// # Examples
///
/// ```
/// use rustack_glacier_auth::sigv4::CredentialScope;
///
/// let scope = CredentialScope::new("20120525", "us-east-1", "glacier").unwrap();
/// assert_eq!(scope.to_string(), "20120525/us-east-1/glacier/aws4_request");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    date: String,
    region: String,
    service: String,
}

impl CredentialScope {
    /// Create a scope from an 8-digit `YYYYMMDD` date, a region and a service.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidScope`] if the date is not 8 ASCII digits or
    /// the region or service fails [`is_valid_scope_component`].
    pub fn new(
        date: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let date = date.into();
        let region = region.into();
        let service = service.into();

        if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::InvalidScope(format!(
                "date must be YYYYMMDD, got {date:?}"
            )));
        }
        for (field, value) in [("region", &region), ("service", &service)] {
            if !is_valid_scope_component(value) {
                return Err(AuthError::InvalidScope(format!(
                    "invalid {field}: {value:?}"
                )));
            }
        }

        Ok(Self {
            date,
            region,
            service,
        })
    }

    /// Create a scope whose date is the UTC calendar day of `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidScope`] if the region or service is invalid.
    pub fn from_datetime(
        timestamp: &DateTime<Utc>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Result<Self, AuthError> {
        Self::new(timestamp.format(DATE_SHORT).to_string(), region, service)
    }

    /// The `YYYYMMDD` date component.
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// The region component.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The service component.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{SCOPE_TERMINATOR}",
            self.date, self.region, self.service
        )
    }
}

/// A 32-byte key derived for one date, region and service.
///
/// `Debug` output never shows the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey([u8; 32]);

impl SigningKey {
    /// The raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Parse a request date into a UTC timestamp.
///
/// Accepts compact ISO 8601 (`20130524T000000Z`, the `x-amz-date` form),
/// RFC 1123 / RFC 2822 HTTP dates (`Fri, 24 May 2013 00:00:00 GMT`) and
/// RFC 3339.
///
/// # Errors
///
/// Returns [`AuthError::DateParse`] for any other input.
pub fn parse_request_date(value: &str) -> Result<DateTime<Utc>, AuthError> {
    let value = value.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, ISO8601_BASIC) {
        return Ok(naive.and_utc());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    Err(AuthError::DateParse(value.to_owned()))
}

/// Format a timestamp in compact ISO 8601 form (`YYYYMMDDThhmmssZ`).
#[must_use]
pub fn format_amz_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(ISO8601_BASIC).to_string()
}

/// Build the SigV4 string to sign from a caller-supplied request date.
///
/// Format:
/// ```text
/// AWS4-HMAC-SHA256\n
/// <YYYYMMDDThhmmssZ>\n
/// <credential_scope>\n
/// <hex(SHA256(canonical_request))>
/// ```
///
/// # Errors
///
/// Returns [`AuthError::DateParse`] if `request_date` cannot be parsed.
pub fn build_string_to_sign(
    canonical_request: &CanonicalRequest,
    request_date: &str,
    scope: &CredentialScope,
) -> Result<String, AuthError> {
    let timestamp = parse_request_date(request_date)?;
    Ok(build_string_to_sign_at(canonical_request, &timestamp, scope))
}

/// Build the SigV4 string to sign for an already parsed timestamp.
#[must_use]
pub fn build_string_to_sign_at(
    canonical_request: &CanonicalRequest,
    timestamp: &DateTime<Utc>,
    scope: &CredentialScope,
) -> String {
    let string_to_sign = format!(
        "{ALGORITHM}\n{}\n{scope}\n{}",
        format_amz_date(timestamp),
        canonical_request.hash()
    );
    debug!(string_to_sign, "Built string to sign");
    string_to_sign
}

/// Derive the SigV4 signing key using HMAC-SHA256 chain.
///
/// ```text
/// DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
/// DateRegionKey        = HMAC-SHA256(DateKey, region)
/// DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
/// SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
/// ```
///
/// # Examples
///
/// ```
/// use rustack_glacier_auth::sigv4::derive_signing_key;
///
/// let key = derive_signing_key(
///     "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
///     "20120215",
///     "us-east-1",
///     "iam",
/// );
/// assert_eq!(
///     hex::encode(key.as_bytes()),
///     "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
/// );
/// ```
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> SigningKey {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    SigningKey(hmac_sha256(
        &date_region_service_key,
        SCOPE_TERMINATOR.as_bytes(),
    ))
}

/// Derive the signing key for a [`CredentialScope`].
#[must_use]
pub fn derive_signing_key_for_scope(secret_key: &str, scope: &CredentialScope) -> SigningKey {
    derive_signing_key(secret_key, &scope.date, &scope.region, &scope.service)
}

/// Compute the HMAC-SHA256 signature of `string_to_sign` using the derived `signing_key`.
///
/// Returns the hex-encoded signature.
#[must_use]
pub fn compute_signature(signing_key: &SigningKey, string_to_sign: &str) -> String {
    hex::encode(hmac_sha256(&signing_key.0, string_to_sign.as_bytes()))
}

/// Compare two hex signatures in constant time.
#[must_use]
pub fn verify_signature(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Compute the SHA-256 hash of the given payload and return it as a hex string.
///
/// # Examples
///
/// ```
/// use rustack_glacier_auth::sigv4::hash_payload;
///
/// // SHA-256 of empty payload
/// assert_eq!(
///     hash_payload(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Read `reader` to the end and return the hex SHA-256 of everything read.
///
/// # Errors
///
/// Returns the first I/O error other than [`io::ErrorKind::Interrupted`].
pub fn hash_payload_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute HMAC-SHA256 and return the raw bytes.
fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{CanonicalInput, build_canonical_request_with_payload_hash};

    const TEST_SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY";
    const EMPTY_HASH: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn get_object_canonical_request() -> CanonicalRequest {
        let headers = [
            ("range", "bytes=0-9"),
            ("x-amz-content-sha256", EMPTY_HASH),
            ("x-amz-date", "20130524T000000Z"),
        ];
        let input = CanonicalInput {
            method: "GET",
            path: "/test.txt",
            query: "",
            headers: &headers,
            host: "examplebucket.s3.amazonaws.com",
        };
        build_canonical_request_with_payload_hash(&input, EMPTY_HASH).unwrap()
    }

    #[test]
    fn test_should_derive_signing_key_matching_aws_test_vector() {
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key.as_bytes()),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_should_derive_same_key_from_scope() {
        let scope = CredentialScope::new("20130524", "us-east-1", "s3").unwrap();
        assert_eq!(
            derive_signing_key_for_scope(TEST_SECRET_KEY, &scope),
            derive_signing_key(TEST_SECRET_KEY, "20130524", "us-east-1", "s3")
        );
    }

    #[test]
    fn test_should_redact_signing_key_in_debug_output() {
        let key = derive_signing_key(TEST_SECRET_KEY, "20130524", "us-east-1", "s3");
        assert_eq!(format!("{key:?}"), "SigningKey(<redacted>)");
    }

    #[test]
    fn test_should_render_credential_scope() {
        let scope = CredentialScope::new("20130524", "us-east-1", "s3").unwrap();
        assert_eq!(scope.to_string(), "20130524/us-east-1/s3/aws4_request");
        assert_eq!(scope.date(), "20130524");
        assert_eq!(scope.region(), "us-east-1");
        assert_eq!(scope.service(), "s3");
    }

    #[test]
    fn test_should_reject_invalid_scope_components() {
        assert!(matches!(
            CredentialScope::new("2013-05-24", "us-east-1", "s3"),
            Err(AuthError::InvalidScope(_))
        ));
        assert!(matches!(
            CredentialScope::new("20130524", "", "s3"),
            Err(AuthError::InvalidScope(_))
        ));
        assert!(matches!(
            CredentialScope::new("20130524", "us-east-1", "s3/x"),
            Err(AuthError::InvalidScope(_))
        ));
        assert!(matches!(
            CredentialScope::new("20130524", "us east 1", "s3"),
            Err(AuthError::InvalidScope(_))
        ));
    }

    #[test]
    fn test_should_parse_supported_date_formats() {
        let expected = parse_request_date("20130524T000000Z").unwrap();
        assert_eq!(
            parse_request_date("Fri, 24 May 2013 00:00:00 GMT").unwrap(),
            expected
        );
        assert_eq!(
            parse_request_date("2013-05-24T00:00:00Z").unwrap(),
            expected
        );
        assert_eq!(
            parse_request_date("Thu, 23 May 2013 20:00:00 -0400").unwrap(),
            expected
        );
        assert_eq!(format_amz_date(&expected), "20130524T000000Z");
    }

    #[test]
    fn test_should_reject_unparseable_date() {
        assert!(matches!(
            parse_request_date("yesterday"),
            Err(AuthError::DateParse(_))
        ));
        assert!(matches!(
            parse_request_date("20130524"),
            Err(AuthError::DateParse(_))
        ));
    }

    #[test]
    fn test_should_build_string_to_sign_matching_aws_example() {
        let scope = CredentialScope::new("20130524", "us-east-1", "s3").unwrap();
        let sts = build_string_to_sign(
            &get_object_canonical_request(),
            "Fri, 24 May 2013 00:00:00 GMT",
            &scope,
        )
        .unwrap();
        let expected = "AWS4-HMAC-SHA256\n\
                        20130524T000000Z\n\
                        20130524/us-east-1/s3/aws4_request\n\
                        7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972";
        assert_eq!(sts, expected);
    }

    #[test]
    fn test_should_fail_string_to_sign_on_bad_date() {
        let scope = CredentialScope::new("20130524", "us-east-1", "s3").unwrap();
        let result = build_string_to_sign(&get_object_canonical_request(), "not a date", &scope);
        assert!(matches!(result, Err(AuthError::DateParse(_))));
    }

    #[test]
    fn test_should_compute_correct_signature_for_aws_get_object_example() {
        let signing_key = derive_signing_key(TEST_SECRET_KEY, "20130524", "us-east-1", "s3");

        let string_to_sign = "AWS4-HMAC-SHA256\n\
                              20130524T000000Z\n\
                              20130524/us-east-1/s3/aws4_request\n\
                              7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972";

        let signature = compute_signature(&signing_key, string_to_sign);
        assert_eq!(
            signature,
            "f0e8bdb87c964420e857bd35b5d6ed310bd44f0170aba48dd91039c6036bdb41"
        );
    }

    #[test]
    fn test_should_verify_signatures_in_constant_time() {
        let sig = "f0e8bdb87c964420e857bd35b5d6ed310bd44f0170aba48dd91039c6036bdb41";
        assert!(verify_signature(sig, sig));
        assert!(!verify_signature(sig, &sig.replace('f', "e")));
        assert!(!verify_signature(sig, &sig[..10]));
    }

    #[test]
    fn test_should_hash_empty_payload() {
        assert_eq!(hash_payload(b""), EMPTY_HASH);
    }

    #[test]
    fn test_should_hash_reader_like_slice() {
        let data = vec![42u8; READ_BUF_SIZE * 2 + 7];
        assert_eq!(
            hash_payload_reader(data.as_slice()).unwrap(),
            hash_payload(&data)
        );
    }
}
