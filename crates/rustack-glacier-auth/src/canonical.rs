//! Canonical request construction for AWS Signature Version 4.
//!
//! The canonical request is the newline-separated serialization every signer
//! and verifier must agree on byte for byte:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n
//! \n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Every request header is signed, plus a `host` header synthesized from the
//! request host when the caller did not supply one.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

use percent_encoding::{
    AsciiSet, NON_ALPHANUMERIC, percent_decode, percent_decode_str, percent_encode,
};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::AuthError;
use crate::sigv4::hash_payload_reader;

/// The set of characters that must be percent-encoded in path segments and
/// query components.
///
/// Everything except the RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) is encoded.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The parts of an HTTP request that take part in signing.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalInput<'a> {
    /// HTTP method, in any case.
    pub method: &'a str,
    /// Request path, raw or percent-encoded.
    pub path: &'a str,
    /// Raw query string without the leading `?`.
    pub query: &'a str,
    /// Request headers; names may repeat and may differ in case.
    pub headers: &'a [(&'a str, &'a str)],
    /// Request host, used when `headers` carries no `host` entry.
    pub host: &'a str,
}

/// A fully built canonical request.
///
/// Immutable once built; the rendered bytes are what gets hashed into the
/// string to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    method: String,
    uri: String,
    query: String,
    headers: String,
    signed_headers: Vec<String>,
    payload_hash: String,
    rendered: String,
}

impl CanonicalRequest {
    /// The upper-cased HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The canonical URI path.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The canonical query string.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The canonical header block, one `name:value\n` line per header.
    #[must_use]
    pub fn headers(&self) -> &str {
        &self.headers
    }

    /// The sorted, lower-case names of the signed headers.
    #[must_use]
    pub fn signed_headers(&self) -> &[String] {
        &self.signed_headers
    }

    /// The signed header names joined with `;`.
    #[must_use]
    pub fn signed_headers_string(&self) -> String {
        build_signed_headers_string(&self.signed_headers)
    }

    /// The hex SHA-256 of the request body (or the caller-supplied payload hash).
    #[must_use]
    pub fn payload_hash(&self) -> &str {
        &self.payload_hash
    }

    /// The rendered canonical request.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    /// The rendered canonical request as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.rendered.as_bytes()
    }

    /// The hex SHA-256 of the rendered canonical request.
    #[must_use]
    pub fn hash(&self) -> String {
        hex::encode(Sha256::digest(self.rendered.as_bytes()))
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Build the canonical request, hashing the whole body read from `body`.
///
/// The query string is validated before the body is read.
///
/// # Errors
///
/// Returns [`AuthError::Encoding`] for a malformed query string and
/// [`AuthError::Io`] if the body cannot be read in full.
pub fn build_canonical_request<R: Read>(
    input: &CanonicalInput<'_>,
    body: R,
) -> Result<CanonicalRequest, AuthError> {
    let query = build_canonical_query_string(input.query)?;
    let payload_hash = hash_payload_reader(body)?;
    Ok(assemble(input, query, payload_hash))
}

/// Build the canonical request with a precomputed payload hash.
///
/// Use this for bodies hashed elsewhere or for literal payload markers such
/// as `UNSIGNED-PAYLOAD`.
///
/// # Errors
///
/// Returns [`AuthError::Encoding`] for a malformed query string.
///
/// # Examples
///
/// ```
/// use rustack_glacier_auth::canonical::{CanonicalInput, build_canonical_request_with_payload_hash};
///
/// let input = CanonicalInput {
///     method: "get",
///     path: "/test.txt",
///     query: "",
///     headers: &[],
///     host: "examplebucket.s3.amazonaws.com",
/// };
/// let canonical = build_canonical_request_with_payload_hash(
///     &input,
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
/// )
/// .unwrap();
/// assert!(canonical.as_str().starts_with("GET\n/test.txt\n\nhost:examplebucket.s3.amazonaws.com\n\nhost\n"));
/// ```
pub fn build_canonical_request_with_payload_hash(
    input: &CanonicalInput<'_>,
    payload_hash: &str,
) -> Result<CanonicalRequest, AuthError> {
    let query = build_canonical_query_string(input.query)?;
    Ok(assemble(input, query, payload_hash.to_owned()))
}

fn assemble(input: &CanonicalInput<'_>, query: String, payload_hash: String) -> CanonicalRequest {
    let method = input.method.to_ascii_uppercase();
    let uri = build_canonical_uri(input.path);
    let (headers, signed_headers) = build_canonical_headers(input.headers, input.host);
    let signed_headers_str = build_signed_headers_string(&signed_headers);

    let rendered =
        format!("{method}\n{uri}\n{query}\n{headers}\n{signed_headers_str}\n{payload_hash}");
    debug!(canonical_request = %rendered, "Built canonical request");

    CanonicalRequest {
        method,
        uri,
        query,
        headers,
        signed_headers,
        payload_hash,
        rendered,
    }
}

/// Build the canonical URI.
///
/// The path is first normalized: empty and `.` segments are dropped and `..`
/// removes the preceding segment. Each remaining segment is percent-decoded
/// and re-encoded so raw and already-encoded paths produce the same result. A
/// trailing slash survives unless the path normalizes to `/`.
///
/// # Examples
///
/// ```
/// use rustack_glacier_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/-/vaults/examplevault"), "/-/vaults/examplevault");
/// assert_eq!(build_canonical_uri("/a/./b/../c/"), "/a/c/");
/// assert_eq!(build_canonical_uri(""), "/");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_owned();
    }

    let mut canonical = String::with_capacity(path.len() + 1);
    for segment in segments {
        let decoded: Vec<u8> = percent_decode_str(segment).collect();
        canonical.push('/');
        canonical.extend(percent_encode(&decoded, URI_ENCODE_SET));
    }
    if path.ends_with('/') {
        canonical.push('/');
    }
    canonical
}

/// Build the canonical query string.
///
/// Each `key=value` pair is form-decoded (`+` is a space) and re-encoded with
/// the unreserved character set, then pairs are sorted by encoded key and,
/// for repeated keys, by encoded value.
///
/// # Errors
///
/// Returns [`AuthError::Encoding`] if a `%` is not followed by two hex digits.
///
/// # Examples
///
/// ```
/// use rustack_glacier_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(build_canonical_query_string("").unwrap(), "");
/// assert_eq!(build_canonical_query_string("b=2&a=1&a=3").unwrap(), "a=1&a=3&b=2");
/// ```
pub fn build_canonical_query_string(query: &str) -> Result<String, AuthError> {
    let mut params: Vec<(String, String)> = Vec::new();
    for param in query.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = param.split_once('=').unwrap_or((param, ""));
        params.push((
            encode_component(&decode_query_component(key)?),
            encode_component(&decode_query_component(value)?),
        ));
    }

    params.sort_unstable();

    Ok(params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&"))
}

/// Build the canonical header block and the sorted signed header names.
///
/// Header names are trimmed and lower-cased; values are trimmed with inner
/// whitespace runs collapsed. Repeated headers are merged into one line with
/// their values sorted and comma-joined. A `host` header is added from `host`
/// when none is present.
///
/// # Examples
///
/// ```
/// use rustack_glacier_auth::canonical::build_canonical_headers;
///
/// let (block, signed) = build_canonical_headers(
///     &[("X-Amz-Date", "20120525T002453Z")],
///     "glacier.us-east-1.amazonaws.com",
/// );
/// assert_eq!(block, "host:glacier.us-east-1.amazonaws.com\nx-amz-date:20120525T002453Z\n");
/// assert_eq!(signed, vec!["host", "x-amz-date"]);
/// ```
#[must_use]
pub fn build_canonical_headers(headers: &[(&str, &str)], host: &str) -> (String, Vec<String>) {
    let mut header_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        header_map
            .entry(name.trim().to_ascii_lowercase())
            .or_default()
            .push(collapse_whitespace(value.trim()));
    }
    header_map
        .entry("host".to_owned())
        .or_insert_with(|| vec![host.trim().to_owned()]);

    let mut block = String::new();
    for (name, values) in &mut header_map {
        values.sort_unstable();
        block.push_str(name);
        block.push(':');
        block.push_str(&values.join(","));
        block.push('\n');
    }

    (block, header_map.into_keys().collect())
}

/// Build the signed headers string as a semicolon-separated list of header names.
///
/// # Examples
///
/// ```
/// use rustack_glacier_auth::canonical::build_signed_headers_string;
///
/// let names = vec!["host".to_owned(), "x-amz-date".to_owned()];
/// assert_eq!(build_signed_headers_string(&names), "host;x-amz-date");
/// ```
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[String]) -> String {
    signed_headers.join(";")
}

/// Percent-encode raw bytes using the SigV4 unreserved set.
fn encode_component(input: &[u8]) -> String {
    percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Form-decode one query component, rejecting malformed escapes.
fn decode_query_component(input: &str) -> Result<Vec<u8>, AuthError> {
    let bytes = input.as_bytes();
    for (i, _) in input.match_indices('%') {
        let escape = bytes.get(i + 1..i + 3);
        if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
            return Err(AuthError::Encoding(format!(
                "invalid percent-escape at byte {i} in {input:?}"
            )));
        }
    }

    let spaced = input.replace('+', " ");
    Ok(percent_decode(spaced.as_bytes()).collect())
}

/// Collapse consecutive whitespace characters in a string to a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    const EMPTY_HASH: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn input<'a>(path: &'a str, query: &'a str, headers: &'a [(&'a str, &'a str)]) -> CanonicalInput<'a> {
        CanonicalInput {
            method: "GET",
            path,
            query,
            headers,
            host: "example.com",
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "source closed"))
        }
    }

    #[test]
    fn test_should_build_canonical_uri_for_simple_path() {
        assert_eq!(build_canonical_uri("/test.txt"), "/test.txt");
    }

    #[test]
    fn test_should_normalize_empty_path_to_slash() {
        assert_eq!(build_canonical_uri(""), "/");
        assert_eq!(build_canonical_uri("/"), "/");
        assert_eq!(build_canonical_uri("/./"), "/");
        assert_eq!(build_canonical_uri("/a/../"), "/");
    }

    #[test]
    fn test_should_remove_dot_segments_and_keep_trailing_slash() {
        assert_eq!(build_canonical_uri("/a/./b/../c/"), "/a/c/");
        assert_eq!(build_canonical_uri("//foo//bar"), "/foo/bar");
        assert_eq!(build_canonical_uri("/foo/bar/"), "/foo/bar/");
        assert_eq!(build_canonical_uri("/../x"), "/x");
    }

    #[test]
    fn test_should_encode_special_characters_in_path() {
        assert_eq!(build_canonical_uri("/hello world"), "/hello%20world");
        assert_eq!(build_canonical_uri("/caf\u{e9}"), "/caf%C3%A9");
        assert_eq!(build_canonical_uri("/a:b"), "/a%3Ab");
    }

    #[test]
    fn test_should_not_double_encode_uri_path() {
        assert_eq!(build_canonical_uri("/hello%20world"), "/hello%20world");
        assert_eq!(
            build_canonical_uri("/hello world"),
            build_canonical_uri("/hello%20world")
        );
    }

    #[test]
    fn test_should_sort_query_parameters_by_key_then_value() {
        assert_eq!(
            build_canonical_query_string("b=2&a=1&a=3").unwrap(),
            "a=1&a=3&b=2"
        );
        assert_eq!(
            build_canonical_query_string("a=3&b=2&a=1").unwrap(),
            "a=1&a=3&b=2"
        );
    }

    #[test]
    fn test_should_return_empty_for_empty_query() {
        assert_eq!(build_canonical_query_string("").unwrap(), "");
        assert_eq!(build_canonical_query_string("&&").unwrap(), "");
    }

    #[test]
    fn test_should_reencode_query_components() {
        assert_eq!(
            build_canonical_query_string("path=/x:y&flag").unwrap(),
            "flag=&path=%2Fx%3Ay"
        );
        assert_eq!(
            build_canonical_query_string("q=a+b&r=a%20b").unwrap(),
            "q=a%20b&r=a%20b"
        );
        assert_eq!(
            build_canonical_query_string("marker=%7e%2d").unwrap(),
            "marker=~-"
        );
    }

    #[test]
    fn test_should_keep_encoded_plus_distinct_from_space() {
        assert_eq!(
            build_canonical_query_string("a=1%2B2&b=1+2").unwrap(),
            "a=1%2B2&b=1%202"
        );
        assert_eq!(
            build_canonical_query_string("k=%E2%9C%93").unwrap(),
            "k=%E2%9C%93"
        );
    }

    #[test]
    fn test_should_reject_malformed_percent_escape() {
        assert!(matches!(
            build_canonical_query_string("a=%zz"),
            Err(AuthError::Encoding(_))
        ));
        assert!(matches!(
            build_canonical_query_string("a=%2"),
            Err(AuthError::Encoding(_))
        ));
        assert!(matches!(
            build_canonical_query_string("%=1"),
            Err(AuthError::Encoding(_))
        ));
        assert!(matches!(
            build_canonical_query_string("a=%%41"),
            Err(AuthError::Encoding(_))
        ));
    }

    #[test]
    fn test_should_build_canonical_headers_sorted_and_lowercased() {
        let headers = [
            ("Range", "bytes=0-9"),
            ("x-amz-content-sha256", EMPTY_HASH),
            ("X-Amz-Date", "20130524T000000Z"),
        ];
        let (block, signed) = build_canonical_headers(&headers, "examplebucket.s3.amazonaws.com");
        let expected = "host:examplebucket.s3.amazonaws.com\n\
                        range:bytes=0-9\n\
                        x-amz-content-sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n\
                        x-amz-date:20130524T000000Z\n";
        assert_eq!(block, expected);
        assert_eq!(
            signed,
            vec!["host", "range", "x-amz-content-sha256", "x-amz-date"]
        );
    }

    #[test]
    fn test_should_merge_headers_differing_only_in_case() {
        let headers = [
            ("X-Amz-Date", "20130524T000000Z"),
            ("x-amz-date", "20120101T000000Z"),
        ];
        let (block, signed) = build_canonical_headers(&headers, "example.com");
        assert_eq!(
            block,
            "host:example.com\nx-amz-date:20120101T000000Z,20130524T000000Z\n"
        );
        assert_eq!(signed, vec!["host", "x-amz-date"]);
    }

    #[test]
    fn test_should_prefer_explicit_host_header() {
        let headers = [(" Host ", "explicit.example.com")];
        let (block, signed) = build_canonical_headers(&headers, "ignored.example.com");
        assert_eq!(block, "host:explicit.example.com\n");
        assert_eq!(signed, vec!["host"]);
    }

    #[test]
    fn test_should_collapse_whitespace_in_header_values() {
        let headers = [("Host", "  example.com  "), ("X-Custom", "a   b   c")];
        let (block, _) = build_canonical_headers(&headers, "");
        assert_eq!(block, "host:example.com\nx-custom:a b c\n");
    }

    #[test]
    fn test_should_build_canonical_request_matching_aws_example() {
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

        let canonical = build_canonical_request(&input, io::empty()).unwrap();

        let expected = "GET\n\
                        /test.txt\n\
                        \n\
                        host:examplebucket.s3.amazonaws.com\n\
                        range:bytes=0-9\n\
                        x-amz-content-sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n\
                        x-amz-date:20130524T000000Z\n\
                        \n\
                        host;range;x-amz-content-sha256;x-amz-date\n\
                        e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        assert_eq!(canonical.as_str(), expected);
        assert_eq!(
            canonical.hash(),
            "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972"
        );
    }

    #[test]
    fn test_should_build_canonical_request_matching_glacier_example() {
        let headers = [
            ("x-amz-date", "20120525T002453Z"),
            ("x-amz-glacier-version", "2012-06-01"),
        ];
        let input = CanonicalInput {
            method: "put",
            path: "/-/vaults/examplevault",
            query: "",
            headers: &headers,
            host: "glacier.us-east-1.amazonaws.com",
        };

        let canonical = build_canonical_request(&input, &b""[..]).unwrap();
        assert_eq!(canonical.method(), "PUT");
        assert_eq!(canonical.uri(), "/-/vaults/examplevault");
        assert_eq!(canonical.query(), "");
        assert_eq!(
            canonical.signed_headers_string(),
            "host;x-amz-date;x-amz-glacier-version"
        );
        assert_eq!(canonical.payload_hash(), EMPTY_HASH);
        assert_eq!(
            canonical.hash(),
            "5f1da1a2d0feb614dd03d71e87928b8e449ac87614479332aced3a701f916743"
        );
    }

    #[test]
    fn test_should_hash_request_body() {
        let canonical = build_canonical_request(&input("/", "", &[]), &b"payload"[..]).unwrap();
        assert_eq!(
            canonical.payload_hash(),
            hex::encode(Sha256::digest(b"payload"))
        );
        assert!(canonical.as_str().ends_with(canonical.payload_hash()));
    }

    #[test]
    fn test_should_be_deterministic() {
        let headers = [("X-B", "2"), ("x-a", "1"), ("X-B", "1")];
        let first = build_canonical_request(&input("/v/./x", "z=1&y=2", &headers), &b"body"[..])
            .unwrap();
        let second = build_canonical_request(&input("/v/./x", "z=1&y=2", &headers), &b"body"[..])
            .unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(first.to_string(), first.as_str());
    }

    #[test]
    fn test_should_fail_on_unreadable_body() {
        let result = build_canonical_request(&input("/", "", &[]), FailingReader);
        assert!(matches!(result, Err(AuthError::Io(_))));
    }

    #[test]
    fn test_should_fail_on_bad_query_before_reading_body() {
        let result = build_canonical_request(&input("/", "a=%g0", &[]), FailingReader);
        assert!(matches!(result, Err(AuthError::Encoding(_))));
    }
}
