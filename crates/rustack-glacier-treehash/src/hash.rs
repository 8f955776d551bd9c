//! Fixed-size SHA-256 digest value.

use std::fmt;
use std::str::FromStr;

use digest::Digest;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TreeHashError;

/// Length in bytes of a SHA-256 digest.
pub const HASH_LEN: usize = 32;

/// A 32-byte SHA-256 digest.
///
/// Formats as lower-case hex and parses from exactly 64 hex characters
/// (either case). Serializes as a hex string.
///
/// # Examples
///
/// ```
/// use rustack_glacier_treehash::Sha256Hash;
///
/// let hash = Sha256Hash::digest(b"");
/// assert_eq!(
///     hash.to_string(),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha256Hash([u8; HASH_LEN]);

impl Sha256Hash {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn new(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Compute the SHA-256 digest of `data`.
    #[must_use]
    pub fn digest(data: &[u8]) -> Self {
        Self(sha2::Sha256::digest(data).into())
    }

    /// Compute `SHA-256(left || right)`, the parent of two tree nodes.
    #[must_use]
    pub fn combine(left: &Self, right: &Self) -> Self {
        let mut hasher = sha2::Sha256::new();
        hasher.update(left.0);
        hasher.update(right.0);
        Self(hasher.finalize().into())
    }

    /// Decode a 64-character hex string.
    ///
    /// # Errors
    ///
    /// Returns [`TreeHashError::HexDecode`] on wrong length or non-hex characters.
    pub fn from_hex(input: &str) -> Result<Self, TreeHashError> {
        let mut bytes = [0u8; HASH_LEN];
        hex::decode_to_slice(input, &mut bytes)
            .map_err(|e| TreeHashError::HexDecode(format!("{input:?}: {e}")))?;
        Ok(Self(bytes))
    }

    /// Lower-case hex encoding of the digest.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl From<[u8; HASH_LEN]> for Sha256Hash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Sha256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256Hash({})", self.to_hex())
    }
}

impl FromStr for Sha256Hash {
    type Err = TreeHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Sha256Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Sha256Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
