//! Tree hash of a multipart upload built from per-part tree hashes.
//!
//! Each part of a multipart upload has its own tree hash, computed by
//! whoever uploaded that part. As long as every part except the last is a
//! power-of-two multiple of 1 MiB, the part roots are exactly the nodes of the
//! archive's tree at some level, so reducing them in upload order yields the
//! archive tree hash without re-reading any data.

use tracing::debug;

use crate::chunk::CHUNK_SIZE;
use crate::combine::reduce;
use crate::error::TreeHashError;
use crate::hash::Sha256Hash;

/// Largest part size Glacier accepts (4 GiB).
pub const MAX_PART_SIZE: u64 = 4 << 30;

/// Accumulates per-part tree hashes and combines them into the archive root.
///
/// Parts must be added in the order they appear in the archive.
///
/// # Examples
///
/// ```
/// use rustack_glacier_treehash::{MultiTreeHasher, compute_tree_hash};
///
/// let part = compute_tree_hash(b"only part").tree_hash.unwrap();
///
/// let mut multi = MultiTreeHasher::new();
/// assert_eq!(multi.create_hash(), "");
///
/// multi.add(&part.to_hex()).unwrap();
/// assert_eq!(multi.create_hash(), part.to_hex());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultiTreeHasher {
    nodes: Vec<Sha256Hash>,
}

impl MultiTreeHasher {
    /// Create an empty multipart hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hex-encoded part tree hash.
    ///
    /// # Errors
    ///
    /// Returns [`TreeHashError::HexDecode`] unless `hex_digest` is exactly 64
    /// hex characters. Nothing is appended on error.
    pub fn add(&mut self, hex_digest: &str) -> Result<(), TreeHashError> {
        let hash = Sha256Hash::from_hex(hex_digest)?;
        self.add_hash(hash);
        Ok(())
    }

    /// Append an already decoded part tree hash.
    pub fn add_hash(&mut self, hash: Sha256Hash) {
        self.nodes.push(hash);
        debug!(part = self.nodes.len(), %hash, "Added part tree hash");
    }

    /// Number of parts added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no parts have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The hex-encoded archive tree hash, or an empty string if no parts were added.
    #[must_use]
    pub fn create_hash(&self) -> String {
        reduce(&self.nodes).map_or_else(String::new, |root| root.to_hex())
    }
}

/// Check that `size` is a valid Glacier multipart part size.
///
/// Valid sizes are 1 MiB multiplied by a power of two, from 1 MiB up to 4 GiB.
/// Parts of such sizes keep every part boundary aligned with the archive tree.
///
/// # Errors
///
/// Returns [`TreeHashError::InvalidPartSize`] for any other size.
///
/// # Examples
///
/// ```
/// use rustack_glacier_treehash::validate_part_size;
///
/// assert!(validate_part_size(8 << 20).is_ok());
/// assert!(validate_part_size(3 << 20).is_err());
/// ```
pub fn validate_part_size(size: u64) -> Result<(), TreeHashError> {
    let chunk = CHUNK_SIZE as u64;
    let aligned = size >= chunk && size <= MAX_PART_SIZE && size % chunk == 0;
    if aligned && (size / chunk).is_power_of_two() {
        Ok(())
    } else {
        Err(TreeHashError::InvalidPartSize(size))
    }
}
