//! SHA-256 tree hash computation for Amazon S3 Glacier.
//!
//! Glacier checks archive integrity with a Merkle tree over 1 MiB chunks:
//!
//! 1. Every consecutive 1 MiB chunk of the body (the last may be shorter) is
//!    hashed with SHA-256 into a leaf.
//! 2. Adjacent pairs of nodes are concatenated and hashed into the next level.
//!    A node left without a partner moves up unchanged.
//! 3. Step 2 repeats until one node remains: the tree hash.
//!
//! Alongside the tree hash, the plain ("linear") SHA-256 of the body is
//! computed over the same bytes.
//!
//! # Usage
//!
//! ```rust
//! use rustack_glacier_treehash::{ChunkHasher, MultiTreeHasher};
//!
//! // Single upload: stream the body through a ChunkHasher.
//! let mut hasher = ChunkHasher::new();
//! hasher.write(b"archive bytes").unwrap();
//! let output = hasher.close();
//! let tree_hash = output.tree_hash.unwrap();
//!
//! // Multipart upload: combine the per-part tree hashes in part order.
//! let mut multi = MultiTreeHasher::new();
//! multi.add(&tree_hash.to_hex()).unwrap();
//! assert_eq!(multi.create_hash(), tree_hash.to_hex());
//! ```
//!
//! # Modules
//!
//! - [`chunk`] - Streaming 1 MiB leaf hasher
//! - [`combine`] - Pairwise leaf reduction
//! - [`error`] - Tree hash error types
//! - [`hash`] - Fixed-size SHA-256 digest value
//! - [`multi`] - Multipart tree hash combination and part-size rules

pub mod chunk;
pub mod combine;
pub mod error;
pub mod hash;
pub mod multi;

pub use chunk::{
    CHUNK_SIZE, ChunkHasher, TreeHashOutput, compute_tree_hash, compute_tree_hash_reader,
};
pub use combine::reduce;
pub use error::TreeHashError;
pub use hash::Sha256Hash;
pub use multi::{MultiTreeHasher, validate_part_size};
