//! Streaming tree hash over 1 MiB chunks.
//!
//! [`ChunkHasher`] splits everything written to it into consecutive 1 MiB
//! chunks, hashes each chunk into a leaf and, in parallel, keeps a running
//! SHA-256 over the whole body. Closing the hasher flushes the final partial
//! chunk and reduces the leaves into the tree hash.
//!
//! Leaves depend only on byte order, never on how the caller slices its
//! writes, so one `write` of N bytes and any split of the same N bytes produce
//! identical results.

use std::io::{self, Read};

use digest::Digest;
use tracing::{debug, trace};

use crate::combine::reduce;
use crate::error::TreeHashError;
use crate::hash::Sha256Hash;

/// Size of a tree hash leaf chunk (1 MiB).
pub const CHUNK_SIZE: usize = 1 << 20;

/// Finalized results of a [`ChunkHasher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeHashOutput {
    /// Root of the leaf tree, or `None` when no bytes were written.
    pub tree_hash: Option<Sha256Hash>,
    /// SHA-256 of the whole body.
    pub linear_hash: Sha256Hash,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Accumulating,
    Closed(TreeHashOutput),
}

/// Incremental tree hash and linear hash calculator.
///
/// A single instance must be fed from one writer at a time; distinct
/// instances share nothing and can run on separate threads.
///
/// # Examples
///
/// ```
/// use rustack_glacier_treehash::{ChunkHasher, Sha256Hash};
///
/// let mut hasher = ChunkHasher::new();
/// hasher.write(b"hello ").unwrap();
/// hasher.write(b"world").unwrap();
/// let output = hasher.close();
///
/// // Under 1 MiB there is a single leaf, so both hashes agree.
/// assert_eq!(output.tree_hash, Some(Sha256Hash::digest(b"hello world")));
/// assert_eq!(output.linear_hash, Sha256Hash::digest(b"hello world"));
/// ```
#[derive(Debug, Clone)]
pub struct ChunkHasher {
    buffer: Vec<u8>,
    leaves: Vec<Sha256Hash>,
    running: sha2::Sha256,
    state: State,
}

impl Default for ChunkHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkHasher {
    /// Create an empty hasher in the accumulating state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(CHUNK_SIZE),
            leaves: Vec::new(),
            running: sha2::Sha256::new(),
            state: State::Accumulating,
        }
    }

    /// Feed more data into the hasher.
    ///
    /// # Errors
    ///
    /// Returns [`TreeHashError::InvalidState`] if the hasher has been closed.
    /// Leaves committed by earlier writes are kept.
    pub fn write(&mut self, data: &[u8]) -> Result<(), TreeHashError> {
        if self.is_closed() {
            return Err(TreeHashError::InvalidState);
        }
        self.absorb(data);
        Ok(())
    }

    /// Buffer `data` and commit every completed chunk. Caller checks the state.
    fn absorb(&mut self, mut data: &[u8]) {
        // Top up a partially filled chunk first.
        if !self.buffer.is_empty() {
            let fill = (CHUNK_SIZE - self.buffer.len()).min(data.len());
            self.buffer.extend_from_slice(&data[..fill]);
            data = &data[fill..];

            if self.buffer.len() < CHUNK_SIZE {
                return;
            }
            commit_leaf(&mut self.leaves, &mut self.running, &self.buffer);
            self.buffer.clear();
        }

        let mut chunks = data.chunks_exact(CHUNK_SIZE);
        for chunk in &mut chunks {
            commit_leaf(&mut self.leaves, &mut self.running, chunk);
        }
        self.buffer.extend_from_slice(chunks.remainder());
    }

    /// Flush the final partial chunk and compute the tree and linear hashes.
    ///
    /// Calling `close` again returns the same output without touching state.
    pub fn close(&mut self) -> TreeHashOutput {
        if let State::Closed(output) = self.state {
            return output;
        }

        if !self.buffer.is_empty() {
            commit_leaf(&mut self.leaves, &mut self.running, &self.buffer);
            self.buffer.clear();
        }

        let running = std::mem::take(&mut self.running);
        let output = TreeHashOutput {
            tree_hash: reduce(&self.leaves),
            linear_hash: Sha256Hash::new(running.finalize().into()),
        };
        self.state = State::Closed(output);

        debug!(
            leaves = self.leaves.len(),
            tree_hash = ?output.tree_hash,
            linear_hash = %output.linear_hash,
            "Closed tree hasher"
        );
        output
    }

    /// Return the hasher to a fresh accumulating state.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.leaves.clear();
        self.running = sha2::Sha256::new();
        self.state = State::Accumulating;
    }

    /// Whether [`close`](Self::close) has been called since the last reset.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed(_))
    }

    /// Number of leaves committed so far.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// The leaves committed so far, in input order.
    #[must_use]
    pub fn leaves(&self) -> &[Sha256Hash] {
        &self.leaves
    }

    /// Both finalized hashes.
    ///
    /// # Errors
    ///
    /// Returns [`TreeHashError::NotReady`] before [`close`](Self::close).
    pub fn output(&self) -> Result<TreeHashOutput, TreeHashError> {
        match self.state {
            State::Closed(output) => Ok(output),
            State::Accumulating => Err(TreeHashError::NotReady),
        }
    }

    /// The root-level tree hash; `None` if nothing was written.
    ///
    /// # Errors
    ///
    /// Returns [`TreeHashError::NotReady`] before [`close`](Self::close).
    pub fn tree_hash(&self) -> Result<Option<Sha256Hash>, TreeHashError> {
        self.output().map(|output| output.tree_hash)
    }

    /// The linear SHA-256 of everything written.
    ///
    /// # Errors
    ///
    /// Returns [`TreeHashError::NotReady`] before [`close`](Self::close).
    pub fn hash(&self) -> Result<Sha256Hash, TreeHashError> {
        self.output().map(|output| output.linear_hash)
    }
}

impl io::Write for ChunkHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ChunkHasher::write(self, buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn commit_leaf(leaves: &mut Vec<Sha256Hash>, running: &mut sha2::Sha256, chunk: &[u8]) {
    leaves.push(Sha256Hash::digest(chunk));
    running.update(chunk);
    trace!(leaf = leaves.len() - 1, len = chunk.len(), "Committed tree hash leaf");
}

/// Compute the tree and linear hashes of an in-memory body.
///
/// # Examples
///
/// ```
/// use rustack_glacier_treehash::compute_tree_hash;
///
/// let output = compute_tree_hash(b"");
/// assert_eq!(output.tree_hash, None);
/// ```
#[must_use]
pub fn compute_tree_hash(data: &[u8]) -> TreeHashOutput {
    let mut hasher = ChunkHasher::new();
    hasher.absorb(data);
    hasher.close()
}

/// Compute the tree and linear hashes of everything `reader` yields.
///
/// # Errors
///
/// Returns any I/O error raised by `reader`.
pub fn compute_tree_hash_reader<R: Read>(mut reader: R) -> io::Result<TreeHashOutput> {
    let mut hasher = ChunkHasher::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hasher.close())
}
