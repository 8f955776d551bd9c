//! Pairwise reduction of leaf digests into a tree hash root.
//!
//! ```text
//! level 0:  L0   L1   L2   L3   L4
//! level 1:  H(L0‖L1)  H(L2‖L3)  L4
//! level 2:  H(H01‖H23)          L4
//! level 3:  H(H0123‖L4)
//! ```
//!
//! An unpaired trailing node moves up a level unchanged. It is never hashed
//! with itself.

use crate::hash::Sha256Hash;

/// Reduce an ordered sequence of digests to its tree hash root.
///
/// Returns `None` for an empty sequence. A single digest is returned as-is.
///
/// # Examples
///
/// ```
/// use rustack_glacier_treehash::{Sha256Hash, reduce};
///
/// let a = Sha256Hash::digest(b"a");
/// let b = Sha256Hash::digest(b"b");
///
/// assert_eq!(reduce(&[]), None);
/// assert_eq!(reduce(&[a]), Some(a));
/// assert_eq!(reduce(&[a, b]), Some(Sha256Hash::combine(&a, &b)));
/// ```
#[must_use]
pub fn reduce(leaves: &[Sha256Hash]) -> Option<Sha256Hash> {
    let mut level = match leaves {
        [] => return None,
        [single] => return Some(*single),
        _ => leaves.to_vec(),
    };

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => Sha256Hash::combine(left, right),
                // odd node out
                _ => pair[0],
            })
            .collect();
    }

    level.first().copied()
}
