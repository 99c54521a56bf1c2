//! Sorted index-set utilities.
//!
//! Index collections are kept as sorted, deduplicated `Vec<usize>` so set
//! algebra runs in linear time.

use std::collections::BTreeSet;

pub type Indices = Vec<usize>;

/// `[0, 1, ..., n-1]`
pub fn range(n: usize) -> Indices {
    (0..n).collect()
}

/// Sort and deduplicate an arbitrary index collection.
pub fn normalize<I: IntoIterator<Item = usize>>(items: I) -> Indices {
    items.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Sorted union of two collections.
pub fn unify(a: &[usize], b: &[usize]) -> Indices {
    normalize(a.iter().chain(b.iter()).copied())
}

/// Elements of `a` not present in `b`, sorted.
pub fn difference(a: &[usize], b: &[usize]) -> Indices {
    let exclude: BTreeSet<usize> = b.iter().copied().collect();
    normalize(a.iter().copied().filter(|i| !exclude.contains(i)))
}

/// Elements present in both `a` and `b`, sorted.
pub fn intersect(a: &[usize], b: &[usize]) -> Indices {
    let keep: BTreeSet<usize> = b.iter().copied().collect();
    normalize(a.iter().copied().filter(|i| keep.contains(i)))
}

pub fn is_disjoint(a: &[usize], b: &[usize]) -> bool {
    intersect(a, b).is_empty()
}
