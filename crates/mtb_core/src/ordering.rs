//! Stable ordering helpers.
//!
//! Topological order ties, edge sets, and evidence re-serialization all need
//! a single unambiguous order. We standardize on byte-wise lexicographic
//! ordering of string ids everywhere rather than inventing a new comparator
//! per call site.

use std::cmp::Ordering;

/// Types that expose a total order key for deterministic sorting.
pub trait StableOrd {
    type Key: Ord;
    fn stable_key(&self) -> Self::Key;
}

/// Sort any slice of `StableOrd` items by their stable key.
pub fn sort_stable<T: StableOrd>(items: &mut [T]) {
    items.sort_by(|a, b| a.stable_key().cmp(&b.stable_key()));
}

/// Compare two node ids lexicographically (byte-wise, not locale-aware).
pub fn cmp_ids(a: &str, b: &str) -> Ordering {
    a.as_bytes().cmp(b.as_bytes())
}

/// Sort a set of ids in place, ascending lexicographic order.
pub fn sort_ids(ids: &mut [String]) {
    ids.sort_by(|a, b| cmp_ids(a, b));
}
