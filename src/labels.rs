// Set helpers for label reconciliation

use crate::models::LabelId;
use std::collections::BTreeSet;

/// Elements of `a` that are not present in `b`
///
/// Both inputs are treated as sets: duplicates in `a` are yielded once.
/// Output follows first-occurrence order in `a`, but callers should only
/// rely on membership.
pub fn difference<T, A, B>(a: A, b: B) -> Vec<T>
where
    T: Ord + Clone,
    A: IntoIterator<Item = T>,
    B: IntoIterator<Item = T>,
{
    let exclude: BTreeSet<T> = b.into_iter().collect();
    let mut seen = BTreeSet::new();

    a.into_iter()
        .filter(|item| !exclude.contains(item) && seen.insert(item.clone()))
        .collect()
}

/// Sorted, distinct label ids
pub fn dedup_labels<I>(labels: I) -> Vec<LabelId>
where
    I: IntoIterator<Item = LabelId>,
{
    labels.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}
