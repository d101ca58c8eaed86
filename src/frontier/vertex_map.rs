//! Per-vertex operations over a subset

use super::subset::VertexSubset;
use rayon::prelude::*;

/// Apply `f` to every member of `subset` in parallel
///
/// `f` runs exactly once per member; order is unspecified.
///
/// # Example
///
/// ```
/// use frontier_graph::frontier::vertex_map;
/// use frontier_graph::VertexSubset;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// let sum = AtomicU32::new(0);
/// let subset = VertexSubset::from_members(vec![1, 4, 7], 10).unwrap();
/// vertex_map(&subset, |v| {
///     sum.fetch_add(v, Ordering::Relaxed);
/// });
/// assert_eq!(sum.into_inner(), 12);
/// ```
pub fn vertex_map<F>(subset: &VertexSubset, f: F)
where
    F: Fn(u32) + Sync + Send,
{
    subset.par_iter().for_each(f);
}

/// Members of `subset` satisfying `pred`, in the same representation
#[must_use]
pub fn vertex_filter<P>(subset: &VertexSubset, pred: P) -> VertexSubset
where
    P: Fn(u32) -> bool + Sync + Send,
{
    let universe = subset.universe();
    let kept: Vec<u32> = subset.par_iter().filter(|&v| pred(v)).collect();
    let filtered = VertexSubset::from_unique(kept, universe);
    if subset.is_dense() {
        filtered.into_dense()
    } else {
        filtered
    }
}
