//! Ranking utilities over centrality maps.
//!
//! The centrality functions return full score maps; these helpers are for callers that want the
//! leading nodes or a probability-scaled view. Nothing inside the crate depends on them.

use ordered_float::NotNan;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

/// The `k` highest finite, positive scores, best first. Ties are broken by key order so the
/// result does not depend on map iteration order.
pub fn top_k<K: Copy + Ord + Hash>(scores: &HashMap<K, f64>, k: usize) -> Vec<(K, f64)> {
    if k == 0 || scores.is_empty() {
        return Vec::new();
    }
    let mut heap = BinaryHeap::with_capacity(k + 1);
    for (&key, &score) in scores {
        if !score.is_finite() || score <= 0.0 {
            continue;
        }
        let Ok(s) = NotNan::new(score) else { continue };
        // Min-heap on (score, reversed key): the root is the entry to evict.
        heap.push(Reverse((s, Reverse(key))));
        if heap.len() > k {
            heap.pop();
        }
    }
    let mut results: Vec<(NotNan<f64>, K)> = heap.into_iter().map(|Reverse((s, Reverse(key)))| (s, key)).collect();
    results.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    results.into_iter().map(|(s, key)| (key, s.into_inner())).collect()
}

/// Scale scores in place to sum to 1. Maps with no positive mass are left alone.
pub fn normalize<K>(scores: &mut HashMap<K, f64>) {
    let sum: f64 = scores.values().sum();
    if sum > 0.0 {
        for s in scores.values_mut() {
            *s /= sum;
        }
    }
}
