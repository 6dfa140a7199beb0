//! Edge weighting policies.
//!
//! A policy is a pure function of the graph producing a weight per edge ([`EdgeWeights`]);
//! [`WeightingPolicy::apply`] writes that table into the graph's weight side table. Policies
//! compose by wrapping: [`Probability`] normalizes whatever its inner policy produced,
//! [`Evidence`] flags or removes edges on top of an inner policy.
//!
//! Public invariant:
//! - Applying a policy twice to an otherwise unmodified graph gives the same weights, as long
//!   as the innermost policy does not read the current weights ([`Current`] does).
//! - Flagged edges carry [`UNSUPPORTED_WEIGHT`]; weighted searches reject them with
//!   `Error::NegativeWeight` instead of treating them as negative costs.

use crate::graph::{BioGraph, EdgeId, EdgeView, NodeId, Vertex};
use crate::{Error, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::hash::Hash;

/// Weight assigned to edges an evidence filter could not support.
pub const UNSUPPORTED_WEIGHT: f64 = -1.0;

pub type EdgeWeights = HashMap<EdgeId, f64>;

pub trait WeightingPolicy<N: Vertex, E: Clone> {
    /// Weight for every edge of `graph`. Edges missing from the table keep their weight.
    fn weights(&self, graph: &BioGraph<N, E>) -> Result<EdgeWeights>;

    fn apply(&self, graph: &mut BioGraph<N, E>) -> Result<()> {
        let table = self.weights(graph)?;
        for (edge, weight) in table {
            graph.set_weight(edge, weight)?;
        }
        Ok(())
    }
}

/// Every edge weighs `1.0` (hop counting).
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniform;

impl<N: Vertex, E: Clone> WeightingPolicy<N, E> for Uniform {
    fn weights(&self, graph: &BioGraph<N, E>) -> Result<EdgeWeights> {
        Ok(graph.edge_ids().map(|e| (e, 1.0)).collect())
    }
}

/// The weights already stored on the graph. Mostly useful as the inner policy of a wrapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct Current;

impl<N: Vertex, E: Clone> WeightingPolicy<N, E> for Current {
    fn weights(&self, graph: &BioGraph<N, E>) -> Result<EdgeWeights> {
        Ok(graph.edge_views().map(|e| (e.id, e.weight)).collect())
    }
}

/// `degree(target) ^ exponent`. An exponent of `-1.0` is the classic inverse-degree weighting
/// (entering a hub is cheap); `1.0` penalizes hubs instead.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DegreeWeight {
    pub exponent: f64,
}

impl Default for DegreeWeight {
    fn default() -> Self {
        Self { exponent: -1.0 }
    }
}

impl<N: Vertex, E: Clone> WeightingPolicy<N, E> for DegreeWeight {
    fn weights(&self, graph: &BioGraph<N, E>) -> Result<EdgeWeights> {
        if !self.exponent.is_finite() {
            return Err(Error::InvalidParameter(format!("degree exponent {}", self.exponent)));
        }
        let mut degree: HashMap<NodeId, f64> = HashMap::new();
        Ok(graph
            .edge_views()
            .map(|e| {
                let d = *degree.entry(e.target).or_insert_with(|| graph.degree(e.target) as f64);
                (e.id, d.max(1.0).powf(self.exponent))
            })
            .collect())
    }
}

/// Secondary edge score as weight; edges without a score get `default`.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FromScore {
    pub default: f64,
}

impl Default for FromScore {
    fn default() -> Self {
        Self { default: 1.0 }
    }
}

impl<N: Vertex, E: Clone> WeightingPolicy<N, E> for FromScore {
    fn weights(&self, graph: &BioGraph<N, E>) -> Result<EdgeWeights> {
        Ok(graph.edge_views().map(|e| (e.id, e.score.unwrap_or(self.default))).collect())
    }
}

/// Weight computed from each edge by a closure.
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F>(pub F);

impl<N, E, F> WeightingPolicy<N, E> for FromFn<F>
where
    N: Vertex,
    E: Clone,
    F: Fn(EdgeView<'_, E>) -> f64,
{
    fn weights(&self, graph: &BioGraph<N, E>) -> Result<EdgeWeights> {
        Ok(graph.edge_views().map(|e| (e.id, (self.0)(e))).collect())
    }
}

/// Externally computed similarity of the two endpoints (e.g. a fingerprint score in `[0, 1]`).
///
/// With `as_distance`, the weight is `1 - similarity` clamped at zero, so similar compounds are
/// close. Pairs the closure has no value for get `missing`.
#[derive(Debug, Clone, Copy)]
pub struct Similarity<F> {
    pub similarity: F,
    pub as_distance: bool,
    pub missing: f64,
}

impl<F> Similarity<F> {
    pub fn new(similarity: F) -> Self {
        Self { similarity, as_distance: false, missing: 1.0 }
    }

    pub fn distance(similarity: F) -> Self {
        Self { similarity, as_distance: true, missing: 1.0 }
    }
}

impl<N, E, F> WeightingPolicy<N, E> for Similarity<F>
where
    N: Vertex,
    E: Clone,
    F: Fn(&N, &N) -> Option<f64>,
{
    fn weights(&self, graph: &BioGraph<N, E>) -> Result<EdgeWeights> {
        let mut out = EdgeWeights::with_capacity(graph.edge_count());
        for e in graph.edge_views() {
            let (Some(s), Some(t)) = (graph.node(e.source), graph.node(e.target)) else { continue };
            let w = match (self.similarity)(s, t) {
                Some(sim) if self.as_distance => (1.0 - sim).max(0.0),
                Some(sim) => sim,
                None => self.missing,
            };
            out.insert(e.id, w);
        }
        Ok(out)
    }
}

/// Per-source probabilities: the outgoing weights of every node are scaled to sum to 1.
///
/// Only positive finite weights count as mass. A node whose outgoing mass is zero gets `1.0`
/// on each eligible edge. Flagged edges (negative weights) pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Probability<P>(pub P);

impl<N, E, P> WeightingPolicy<N, E> for Probability<P>
where
    N: Vertex,
    E: Clone,
    P: WeightingPolicy<N, E>,
{
    fn weights(&self, graph: &BioGraph<N, E>) -> Result<EdgeWeights> {
        let mut table = self.0.weights(graph)?;
        for node in graph.node_ids() {
            let out = graph.outgoing(node);
            normalize_group(graph, &mut table, &out, 1.0);
        }
        Ok(table)
    }
}

/// Per-source probabilities where each group of outgoing edges (typically one group per
/// reaction) receives an equal share of the mass, split within the group in proportion to the
/// inner weights.
#[derive(Debug, Clone, Copy)]
pub struct ReactionGrouped<P, G> {
    pub inner: P,
    pub group: G,
}

impl<N, E, P, G, K> WeightingPolicy<N, E> for ReactionGrouped<P, G>
where
    N: Vertex,
    E: Clone,
    P: WeightingPolicy<N, E>,
    G: Fn(&E) -> K,
    K: Hash + Eq,
{
    fn weights(&self, graph: &BioGraph<N, E>) -> Result<EdgeWeights> {
        let mut table = self.inner.weights(graph)?;
        for node in graph.node_ids() {
            let mut order: Vec<K> = Vec::new();
            let mut groups: HashMap<K, Vec<EdgeId>> = HashMap::new();
            for e in graph.outgoing(node) {
                let Some(payload) = graph.edge(e) else { continue };
                let key = (self.group)(payload);
                if !groups.contains_key(&key) {
                    order.push((self.group)(payload));
                }
                groups.entry(key).or_default().push(e);
            }
            if groups.is_empty() {
                continue;
            }
            let share = 1.0 / groups.len() as f64;
            for key in &order {
                if let Some(edges) = groups.get(key) {
                    normalize_group(graph, &mut table, edges, share);
                }
            }
        }
        Ok(table)
    }
}

/// Scale the eligible weights of `edges` to sum to `mass`; zero mass falls back to `1.0` per
/// edge when `mass` is a whole node's share, or an equal split of `mass` inside a group.
fn normalize_group<N: Vertex, E: Clone>(graph: &BioGraph<N, E>, table: &mut EdgeWeights, edges: &[EdgeId], mass: f64) {
    let current = |table: &EdgeWeights, e: EdgeId| table.get(&e).copied().or_else(|| graph.weight(e));
    let eligible: Vec<EdgeId> = edges
        .iter()
        .copied()
        .filter(|&e| current(table, e).is_some_and(|w| w >= 0.0 && w.is_finite()))
        .collect();
    let total: f64 = eligible.iter().filter_map(|&e| current(table, e)).sum();
    if eligible.is_empty() {
        return;
    }
    if total > 0.0 {
        for e in eligible {
            if let Some(w) = current(table, e) {
                table.insert(e, mass * w / total);
            }
        }
    } else {
        let each = if mass >= 1.0 { 1.0 } else { mass / eligible.len() as f64 };
        for e in eligible {
            table.insert(e, each);
        }
    }
}

/// What an evidence filter does with edges it cannot support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unsupported {
    /// Keep the edge with weight [`UNSUPPORTED_WEIGHT`].
    Flag,
    /// Drop the edge from the graph on `apply`.
    #[default]
    Remove,
}

/// Inner policy restricted to edges `supported` accepts.
///
/// `weights` always reports unsupported edges with [`UNSUPPORTED_WEIGHT`]; `apply` either
/// writes that sentinel or removes the edges, per `mode`.
#[derive(Debug, Clone, Copy)]
pub struct Evidence<P, F> {
    pub inner: P,
    pub supported: F,
    pub mode: Unsupported,
}

impl<P, F> Evidence<P, F> {
    pub fn new(inner: P, supported: F) -> Self {
        Self { inner, supported, mode: Unsupported::default() }
    }

    pub fn flagging(inner: P, supported: F) -> Self {
        Self { inner, supported, mode: Unsupported::Flag }
    }
}

impl<N, E, P, F> WeightingPolicy<N, E> for Evidence<P, F>
where
    N: Vertex,
    E: Clone,
    P: WeightingPolicy<N, E>,
    F: Fn(EdgeView<'_, E>) -> bool,
{
    fn weights(&self, graph: &BioGraph<N, E>) -> Result<EdgeWeights> {
        let mut table = self.inner.weights(graph)?;
        let mut flagged = 0usize;
        for e in graph.edge_views() {
            if !(self.supported)(e) {
                table.insert(e.id, UNSUPPORTED_WEIGHT);
                flagged += 1;
            }
        }
        tracing::debug!(flagged, edges = graph.edge_count(), "evidence filter");
        Ok(table)
    }

    fn apply(&self, graph: &mut BioGraph<N, E>) -> Result<()> {
        let table = self.weights(graph)?;
        for (edge, weight) in table {
            if weight == UNSUPPORTED_WEIGHT && self.mode == Unsupported::Remove {
                graph.remove_edge(edge);
            } else {
                graph.set_weight(edge, weight)?;
            }
        }
        Ok(())
    }
}

/// Uniform random weights in `[low, high)`, reproducible from `seed`.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RandomWeight {
    pub seed: u64,
    pub low: f64,
    pub high: f64,
}

impl Default for RandomWeight {
    fn default() -> Self {
        Self { seed: 42, low: 0.0, high: 1.0 }
    }
}

impl<N: Vertex, E: Clone> WeightingPolicy<N, E> for RandomWeight {
    fn weights(&self, graph: &BioGraph<N, E>) -> Result<EdgeWeights> {
        if !(self.low.is_finite() && self.high.is_finite() && self.low <= self.high) {
            return Err(Error::InvalidParameter(format!("weight range [{}, {})", self.low, self.high)));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut edges: Vec<EdgeId> = graph.edge_ids().collect();
        edges.sort_unstable();
        Ok(edges
            .into_iter()
            .map(|e| {
                let w = if self.low < self.high { rng.random_range(self.low..self.high) } else { self.low };
                (e, w)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// a -> b, a -> c (x2, parallel), b -> c
    fn fan() -> (BioGraph<String, String>, Vec<NodeId>, Vec<EdgeId>) {
        let mut g = BioGraph::new();
        let n: Vec<NodeId> = ["a", "b", "c"].iter().map(|k| g.add_node(k.to_string())).collect();
        let e = [(0, 1, "r1"), (0, 2, "r2"), (0, 2, "r2"), (1, 2, "r3")]
            .iter()
            .map(|&(s, t, r)| g.add_edge(n[s], n[t], r.to_string()).unwrap())
            .collect();
        (g, n, e)
    }

    fn out_mass(g: &BioGraph<String, String>, node: NodeId) -> f64 {
        g.outgoing(node).iter().filter_map(|&e| g.weight(e)).sum()
    }

    #[test]
    fn uniform_and_score_policies() {
        let (mut g, _, e) = fan();
        g.set_weight(e[0], 7.0).unwrap();
        g.set_score(e[1], Some(0.25)).unwrap();
        Uniform.apply(&mut g).unwrap();
        assert!(e.iter().all(|&x| g.weight(x) == Some(1.0)));
        FromScore { default: 2.0 }.apply(&mut g).unwrap();
        assert_eq!(g.weight(e[1]), Some(0.25));
        assert_eq!(g.weight(e[0]), Some(2.0));
    }

    #[test]
    fn inverse_degree_uses_target_degree() {
        let (mut g, _, e) = fan();
        DegreeWeight::default().apply(&mut g).unwrap();
        // c has degree 3, b has degree 2.
        assert!((g.weight(e[1]).unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!((g.weight(e[0]).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn probability_sums_to_one_per_source_and_is_idempotent() {
        let (mut g, n, e) = fan();
        g.set_score(e[0], Some(2.0)).unwrap();
        let policy = Probability(FromScore::default());
        policy.apply(&mut g).unwrap();
        assert!((out_mass(&g, n[0]) - 1.0).abs() < 1e-12);
        assert!((g.weight(e[0]).unwrap() - 0.5).abs() < 1e-12);
        let first: Vec<_> = e.iter().map(|&x| g.weight(x)).collect();
        policy.apply(&mut g).unwrap();
        let second: Vec<_> = e.iter().map(|&x| g.weight(x)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_mass_falls_back_to_one() {
        let (mut g, n, e) = fan();
        Probability(FromFn(|_: EdgeView<'_, String>| 0.0)).apply(&mut g).unwrap();
        assert_eq!(g.weight(e[3]), Some(1.0));
        assert_eq!(out_mass(&g, n[0]), 3.0);
    }

    #[test]
    fn reaction_groups_share_mass_equally() {
        let (mut g, _, e) = fan();
        let policy = ReactionGrouped { inner: Uniform, group: |r: &String| r.clone() };
        policy.apply(&mut g).unwrap();
        // Two groups out of a: r1 (one edge) and r2 (two parallel edges).
        assert_eq!(g.weight(e[0]), Some(0.5));
        assert_eq!(g.weight(e[1]), Some(0.25));
        assert_eq!(g.weight(e[2]), Some(0.25));
        assert_eq!(g.weight(e[3]), Some(1.0));
    }

    #[test]
    fn similarity_as_distance() {
        let (mut g, _, e) = fan();
        let sim = |s: &String, t: &String| (s == "a" && t == "b").then_some(0.8);
        Similarity::distance(sim).apply(&mut g).unwrap();
        assert!((g.weight(e[0]).unwrap() - 0.2).abs() < 1e-12);
        assert_eq!(g.weight(e[3]), Some(1.0));
    }

    #[test]
    fn evidence_flags_or_removes() {
        let (g, _, e) = fan();
        let keep_r2 = |v: EdgeView<'_, String>| v.payload != "r2";

        let mut flagged = g.clone();
        Evidence::flagging(Uniform, keep_r2).apply(&mut flagged).unwrap();
        assert_eq!(flagged.weight(e[1]), Some(UNSUPPORTED_WEIGHT));
        assert!(matches!(flagged.validate_weights(), Err(Error::NegativeWeight { .. })));
        assert_eq!(flagged.strip_unsupported(), 2);

        let mut removed = g.clone();
        Evidence::new(Uniform, keep_r2).apply(&mut removed).unwrap();
        assert_eq!(removed.edge_count(), 2);
        assert!(removed.validate_weights().is_ok());
    }

    #[test]
    fn random_weights_are_seeded() {
        let (mut a, _, e) = fan();
        let mut b = a.clone();
        let policy = RandomWeight { seed: 7, low: 1.0, high: 2.0 };
        policy.apply(&mut a).unwrap();
        policy.apply(&mut b).unwrap();
        for &x in &e {
            let w = a.weight(x).unwrap();
            assert!((1.0..2.0).contains(&w));
            assert_eq!(a.weight(x), b.weight(x));
        }
        let bad = RandomWeight { seed: 7, low: 2.0, high: 1.0 };
        assert!(matches!(bad.apply(&mut a), Err(Error::InvalidParameter(_))));
    }
}
