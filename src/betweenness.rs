//! Path-based centrality: betweenness, closeness, farness, eccentricity.
//!
//! Public invariant:
//! - Maps are keyed by `NodeId` and contain every node considered (zeros included).
//! - Disconnected graphs are allowed; unreachable pairs contribute nothing.
//! - A node that reaches nothing has closeness `0.0` and farness/eccentricity `+inf`.
//!
//! Notes:
//! - [`betweenness_centrality`] is Brandes' algorithm over weighted shortest paths; parallel
//!   edges of equal weight count as distinct shortest paths.
//! - [`geodesic_betweenness`] counts the single reconstructed path per ordered pair of an
//!   all-pairs run, which is cheaper to explain and matches the path matrix users export.
//! - Undirected runs count every unordered pair twice (once per direction).

use crate::allpairs::{DistanceMatrix, FloydWarshall};
use crate::graph::{BioGraph, NodeId, Orientation, Vertex};
use crate::Result;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BetweennessConfig {
    pub orientation: Orientation,
    /// Scale by `1/((n-1)(n-2))` (for `n >= 3`).
    pub normalized: bool,
}

/// Which distances a per-node score reads: those leaving the node or those arriving at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Flow {
    #[default]
    Outgoing,
    Incoming,
}

/// Brandes betweenness over weighted shortest paths.
pub fn betweenness_centrality<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    config: BetweennessConfig,
) -> Result<HashMap<NodeId, f64>> {
    graph.validate_weights()?;
    let ids: Vec<NodeId> = graph.node_ids().collect();
    let n = ids.len();
    let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    let mut betweenness = vec![0.0f64; n];

    for s in 0..n {
        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut pred: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut dist = vec![f64::INFINITY; n];
        let mut done = vec![false; n];

        sigma[s] = 1.0;
        dist[s] = 0.0;
        let mut heap = BinaryHeap::new();
        heap.push(Reverse((OrderedFloat(0.0), s)));

        while let Some(Reverse((OrderedFloat(d), v))) = heap.pop() {
            if done[v] || d > dist[v] {
                continue;
            }
            done[v] = true;
            stack.push(v);
            for hop in graph.hops(ids[v], config.orientation) {
                let Some(&w) = index.get(&hop.target) else { continue };
                if w == v {
                    continue;
                }
                let alt = d + hop.weight;
                if alt < dist[w] {
                    dist[w] = alt;
                    sigma[w] = sigma[v];
                    pred[w].clear();
                    pred[w].push(v);
                    heap.push(Reverse((OrderedFloat(alt), w)));
                } else if alt == dist[w] && !done[w] {
                    sigma[w] += sigma[v];
                    pred[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            let sigma_w = sigma[w];
            if sigma_w > 0.0 {
                for &v in &pred[w] {
                    delta[v] += (sigma[v] / sigma_w) * (1.0 + delta[w]);
                }
            }
            if w != s {
                betweenness[w] += delta[w];
            }
        }
    }

    if config.normalized && n > 2 {
        let norm = 1.0 / ((n - 1) * (n - 2)) as f64;
        for b in &mut betweenness {
            *b *= norm;
        }
    }
    Ok(ids.into_iter().zip(betweenness).collect())
}

/// Per node, the number of reconstructed all-pairs paths passing through it as an internal hop.
///
/// On a star with `n` nodes and bidirectional spokes, the center scores `(n-1)(n-2)` and every
/// leaf `0`.
pub fn geodesic_betweenness<N: Vertex, E: Clone>(engine: &mut FloydWarshall<'_, N, E>) -> Result<HashMap<NodeId, f64>> {
    let nodes = engine.distances()?.nodes().to_vec();
    let mut out: HashMap<NodeId, f64> = nodes.iter().map(|&n| (n, 0.0)).collect();
    for path in engine.paths()?.paths() {
        let hops = path.hops();
        for hop in hops.iter().take(hops.len().saturating_sub(1)) {
            if let Some(score) = out.get_mut(&hop.target) {
                *score += 1.0;
            }
        }
    }
    Ok(out)
}

/// Distances from (or to) each node, excluding itself, keeping only reachable ones.
fn reached(distances: &DistanceMatrix, flow: Flow) -> impl Iterator<Item = (NodeId, Vec<f64>)> + '_ {
    distances.nodes().iter().enumerate().map(move |(i, &node)| {
        let values = (0..distances.len())
            .filter(|&j| j != i)
            .map(|j| match flow {
                Flow::Outgoing => distances.at(i, j),
                Flow::Incoming => distances.at(j, i),
            })
            .filter(|d| d.is_finite())
            .collect();
        (node, values)
    })
}

/// Inverse mean distance to the reachable nodes.
///
/// `0.0` when nothing is reachable, and also when every reachable node sits at distance `0`
/// (zero-weight edges), where the inverse is undefined.
pub fn closeness(distances: &DistanceMatrix, flow: Flow) -> HashMap<NodeId, f64> {
    reached(distances, flow)
        .map(|(node, d)| {
            let total: f64 = d.iter().sum();
            let score = if total > 0.0 { d.len() as f64 / total } else { 0.0 };
            (node, score)
        })
        .collect()
}

/// Mean distance to the reachable nodes.
pub fn farness(distances: &DistanceMatrix, flow: Flow) -> HashMap<NodeId, f64> {
    reached(distances, flow)
        .map(|(node, d)| {
            let score = if d.is_empty() { f64::INFINITY } else { d.iter().sum::<f64>() / d.len() as f64 };
            (node, score)
        })
        .collect()
}

/// Largest distance to any reachable node.
pub fn eccentricity(distances: &DistanceMatrix, flow: Flow) -> HashMap<NodeId, f64> {
    reached(distances, flow)
        .map(|(node, d)| {
            let score = d.into_iter().reduce(f64::max).unwrap_or(f64::INFINITY);
            (node, score)
        })
        .collect()
}
