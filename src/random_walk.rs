//! Absorbing random-walk centrality.
//!
//! For every seed `s` of a node-of-interest set, a walker starts at `s` and moves along
//! outgoing hops with probability proportional to edge weight until it hits one of the *other*
//! seeds, which absorb it. The expected number of visits to each transient node is the row of
//! the fundamental matrix \(N = (I - Q)^{-1}\) for `s`; we get it by solving
//! \((I - Q)^\top x = e_s\) instead of inverting.
//!
//! Node scores are expected visits (transient nodes) plus absorption probability (seeds),
//! summed over all starting seeds. Link scores are expected traversals of each hop. Walkers
//! that step onto a node which cannot reach any absorbing seed leave the chain there.

use crate::graph::{BioGraph, Hop, Link, NodeId, Orientation, Vertex};
use crate::reachability::{reachable_from, reaching};
use crate::{Error, Result};
use nalgebra::{DMatrix, DVector};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassageConfig {
    pub orientation: Orientation,
    /// Split a node's exit probability by edge weight; otherwise uniformly over its hops.
    pub weighted: bool,
}

impl Default for PassageConfig {
    fn default() -> Self {
        Self { orientation: Orientation::Directed, weighted: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassageTimes {
    pub nodes: HashMap<NodeId, f64>,
    /// Keyed by traversal direction; undirected runs report each edge once per direction used.
    pub links: HashMap<Link, f64>,
}

impl PassageTimes {
    /// Traversals of `link` plus traversals of its reverse.
    pub fn edge_total(&self, link: Link) -> f64 {
        let reverse = Link { edge: link.edge, source: link.target, target: link.source };
        let forward = self.links.get(&link).copied().unwrap_or(0.0);
        if reverse == link {
            return forward;
        }
        forward + self.links.get(&reverse).copied().unwrap_or(0.0)
    }
}

/// Expected passage times between the nodes of `seeds`.
///
/// Fewer than two distinct seeds leave nothing to absorb and give empty maps.
pub fn passage_times<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    seeds: &[NodeId],
    config: PassageConfig,
) -> Result<PassageTimes> {
    let mut seen = HashSet::new();
    let seeds: Vec<NodeId> = seeds.iter().copied().filter(|s| seen.insert(*s)).collect();
    for &s in &seeds {
        graph.check_node(s)?;
    }
    let mut out = PassageTimes::default();
    if seeds.len() < 2 {
        return Ok(out);
    }
    if config.weighted {
        graph.validate_weights()?;
    }

    // Exit probabilities per node, computed once.
    let mut exits: HashMap<NodeId, Vec<(Hop, f64)>> = HashMap::new();
    for node in graph.node_ids() {
        let hops = graph.hops(node, config.orientation);
        let mass = |h: &Hop| if config.weighted { h.weight } else { 1.0 };
        let total: f64 = hops.iter().map(mass).sum();
        if total > 0.0 {
            exits.insert(node, hops.iter().map(|h| (*h, mass(h) / total)).filter(|&(_, p)| p > 0.0).collect());
        }
    }

    for &start in &seeds {
        let absorbing: Vec<NodeId> = seeds.iter().copied().filter(|&s| s != start).collect();
        let absorbing_set: HashSet<NodeId> = absorbing.iter().copied().collect();
        let upstream = match config.orientation {
            Orientation::Directed => reaching(graph, &absorbing)?,
            Orientation::Undirected => reachable_from(graph, &absorbing, Orientation::Undirected)?,
        };
        let transient: Vec<NodeId> = upstream.into_iter().filter(|n| !absorbing_set.contains(n)).collect();
        let index: HashMap<NodeId, usize> = transient.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        let Some(&origin) = index.get(&start) else {
            tracing::debug!(start = %graph.display_key(start), "seed cannot reach the others");
            continue;
        };

        let k = transient.len();
        let mut system = DMatrix::<f64>::identity(k, k);
        for (i, node) in transient.iter().enumerate() {
            for &(hop, p) in exits.get(node).map(Vec::as_slice).unwrap_or(&[]) {
                if let Some(&j) = index.get(&hop.target) {
                    // (I - Q)^T: entry (j, i) holds -Q[i][j].
                    system[(j, i)] -= p;
                }
            }
        }
        let mut rhs = DVector::<f64>::zeros(k);
        rhs[origin] = 1.0;
        let visits = system.lu().solve(&rhs).ok_or(Error::SingularSystem)?;

        for (i, &node) in transient.iter().enumerate() {
            let x = visits[i];
            *out.nodes.entry(node).or_default() += x;
            for &(hop, p) in exits.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
                *out.links.entry(hop.link()).or_default() += x * p;
                if absorbing_set.contains(&hop.target) {
                    *out.nodes.entry(hop.target).or_default() += x * p;
                }
            }
        }
        tracing::trace!(start = %graph.display_key(start), transient = k, "absorbing walk solved");
    }
    Ok(out)
}
