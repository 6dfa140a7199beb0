//! Eigenvector and personalized-rank centrality (power iteration with teleportation).
//!
//! Every variant iterates
//! \[
//!   x \leftarrow \mathrm{normalize}\big((1-d)\,M^\top x + d\,j\big)
//! \]
//! where `d` is [`RankConfig::jump`] and `j` the jump vector. [`pagerank`] and
//! [`personalized_rank`] use the transition matrix (outgoing weights split proportionally,
//! dangling mass re-enters through `j`); [`eigenvector_centrality`] uses the raw adjacency.
//!
//! A graph without edges has no meaningful ranking and fails with `Error::NoEdges`.

use crate::graph::{BioGraph, NodeId, Orientation, Vertex};
use crate::{Error, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Norm {
    /// Scores sum to 1 (probability mass).
    #[default]
    L1,
    /// Scores have unit Euclidean length.
    L2,
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankConfig {
    /// Teleportation mass `d` in `[0, 1]`.
    pub jump: f64,
    pub max_iterations: usize,
    /// Stop once the change between iterates (measured with `norm`) drops below this.
    pub tolerance: f64,
    /// Add a unit self-loop to every node before iterating.
    pub self_loops: bool,
    pub orientation: Orientation,
    pub norm: Norm,
    /// Use edge weights; otherwise every edge counts `1.0`.
    pub weighted: bool,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            jump: 0.15,
            max_iterations: 100,
            tolerance: 1e-9,
            self_loops: false,
            orientation: Orientation::Directed,
            norm: Norm::L1,
            weighted: true,
        }
    }
}

/// Last iterate of a power iteration, with how it ended.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankRun {
    pub scores: HashMap<NodeId, f64>,
    pub iterations: usize,
    pub converged: bool,
    /// Change between the last two iterates.
    pub delta: f64,
}

impl RankRun {
    fn empty() -> Self {
        Self { scores: HashMap::new(), iterations: 0, converged: true, delta: 0.0 }
    }
}

/// Eigenvector centrality of the (optionally self-looped) adjacency matrix.
///
/// With `jump = 0` this is the classic principal eigenvector; a positive jump adds uniform
/// teleportation, which also keeps the iteration from oscillating on bipartite graphs.
pub fn eigenvector_centrality<N: Vertex, E: Clone>(graph: &BioGraph<N, E>, config: RankConfig) -> Result<RankRun> {
    let n = graph.node_count();
    rank(graph, config, vec![1.0 / n as f64; n], Transition::Adjacency)
}

/// PageRank: personalized rank with a uniform jump vector.
///
/// With `jump = 0` on a connected graph whose edges all run both ways, the scores are
/// proportional to weighted out-degree (self-loops included). A 7-node wheel (hub joined to a
/// 6-cycle) gives the hub exactly twice a rim node's score; a 7-node star with unit self-loops
/// (`RankConfig::self_loops`) gives 7 : 2.
pub fn pagerank<N: Vertex, E: Clone>(graph: &BioGraph<N, E>, config: RankConfig) -> Result<RankRun> {
    let n = graph.node_count();
    rank(graph, config, vec![1.0 / n as f64; n], Transition::Stochastic)
}

/// Rank with teleportation restricted to (and weighted by) `personalization`.
///
/// Entries are normalized to sum to 1; nodes missing from the map get no jump mass. An empty
/// map, or one with no positive mass, falls back to a uniform jump. The run is returned even if
/// the iteration budget ran out; see [`personalized_rank_checked`].
pub fn personalized_rank<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    config: RankConfig,
    personalization: &HashMap<NodeId, f64>,
) -> Result<RankRun> {
    let ids: Vec<NodeId> = graph.node_ids().collect();
    let mut jump = vec![0.0; ids.len()];
    let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    for (&node, &mass) in personalization {
        graph.check_node(node)?;
        if !(mass.is_finite() && mass >= 0.0) {
            return Err(Error::InvalidParameter(format!("jump mass {mass} for {}", graph.display_key(node))));
        }
        if let Some(&i) = index.get(&node) {
            jump[i] = mass;
        }
    }
    let total: f64 = jump.iter().sum();
    if total > 0.0 {
        jump.iter_mut().for_each(|j| *j /= total);
    } else {
        jump.fill(1.0 / ids.len().max(1) as f64);
    }
    rank(graph, config, jump, Transition::Stochastic)
}

/// [`personalized_rank`] that reports a spent iteration budget as `Error::NonConvergent`.
pub fn personalized_rank_checked<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    config: RankConfig,
    personalization: &HashMap<NodeId, f64>,
) -> Result<RankRun> {
    let run = personalized_rank(graph, config, personalization)?;
    if run.converged {
        Ok(run)
    } else {
        Err(Error::NonConvergent { iterations: run.iterations, delta: run.delta })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Adjacency,
    Stochastic,
}

fn rank<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    config: RankConfig,
    jump: Vec<f64>,
    transition: Transition,
) -> Result<RankRun> {
    if !(0.0..=1.0).contains(&config.jump) {
        return Err(Error::InvalidParameter(format!("jump probability {}", config.jump)));
    }
    let ids: Vec<NodeId> = graph.node_ids().collect();
    let n = ids.len();
    if n == 0 {
        return Ok(RankRun::empty());
    }
    if graph.edge_count() == 0 {
        return Err(Error::NoEdges);
    }
    if config.weighted {
        graph.validate_weights()?;
    }
    let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, &v)| (v, i)).collect();

    // Outgoing (target, weight) per node, collected once.
    let adjacency: Vec<Vec<(usize, f64)>> = ids
        .iter()
        .enumerate()
        .map(|(u, &node)| {
            let mut out: Vec<(usize, f64)> = graph
                .hops(node, config.orientation)
                .into_iter()
                .filter_map(|h| {
                    let w = if config.weighted { h.weight } else { 1.0 };
                    let v = *index.get(&h.target)?;
                    (w.is_finite() && w > 0.0).then_some((v, w))
                })
                .collect();
            if config.self_loops {
                out.push((u, 1.0));
            }
            out
        })
        .collect();
    let out_sum: Vec<f64> = adjacency.iter().map(|a| a.iter().map(|&(_, w)| w).sum()).collect();

    let d = config.jump;
    let mut scores = vec![1.0 / n as f64; n];
    normalize(&mut scores, config.norm);
    let mut next = vec![0.0; n];
    let mut delta = f64::INFINITY;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;
        next.fill(0.0);
        let mut dangling = 0.0;
        for (u, out) in adjacency.iter().enumerate() {
            match transition {
                Transition::Stochastic if out_sum[u] > 0.0 => {
                    for &(v, w) in out {
                        next[v] += scores[u] * w / out_sum[u];
                    }
                }
                Transition::Stochastic => dangling += scores[u],
                Transition::Adjacency => {
                    for &(v, w) in out {
                        next[v] += scores[u] * w;
                    }
                }
            }
        }
        for (v, x) in next.iter_mut().enumerate() {
            *x = (1.0 - d) * (*x + dangling * jump[v]) + d * jump[v];
        }
        normalize(&mut next, config.norm);

        delta = distance(&scores, &next, config.norm);
        std::mem::swap(&mut scores, &mut next);
        if delta < config.tolerance {
            converged = true;
            break;
        }
    }

    if converged {
        tracing::debug!(iterations, delta, "rank iteration converged");
    } else {
        tracing::warn!(iterations, delta, "rank iteration hit its budget");
    }
    Ok(RankRun { scores: ids.into_iter().zip(scores).collect(), iterations, converged, delta })
}

fn normalize(x: &mut [f64], norm: Norm) {
    let scale = match norm {
        Norm::L1 => x.iter().map(|v| v.abs()).sum::<f64>(),
        Norm::L2 => x.iter().map(|v| v * v).sum::<f64>().sqrt(),
    };
    if scale > 0.0 {
        x.iter_mut().for_each(|v| *v /= scale);
    }
}

fn distance(a: &[f64], b: &[f64], norm: Norm) -> f64 {
    let diffs = a.iter().zip(b).map(|(x, y)| (x - y).abs());
    match norm {
        Norm::L1 => diffs.sum(),
        Norm::L2 => diffs.map(|d| d * d).sum::<f64>().sqrt(),
    }
}
