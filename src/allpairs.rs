//! All-pairs shortest paths (Floyd–Warshall) with deferred path reconstruction.
//!
//! [`FloydWarshall`] computes once and memoizes: the distance/predecessor state on first use,
//! the [`DistanceMatrix`] and [`PathMatrix`] on first request. After the caches are populated,
//! the `cached_*` accessors are plain `&self` reads.
//!
//! Public invariant:
//! - Matrix rows and columns follow a node↔index bijection fixed at construction.
//! - Diagonal entries are `0.0`; unreachable pairs are `+inf` and have no path.
//! - Every reconstructed path carries the graph's own edge weights, and its weight equals the
//!   pair's distance.

use crate::graph::{BioGraph, Hop, NodeId, Orientation, Vertex};
use crate::path::Path;
use crate::Result;
use std::collections::HashMap;

/// How parallel (and, undirected, mirrored) edge weights collapse into one matrix entry.
///
/// The direct hop for a pair is the first parallel edge whose weight equals the combined value.
/// Combiners that select one of their inputs (`f64::min`, `f64::max`) keep every path
/// reconstructable; for one that synthesizes a value (a sum, a mean) the combined entry only
/// lives in the distance matrix, and pairs whose shortest route uses it have no path.
pub type Combiner = fn(f64, f64) -> f64;

#[derive(Debug, Clone, Copy)]
pub struct AllPairsConfig {
    pub orientation: Orientation,
    pub combine: Combiner,
}

impl Default for AllPairsConfig {
    fn default() -> Self {
        Self { orientation: Orientation::Directed, combine: f64::min }
    }
}

impl AllPairsConfig {
    pub fn undirected() -> Self {
        Self { orientation: Orientation::Undirected, ..Self::default() }
    }
}

/// Dense `n x n` distances indexed by node.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    nodes: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    values: Vec<f64>,
}

impl DistanceMatrix {
    fn new(nodes: Vec<NodeId>, values: Vec<f64>) -> Self {
        let index = nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        Self { nodes, index, values }
    }

    /// Row/column order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.index.get(&node).copied()
    }

    /// Distance `from -> to`; `None` if either node is not indexed, `+inf` if unreachable.
    pub fn get(&self, from: NodeId, to: NodeId) -> Option<f64> {
        let (i, j) = (self.index_of(from)?, self.index_of(to)?);
        Some(self.at(i, j))
    }

    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.nodes.len() + j]
    }

    pub fn row(&self, node: NodeId) -> Option<&[f64]> {
        let n = self.nodes.len();
        let i = self.index_of(node)?;
        Some(&self.values[i * n..(i + 1) * n])
    }

    pub fn column(&self, node: NodeId) -> Option<Vec<f64>> {
        let j = self.index_of(node)?;
        Some((0..self.nodes.len()).map(|i| self.at(i, j)).collect())
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let n = self.nodes.len();
        (0..n).all(|i| {
            (i + 1..n).all(|j| {
                let (a, b) = (self.at(i, j), self.at(j, i));
                a == b || (a - b).abs() <= tolerance
            })
        })
    }
}

/// Best path for every reachable ordered pair of distinct indexed nodes.
#[derive(Debug, Clone, Default)]
pub struct PathMatrix {
    paths: HashMap<(NodeId, NodeId), Path>,
}

impl PathMatrix {
    pub fn get(&self, from: NodeId, to: NodeId) -> Option<&Path> {
        self.paths.get(&(from, to))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(NodeId, NodeId), &Path)> + '_ {
        self.paths.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.paths.values()
    }
}

/// Distances and last-hop predecessors over every node of the graph.
#[derive(Debug, Clone)]
struct Solved {
    nodes: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    dist: Vec<f64>,
    pred: Vec<Option<Hop>>,
}

impl Solved {
    fn reconstruct(&self, from: NodeId, to: NodeId) -> Option<Path> {
        let n = self.nodes.len();
        let (i, mut j) = (*self.index.get(&from)?, *self.index.get(&to)?);
        if i == j || !self.dist[i * n + j].is_finite() {
            return None;
        }
        let mut hops = Vec::new();
        while j != i {
            let hop = self.pred[i * n + j]?;
            hops.push(hop);
            j = *self.index.get(&hop.source)?;
            if hops.len() > n {
                return None;
            }
        }
        hops.reverse();
        Some(Path::from_parts(from, to, hops))
    }
}

pub struct FloydWarshall<'g, N, E> {
    graph: &'g BioGraph<N, E>,
    config: AllPairsConfig,
    subset: Option<Vec<NodeId>>,
    solved: Option<Solved>,
    distances: Option<DistanceMatrix>,
    paths: Option<PathMatrix>,
}

impl<'g, N: Vertex, E: Clone> FloydWarshall<'g, N, E> {
    pub fn new(graph: &'g BioGraph<N, E>) -> Self {
        Self::with_config(graph, AllPairsConfig::default())
    }

    pub fn with_config(graph: &'g BioGraph<N, E>, config: AllPairsConfig) -> Self {
        Self { graph, config, subset: None, solved: None, distances: None, paths: None }
    }

    /// Report matrices over `nodes` only. Paths may still route through other nodes.
    pub fn restricted_to(mut self, nodes: &[NodeId]) -> Result<Self> {
        for &n in nodes {
            self.graph.check_node(n)?;
        }
        self.subset = Some(nodes.to_vec());
        self.distances = None;
        self.paths = None;
        Ok(self)
    }

    fn solved(&mut self) -> Result<&Solved> {
        let solved = match self.solved.take() {
            Some(s) => s,
            None => solve(self.graph, self.config)?,
        };
        Ok(self.solved.insert(solved))
    }

    pub fn distances(&mut self) -> Result<&DistanceMatrix> {
        let matrix = match self.distances.take() {
            Some(m) => m,
            None => {
                let subset = self.subset.clone();
                let solved = self.solved()?;
                let nodes = subset.unwrap_or_else(|| solved.nodes.clone());
                let n = solved.nodes.len();
                let mut values = Vec::with_capacity(nodes.len() * nodes.len());
                for a in &nodes {
                    for b in &nodes {
                        let (i, j) = (solved.index[a], solved.index[b]);
                        values.push(solved.dist[i * n + j]);
                    }
                }
                DistanceMatrix::new(nodes, values)
            }
        };
        Ok(self.distances.insert(matrix))
    }

    pub fn distance(&mut self, from: NodeId, to: NodeId) -> Result<Option<f64>> {
        self.graph.check_node(from)?;
        self.graph.check_node(to)?;
        let solved = self.solved()?;
        let n = solved.nodes.len();
        Ok(match (solved.index.get(&from), solved.index.get(&to)) {
            (Some(&i), Some(&j)) => Some(solved.dist[i * n + j]),
            _ => None,
        })
    }

    /// Best path `from -> to`, reconstructed on demand (or read from the path cache).
    pub fn path(&mut self, from: NodeId, to: NodeId) -> Result<Option<Path>> {
        self.graph.check_node(from)?;
        self.graph.check_node(to)?;
        if let Some(cached) = self.paths.as_ref() {
            if let Some(p) = cached.get(from, to) {
                return Ok(Some(p.clone()));
            }
        }
        Ok(self.solved()?.reconstruct(from, to))
    }

    pub fn paths(&mut self) -> Result<&PathMatrix> {
        let matrix = match self.paths.take() {
            Some(m) => m,
            None => {
                let subset = self.subset.clone();
                let solved = self.solved()?;
                let nodes = subset.unwrap_or_else(|| solved.nodes.clone());
                let mut paths = HashMap::new();
                for &a in &nodes {
                    for &b in &nodes {
                        if let Some(p) = solved.reconstruct(a, b) {
                            paths.insert((a, b), p);
                        }
                    }
                }
                PathMatrix { paths }
            }
        };
        Ok(self.paths.insert(matrix))
    }

    pub fn cached_distances(&self) -> Option<&DistanceMatrix> {
        self.distances.as_ref()
    }

    pub fn cached_paths(&self) -> Option<&PathMatrix> {
        self.paths.as_ref()
    }
}

fn solve<N: Vertex, E: Clone>(graph: &BioGraph<N, E>, config: AllPairsConfig) -> Result<Solved> {
    graph.validate_weights()?;
    let nodes: Vec<NodeId> = graph.node_ids().collect();
    let n = nodes.len();
    let index: HashMap<NodeId, usize> = nodes.iter().enumerate().map(|(i, &v)| (v, i)).collect();

    let mut dist = vec![f64::INFINITY; n * n];
    let mut pred: Vec<Option<Hop>> = vec![None; n * n];
    for i in 0..n {
        dist[i * n + i] = 0.0;
    }

    let mut direct: HashMap<usize, Vec<Hop>> = HashMap::new();
    for &u in &nodes {
        for hop in graph.hops(u, config.orientation) {
            if hop.source == hop.target {
                continue;
            }
            let cell = index[&hop.source] * n + index[&hop.target];
            let parallel = direct.entry(cell).or_default();
            dist[cell] = if parallel.is_empty() { hop.weight } else { (config.combine)(dist[cell], hop.weight) };
            parallel.push(hop);
        }
    }
    for (cell, parallel) in direct {
        pred[cell] = parallel.into_iter().find(|h| h.weight == dist[cell]);
    }

    for k in 0..n {
        for i in 0..n {
            let ik = dist[i * n + k];
            if !ik.is_finite() {
                continue;
            }
            for j in 0..n {
                let cand = ik + dist[k * n + j];
                if cand < dist[i * n + j] {
                    dist[i * n + j] = cand;
                    pred[i * n + j] = pred[k * n + j];
                }
            }
        }
    }
    tracing::debug!(nodes = n, orientation = ?config.orientation, "floyd-warshall solved");
    Ok(Solved { nodes, index, dist, pred })
}
