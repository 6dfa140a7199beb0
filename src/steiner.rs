//! Approximate minimal Steiner tree over a terminal set.
//!
//! Kou–Markowsky–Berman style:
//! 1. metric closure over the terminals,
//! 2. minimum spanning forest of the closure (Kruskal),
//! 3. expand every kept closure edge into its underlying path and take the edge union,
//! 4. (undirected) spanning forest of that union, then prune non-terminal leaves.
//!
//! Terminals that cannot be connected to any other terminal are reported as excluded instead of
//! failing the call; only a terminal set with no connectable pair at all is an error.

use crate::graph::{BioGraph, EdgeId, NodeId, Orientation, Vertex};
use crate::path::Path;
use crate::shortest::{edge_union, metric_closure, metric_closure_between};
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct SteinerTree {
    edges: Vec<EdgeId>,
    paths: Vec<Path>,
    covered: Vec<NodeId>,
    excluded: Vec<NodeId>,
    weight: f64,
}

impl SteinerTree {
    /// Edges of the original graph forming the tree (or forest).
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Underlying shortest paths of the kept closure edges.
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Terminals joined to at least one other terminal.
    pub fn covered(&self) -> &[NodeId] {
        &self.covered
    }

    /// Terminals left out because nothing connects them.
    pub fn excluded(&self) -> &[NodeId] {
        &self.excluded
    }

    /// Sum of the weights of the distinct tree edges.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn subgraph<N: Vertex, E: Clone>(&self, graph: &BioGraph<N, E>) -> BioGraph<N, E> {
        graph.induced_subgraph(self.edges.iter().copied())
    }
}

/// Disjoint sets over `0..n` with path compression and union by rank.
struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect(), rank: vec![0; n] }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Kruskal over `(weight, a, b, payload)` items; returns the kept payloads in weight order.
fn kruskal<T: Copy>(n: usize, mut items: Vec<(f64, usize, usize, T)>) -> Vec<T> {
    items.sort_by(|x, y| x.0.total_cmp(&y.0));
    let mut sets = DisjointSets::new(n);
    items.into_iter().filter(|&(_, a, b, _)| sets.union(a, b)).map(|(_, _, _, t)| t).collect()
}

/// Steiner tree connecting `terminals`.
///
/// `Undirected` is the classic approximation. `Directed` builds the closure over directed
/// paths and spans it ignoring closure-edge direction; use [`steiner_tree_between`] when
/// sources and targets differ.
pub fn steiner_tree<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    terminals: &[NodeId],
    orientation: Orientation,
) -> Result<SteinerTree> {
    let terminals = dedup(terminals);
    for &t in &terminals {
        graph.check_node(t)?;
    }
    if terminals.len() < 2 {
        return Ok(SteinerTree {
            edges: Vec::new(),
            paths: Vec::new(),
            covered: terminals.clone(),
            excluded: Vec::new(),
            weight: 0.0,
        });
    }
    let closure = metric_closure(graph, &terminals, orientation)?;
    let tree = from_closure(graph, &closure, &terminals)?;
    Ok(match orientation {
        Orientation::Undirected => prune(graph, tree, &terminals),
        Orientation::Directed => tree,
    })
}

/// Directed Steiner tree from `sources` to `targets`: closure edges only run source → target.
pub fn steiner_tree_between<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    sources: &[NodeId],
    targets: &[NodeId],
) -> Result<SteinerTree> {
    let (sources, targets) = (dedup(sources), dedup(targets));
    let closure = metric_closure_between(graph, &sources, &targets)?;
    let mut terminals = sources;
    terminals.extend(targets);
    let terminals = dedup(&terminals);
    from_closure(graph, &closure, &terminals)
}

fn dedup(nodes: &[NodeId]) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    nodes.iter().copied().filter(|n| seen.insert(*n)).collect()
}

fn from_closure<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    closure: &BioGraph<N, Path>,
    terminals: &[NodeId],
) -> Result<SteinerTree> {
    let local: Vec<NodeId> = closure.node_ids().collect();
    let pos: HashMap<NodeId, usize> = local.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let items: Vec<(f64, usize, usize, EdgeId)> = closure
        .edge_views()
        .map(|e| (e.weight, pos[&e.source], pos[&e.target], e.id))
        .collect();
    let kept = kruskal(local.len(), items);
    if kept.is_empty() {
        return Err(Error::DisconnectedTerminals);
    }

    let paths: Vec<Path> = kept.iter().filter_map(|&e| closure.edge(e).cloned()).collect();
    let touched: HashSet<NodeId> = paths.iter().flat_map(|p| [p.start(), p.end()]).collect();
    let (covered, excluded): (Vec<NodeId>, Vec<NodeId>) =
        terminals.iter().copied().partition(|t| touched.contains(t));
    if !excluded.is_empty() {
        tracing::warn!(excluded = excluded.len(), "terminals unreachable from the rest were excluded");
    }

    let edges = edge_union(&paths);
    let weight = edges.iter().filter_map(|&e| graph.weight(e)).sum();
    Ok(SteinerTree { edges, paths, covered, excluded, weight })
}

/// Replace the expanded union with a spanning forest of it and trim non-terminal leaves.
fn prune<N: Vertex, E: Clone>(graph: &BioGraph<N, E>, tree: SteinerTree, terminals: &[NodeId]) -> SteinerTree {
    let mut nodes: Vec<NodeId> = Vec::new();
    let mut pos: HashMap<NodeId, usize> = HashMap::new();
    let mut items = Vec::new();
    for &e in &tree.edges {
        let (Some((s, t)), Some(w)) = (graph.endpoints(e), graph.weight(e)) else { continue };
        for n in [s, t] {
            pos.entry(n).or_insert_with(|| {
                nodes.push(n);
                nodes.len() - 1
            });
        }
        items.push((w, pos[&s], pos[&t], e));
    }
    let mut edges = kruskal(nodes.len(), items);

    let keep: HashSet<NodeId> = terminals.iter().copied().collect();
    loop {
        let mut degree: HashMap<NodeId, usize> = HashMap::new();
        for &e in &edges {
            if let Some((s, t)) = graph.endpoints(e) {
                *degree.entry(s).or_default() += 1;
                *degree.entry(t).or_default() += 1;
            }
        }
        let before = edges.len();
        edges.retain(|&e| {
            graph.endpoints(e).is_some_and(|(s, t)| {
                let leaf = |n: NodeId| degree.get(&n) == Some(&1) && !keep.contains(&n);
                !leaf(s) && !leaf(t)
            })
        });
        if edges.len() == before {
            break;
        }
    }
    // Keep the original discovery order.
    let kept: HashSet<EdgeId> = edges.into_iter().collect();
    let edges: Vec<EdgeId> = tree.edges.iter().copied().filter(|e| kept.contains(e)).collect();
    let weight = edges.iter().filter_map(|&e| graph.weight(e)).sum();
    SteinerTree { edges, weight, ..tree }
}
