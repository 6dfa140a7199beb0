//! Directed weighted multigraph.
//!
//! [`BioGraph`] is the single storage type behind every graph variant (compound, reaction,
//! pathway, bipartite). It wraps a `petgraph` stable graph, so node and edge identities stay
//! valid across removals, and keeps edge weights and scores in side tables keyed by edge
//! identity instead of inside the edge payload.
//!
//! Public invariant:
//! - Every edge's endpoints are present in the node set; removing a node removes its edges.
//! - Every live edge has a weight (default `1.0`); scores are optional.
//! - Parallel edges are never merged implicitly (see [`BioGraph::merge_parallel_edges`]).

use crate::{Error, Result};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

pub type NodeId = NodeIndex;
pub type EdgeId = EdgeIndex;

/// Anything that can sit on a node: it only needs a stable string key.
pub trait Vertex: Clone + Debug {
    fn key(&self) -> &str;

    /// Whether an edge `self -> other` is structurally allowed (e.g. bipartite graphs only
    /// link nodes of different kinds).
    fn can_link(&self, _other: &Self) -> bool {
        true
    }
}

impl Vertex for String {
    fn key(&self) -> &str {
        self
    }
}

/// How edges may be traversed by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Follow edges from source to target only.
    #[default]
    Directed,
    /// Every edge is also traversable backwards, with the same weight (the "as-undirected"
    /// view, without materializing mirror edges).
    Undirected,
}

/// One traversal of an edge in a given direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link {
    pub edge: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

/// A [`Link`] together with the weight it had when it was read from the graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hop {
    pub edge: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
}

impl Hop {
    pub fn link(&self) -> Link {
        Link { edge: self.edge, source: self.source, target: self.target }
    }

    /// True when the hop walks its edge backwards (only produced by undirected traversal).
    pub fn is_reversed<N: Vertex, E: Clone>(&self, graph: &BioGraph<N, E>) -> bool {
        graph.endpoints(self.edge).is_some_and(|(s, t)| s != t && s == self.target && t == self.source)
    }
}

/// Borrowed view of an edge, passed to merge comparators and filters.
#[derive(Debug)]
pub struct EdgeView<'a, E> {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
    pub score: Option<f64>,
    pub payload: &'a E,
}

impl<E> Clone for EdgeView<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EdgeView<'_, E> {}

#[derive(Debug, Clone)]
pub struct BioGraph<N, E = ()> {
    inner: StableDiGraph<N, E>,
    keys: HashMap<String, NodeId>,
    weights: HashMap<EdgeId, f64>,
    scores: HashMap<EdgeId, f64>,
    mirrors: HashMap<EdgeId, EdgeId>,
    allow_self_loops: bool,
}

impl<N: Vertex, E: Clone> Default for BioGraph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Vertex, E: Clone> BioGraph<N, E> {
    pub fn new() -> Self {
        Self {
            inner: StableDiGraph::default(),
            keys: HashMap::new(),
            weights: HashMap::new(),
            scores: HashMap::new(),
            mirrors: HashMap::new(),
            allow_self_loops: true,
        }
    }

    /// A graph variant whose `add_edge` rejects self-loops.
    pub fn without_self_loops() -> Self {
        Self { allow_self_loops: false, ..Self::new() }
    }

    pub fn allows_self_loops(&self) -> bool {
        self.allow_self_loops
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Insert a node, or return the existing id if a node with the same key is present.
    pub fn add_node(&mut self, node: N) -> NodeId {
        if let Some(&id) = self.keys.get(node.key()) {
            return id;
        }
        let key = node.key().to_owned();
        let id = self.inner.add_node(node);
        self.keys.insert(key, id);
        id
    }

    pub fn node_id(&self, key: &str) -> Option<NodeId> {
        self.keys.get(key).copied()
    }

    /// Like [`node_id`](Self::node_id), but a missing key is an [`Error::UnknownNode`].
    pub fn require(&self, key: &str) -> Result<NodeId> {
        self.node_id(key).ok_or_else(|| Error::UnknownNode(key.to_owned()))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.inner.contains_node(id)
    }

    pub(crate) fn check_node(&self, id: NodeId) -> Result<()> {
        if self.contains_node(id) {
            Ok(())
        } else {
            Err(Error::UnknownNode(format!("#{}", id.index())))
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&N> {
        self.inner.node_weight(id)
    }

    pub fn key(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(Vertex::key)
    }

    /// Remove a node and every edge incident to it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<N> {
        if !self.contains_node(id) {
            return None;
        }
        let incident: Vec<EdgeId> = self
            .inner
            .edges_directed(id, Direction::Outgoing)
            .chain(self.inner.edges_directed(id, Direction::Incoming))
            .map(|e| e.id())
            .collect();
        for e in incident {
            self.forget_edge(e);
        }
        let node = self.inner.remove_node(id)?;
        self.keys.remove(node.key());
        Some(node)
    }

    pub fn add_edge(&mut self, source: NodeId, target: NodeId, payload: E) -> Result<EdgeId> {
        self.check_node(source)?;
        self.check_node(target)?;
        if source == target && !self.allow_self_loops {
            return Err(Error::SelfLoop(self.display_key(source)));
        }
        if let (Some(s), Some(t)) = (self.node(source), self.node(target)) {
            if !s.can_link(t) {
                return Err(Error::IncompatibleEndpoints {
                    source_key: s.key().to_owned(),
                    target_key: t.key().to_owned(),
                });
            }
        }
        self.add_derived_edge(source, target, payload)
    }

    /// Edge that stands for something derived (a closure path), so kind compatibility is not
    /// checked. Endpoints must exist.
    pub(crate) fn add_derived_edge(&mut self, source: NodeId, target: NodeId, payload: E) -> Result<EdgeId> {
        self.check_node(source)?;
        self.check_node(target)?;
        let id = self.inner.add_edge(source, target, payload);
        self.weights.insert(id, 1.0);
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<E> {
        self.forget_edge(id);
        self.inner.remove_edge(id)
    }

    fn forget_edge(&mut self, id: EdgeId) {
        self.weights.remove(&id);
        self.scores.remove(&id);
        self.mirrors.remove(&id);
        if !self.mirrors.is_empty() {
            self.mirrors.retain(|_, original| *original != id);
        }
    }

    pub fn edge(&self, id: EdgeId) -> Option<&E> {
        self.inner.edge_weight(id)
    }

    pub fn endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.inner.edge_endpoints(id)
    }

    pub fn weight(&self, id: EdgeId) -> Option<f64> {
        self.weights.get(&id).copied()
    }

    pub fn set_weight(&mut self, id: EdgeId, weight: f64) -> Result<()> {
        match self.weights.get_mut(&id) {
            Some(w) => {
                *w = weight;
                Ok(())
            }
            None => Err(Error::UnknownEdge(id.index())),
        }
    }

    pub fn score(&self, id: EdgeId) -> Option<f64> {
        self.scores.get(&id).copied()
    }

    pub fn set_score(&mut self, id: EdgeId, score: Option<f64>) -> Result<()> {
        if !self.weights.contains_key(&id) {
            return Err(Error::UnknownEdge(id.index()));
        }
        match score {
            Some(s) => self.scores.insert(id, s),
            None => self.scores.remove(&id),
        };
        Ok(())
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.inner.node_indices()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.inner.edge_indices()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> + '_ {
        self.inner.node_indices().filter_map(|id| self.inner.node_weight(id).map(|n| (id, n)))
    }

    pub fn edge_view(&self, id: EdgeId) -> Option<EdgeView<'_, E>> {
        let (source, target) = self.endpoints(id)?;
        Some(EdgeView {
            id,
            source,
            target,
            weight: self.weight(id)?,
            score: self.score(id),
            payload: self.edge(id)?,
        })
    }

    pub fn edge_views(&self) -> impl Iterator<Item = EdgeView<'_, E>> + '_ {
        self.edge_ids().filter_map(|id| self.edge_view(id))
    }

    /// All edges `source -> target`; empty when the nodes are not connected.
    pub fn edges_connecting(&self, source: NodeId, target: NodeId) -> Vec<EdgeId> {
        self.outgoing(source)
            .into_iter()
            .filter(|&e| self.endpoints(e).is_some_and(|(_, t)| t == target))
            .collect()
    }

    pub fn find_edge(&self, source: NodeId, target: NodeId) -> Option<EdgeId> {
        self.edges_connecting(source, target).into_iter().next()
    }

    /// Outgoing edges in insertion order.
    pub fn outgoing(&self, node: NodeId) -> Vec<EdgeId> {
        self.incident(node, Direction::Outgoing)
    }

    /// Incoming edges in insertion order.
    pub fn incoming(&self, node: NodeId) -> Vec<EdgeId> {
        self.incident(node, Direction::Incoming)
    }

    fn incident(&self, node: NodeId, dir: Direction) -> Vec<EdgeId> {
        if !self.contains_node(node) {
            return Vec::new();
        }
        let mut edges: Vec<EdgeId> = self.inner.edges_directed(node, dir).map(|e| e.id()).collect();
        edges.sort_unstable();
        edges
    }

    pub fn successors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> =
            self.outgoing(node).into_iter().filter_map(|e| self.endpoints(e).map(|(_, t)| t)).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn predecessors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> =
            self.incoming(node).into_iter().filter_map(|e| self.endpoints(e).map(|(s, _)| s)).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Successors and predecessors, deduplicated.
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = self.successors(node);
        out.extend(self.predecessors(node));
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.outgoing(node).len()
    }

    pub fn in_degree(&self, node: NodeId) -> usize {
        self.incoming(node).len()
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.out_degree(node) + self.in_degree(node)
    }

    pub fn hop(&self, id: EdgeId) -> Option<Hop> {
        let (source, target) = self.endpoints(id)?;
        Some(Hop { edge: id, source, target, weight: self.weight(id)? })
    }

    /// Every way to leave `node` under `orientation`.
    ///
    /// Directed: outgoing edges. Undirected: outgoing edges, then incoming edges walked
    /// backwards (self-loops are listed once).
    pub fn hops(&self, node: NodeId, orientation: Orientation) -> Vec<Hop> {
        let mut hops: Vec<Hop> = self.outgoing(node).into_iter().filter_map(|e| self.hop(e)).collect();
        if orientation == Orientation::Undirected {
            for e in self.incoming(node) {
                if let Some(h) = self.hop(e) {
                    if h.source != h.target {
                        hops.push(Hop { edge: e, source: node, target: h.source, weight: h.weight });
                    }
                }
            }
        }
        hops
    }

    /// Fail with [`Error::NegativeWeight`] if any edge weight is negative or NaN.
    pub fn validate_weights(&self) -> Result<()> {
        for e in self.edge_ids() {
            let w = self.weight(e).unwrap_or(f64::NAN);
            if w.is_nan() || w < 0.0 {
                return Err(Error::NegativeWeight { edge: e.index(), weight: w });
            }
        }
        Ok(())
    }

    /// Companion graph where every non-loop edge `u -> v` gains a mirror `v -> u` with the same
    /// payload, weight and score. Node and original edge ids are preserved.
    pub fn as_undirected(&self) -> Self {
        let mut out = self.clone();
        let originals: Vec<EdgeId> = self.edge_ids().filter(|e| !self.mirrors.contains_key(e)).collect();
        for e in originals {
            let (Some((s, t)), Some(payload)) = (self.endpoints(e), self.edge(e)) else {
                continue;
            };
            if s == t {
                continue;
            }
            let mirror = out.inner.add_edge(t, s, payload.clone());
            out.weights.insert(mirror, self.weight(e).unwrap_or(1.0));
            if let Some(score) = self.score(e) {
                out.scores.insert(mirror, score);
            }
            out.mirrors.insert(mirror, e);
        }
        out
    }

    /// The original edge a mirror was created from, if `id` is a mirror.
    pub fn mirror_of(&self, id: EdgeId) -> Option<EdgeId> {
        self.mirrors.get(&id).copied()
    }

    /// `id` itself, or the edge it mirrors.
    pub fn original_edge(&self, id: EdgeId) -> EdgeId {
        self.mirror_of(id).unwrap_or(id)
    }

    /// Subgraph made of `edges` and their endpoints. Ids are preserved.
    pub fn induced_subgraph<I: IntoIterator<Item = EdgeId>>(&self, edges: I) -> Self {
        let keep: HashSet<EdgeId> = edges.into_iter().collect();
        let mut out = self.clone();
        out.retain_edges(|e| keep.contains(&e.id));
        let mut used: HashSet<NodeId> = HashSet::new();
        for e in &keep {
            if let Some((s, t)) = self.endpoints(*e) {
                used.insert(s);
                used.insert(t);
            }
        }
        let unused: Vec<NodeId> = out.node_ids().filter(|n| !used.contains(n)).collect();
        for n in unused {
            out.remove_node(n);
        }
        out
    }

    /// Subgraph induced by a node set: those nodes and every edge between them.
    pub fn subgraph<I: IntoIterator<Item = NodeId>>(&self, nodes: I) -> Self {
        let keep: HashSet<NodeId> = nodes.into_iter().collect();
        let mut out = self.clone();
        let drop: Vec<NodeId> = out.node_ids().filter(|n| !keep.contains(n)).collect();
        for n in drop {
            out.remove_node(n);
        }
        out
    }

    /// Remove every edge for which `keep` returns false. Returns the number removed.
    pub fn retain_edges<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(EdgeView<'_, E>) -> bool,
    {
        let doomed: Vec<EdgeId> = self.edge_views().filter(|v| !keep(*v)).map(|v| v.id).collect();
        for &e in &doomed {
            self.remove_edge(e);
        }
        doomed.len()
    }

    pub fn remove_self_loops(&mut self) -> usize {
        self.retain_edges(|e| e.source != e.target)
    }

    /// Drop edges carrying a negative weight (the unsupported-edge sentinel included).
    pub fn strip_unsupported(&mut self) -> usize {
        let removed = self.retain_edges(|e| e.weight >= 0.0);
        if removed > 0 {
            tracing::debug!(removed, "stripped unsupported edges");
        }
        removed
    }

    /// Collapse parallel edges (same source and target) to a single edge.
    ///
    /// Among a group of parallel edges, the one that `cmp` orders first is kept.
    pub fn merge_parallel_edges<F>(&mut self, mut cmp: F) -> usize
    where
        F: FnMut(&EdgeView<'_, E>, &EdgeView<'_, E>) -> Ordering,
    {
        let mut groups: HashMap<(NodeId, NodeId), Vec<EdgeId>> = HashMap::new();
        let mut order: Vec<(NodeId, NodeId)> = Vec::new();
        for v in self.edge_views() {
            let slot = groups.entry((v.source, v.target)).or_default();
            if slot.is_empty() {
                order.push((v.source, v.target));
            }
            slot.push(v.id);
        }
        let mut doomed = Vec::new();
        for pair in order {
            let Some(group) = groups.get(&pair) else { continue };
            if group.len() < 2 {
                continue;
            }
            let views: Vec<EdgeView<'_, E>> = group.iter().filter_map(|&e| self.edge_view(e)).collect();
            let mut best = 0;
            for i in 1..views.len() {
                if cmp(&views[i], &views[best]) == Ordering::Less {
                    best = i;
                }
            }
            doomed.extend(views.iter().enumerate().filter(|(i, _)| *i != best).map(|(_, v)| v.id));
        }
        for &e in &doomed {
            self.remove_edge(e);
        }
        doomed.len()
    }

    pub(crate) fn display_key(&self, id: NodeId) -> String {
        self.key(id).map(str::to_owned).unwrap_or_else(|| format!("#{}", id.index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(keys: &[&str]) -> (BioGraph<String>, Vec<NodeId>) {
        let mut g = BioGraph::new();
        let ids = keys.iter().map(|k| g.add_node(k.to_string())).collect();
        (g, ids)
    }

    #[test]
    fn parallel_edges_are_distinct() {
        let (mut g, n) = graph(&["a", "b"]);
        let e1 = g.add_edge(n[0], n[1], ()).unwrap();
        let e2 = g.add_edge(n[0], n[1], ()).unwrap();
        assert_ne!(e1, e2);
        assert_eq!(g.edges_connecting(n[0], n[1]), vec![e1, e2]);
        assert_eq!(g.out_degree(n[0]), 2);
        assert_eq!(g.successors(n[0]), vec![n[1]]);
        assert!(g.edges_connecting(n[1], n[0]).is_empty());
    }

    #[test]
    fn add_node_is_idempotent_by_key() {
        let (mut g, n) = graph(&["a"]);
        assert_eq!(g.add_node("a".to_string()), n[0]);
        assert_eq!(g.node_count(), 1);
        assert!(matches!(g.require("zz"), Err(Error::UnknownNode(k)) if k == "zz"));
    }

    #[test]
    fn removing_a_node_cascades() {
        let (mut g, n) = graph(&["a", "b", "c"]);
        let ab = g.add_edge(n[0], n[1], ()).unwrap();
        g.add_edge(n[1], n[2], ()).unwrap();
        g.add_edge(n[2], n[0], ()).unwrap();
        g.remove_node(n[1]);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight(ab), None);
        assert_eq!(g.node_id("b"), None);
    }

    #[test]
    fn self_loops_depend_on_variant() {
        let mut g: BioGraph<String> = BioGraph::without_self_loops();
        let a = g.add_node("a".into());
        assert!(matches!(g.add_edge(a, a, ()), Err(Error::SelfLoop(_))));
        let (mut g, n) = graph(&["a"]);
        assert!(g.add_edge(n[0], n[0], ()).is_ok());
    }

    #[test]
    fn weights_default_to_one_and_are_shared() {
        let (mut g, n) = graph(&["a", "b"]);
        let e = g.add_edge(n[0], n[1], ()).unwrap();
        assert_eq!(g.weight(e), Some(1.0));
        g.set_weight(e, 3.5).unwrap();
        assert_eq!(g.hop(e).unwrap().weight, 3.5);
        g.set_score(e, Some(0.2)).unwrap();
        assert_eq!(g.score(e), Some(0.2));
        g.remove_edge(e);
        assert!(matches!(g.set_weight(e, 1.0), Err(Error::UnknownEdge(_))));
    }

    #[test]
    fn undirected_companion_mirrors_weights() {
        let (mut g, n) = graph(&["a", "b", "c"]);
        let ab = g.add_edge(n[0], n[1], ()).unwrap();
        g.add_edge(n[1], n[1], ()).unwrap();
        g.set_weight(ab, 2.0).unwrap();
        let u = g.as_undirected();
        assert_eq!(u.edge_count(), 3);
        let back = u.find_edge(n[1], n[0]).unwrap();
        assert_eq!(u.weight(back), Some(2.0));
        assert_eq!(u.mirror_of(back), Some(ab));
        assert_eq!(u.original_edge(back), ab);
        assert_eq!(u.original_edge(ab), ab);
    }

    #[test]
    fn undirected_hops_walk_edges_backwards() {
        let (mut g, n) = graph(&["a", "b"]);
        let ab = g.add_edge(n[0], n[1], ()).unwrap();
        let hops = g.hops(n[1], Orientation::Undirected);
        assert_eq!(hops.len(), 1);
        assert_eq!((hops[0].edge, hops[0].source, hops[0].target), (ab, n[1], n[0]));
        assert!(hops[0].is_reversed(&g));
        assert!(g.hops(n[1], Orientation::Directed).is_empty());
    }

    #[test]
    fn merge_keeps_the_preferred_parallel_edge() {
        let (mut g, n) = graph(&["a", "b"]);
        let heavy = g.add_edge(n[0], n[1], ()).unwrap();
        let light = g.add_edge(n[0], n[1], ()).unwrap();
        g.set_weight(heavy, 5.0).unwrap();
        g.set_weight(light, 0.5).unwrap();
        let removed = g.merge_parallel_edges(|a, b| a.weight.total_cmp(&b.weight));
        assert_eq!(removed, 1);
        assert_eq!(g.edges_connecting(n[0], n[1]), vec![light]);
    }

    #[test]
    fn induced_subgraph_preserves_ids() {
        let (mut g, n) = graph(&["a", "b", "c", "d"]);
        let ab = g.add_edge(n[0], n[1], ()).unwrap();
        g.add_edge(n[1], n[2], ()).unwrap();
        g.add_edge(n[2], n[3], ()).unwrap();
        let sub = g.induced_subgraph([ab]);
        assert_eq!(sub.node_count(), 2);
        assert_eq!(sub.endpoints(ab), Some((n[0], n[1])));
        assert!(!sub.contains_node(n[3]));
        let sub = g.subgraph([n[1], n[2], n[3]]);
        assert_eq!(sub.edge_count(), 2);
    }

    #[test]
    fn negative_weights_are_detected() {
        let (mut g, n) = graph(&["a", "b"]);
        let e = g.add_edge(n[0], n[1], ()).unwrap();
        g.set_weight(e, -1.0).unwrap();
        assert!(matches!(g.validate_weights(), Err(Error::NegativeWeight { .. })));
        assert_eq!(g.strip_unsupported(), 1);
        assert!(g.validate_weights().is_ok());
    }
}
