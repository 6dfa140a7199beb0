//! Paths: contiguous walks over a graph, owned independently of it.

use crate::graph::{EdgeId, Hop, NodeId};
use crate::{Error, Result};

/// An ordered sequence of hops from `start` to `end`.
///
/// Invariants:
/// - `hops[i].target == hops[i + 1].source`
/// - `hops[0].source == start`, `hops[last].target == end`
/// - a path without hops is the trivial path (`start == end`); searches never return one.
///
/// Weight is cached at construction from the hop weights, so later weight changes on the graph
/// do not alter an existing path. Equality compares endpoints and hops only.
#[derive(Debug, Clone)]
pub struct Path {
    start: NodeId,
    end: NodeId,
    hops: Vec<Hop>,
    weight: f64,
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end && self.hops == other.hops
    }
}

impl Path {
    pub fn new(start: NodeId, end: NodeId, hops: Vec<Hop>) -> Result<Self> {
        match (hops.first(), hops.last()) {
            (None, _) | (_, None) if start != end => {
                return Err(Error::DisjointPath { end: start.index(), start: end.index() })
            }
            (Some(first), Some(last)) => {
                if first.source != start {
                    return Err(Error::DisjointPath { end: start.index(), start: first.source.index() });
                }
                if last.target != end {
                    return Err(Error::DisjointPath { end: last.target.index(), start: end.index() });
                }
            }
            _ => {}
        }
        for pair in hops.windows(2) {
            if pair[0].target != pair[1].source {
                return Err(Error::DisjointPath {
                    end: pair[0].target.index(),
                    start: pair[1].source.index(),
                });
            }
        }
        Ok(Self::from_parts(start, end, hops))
    }

    /// Build a path from a non-empty hop sequence; endpoints are taken from the hops.
    pub fn from_hops(hops: Vec<Hop>) -> Result<Self> {
        let (Some(first), Some(last)) = (hops.first(), hops.last()) else {
            return Err(Error::InvalidParameter("a path needs at least one hop".into()));
        };
        let (start, end) = (first.source, last.target);
        Self::new(start, end, hops)
    }

    pub fn trivial(node: NodeId) -> Self {
        Self::from_parts(node, node, Vec::new())
    }

    /// Caller guarantees contiguity.
    pub(crate) fn from_parts(start: NodeId, end: NodeId, hops: Vec<Hop>) -> Self {
        let weight = hops.iter().map(|h| h.weight).sum();
        Self { start, end, hops, weight }
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Sum of edge weights.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hop> {
        self.hops.iter()
    }

    /// Visited nodes in order, both endpoints included.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes = Vec::with_capacity(self.hops.len() + 1);
        nodes.push(self.start);
        nodes.extend(self.hops.iter().map(|h| h.target));
        nodes
    }

    pub fn edges(&self) -> Vec<EdgeId> {
        self.hops.iter().map(|h| h.edge).collect()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.start == node || self.hops.iter().any(|h| h.target == node)
    }

    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.hops.iter().any(|h| h.edge == edge)
    }

    /// No node is visited twice.
    pub fn is_loopless(&self) -> bool {
        let mut nodes = self.nodes();
        let n = nodes.len();
        nodes.sort_unstable();
        nodes.dedup();
        nodes.len() == n
    }

    /// `self` followed by `other`; `other` must start where `self` ends.
    pub fn append(&self, other: &Path) -> Result<Path> {
        if self.end != other.start {
            return Err(Error::DisjointPath { end: self.end.index(), start: other.start.index() });
        }
        let mut hops = Vec::with_capacity(self.hops.len() + other.hops.len());
        hops.extend_from_slice(&self.hops);
        hops.extend_from_slice(&other.hops);
        Ok(Self { start: self.start, end: other.end, hops, weight: self.weight + other.weight })
    }

    /// The run from the first visit of `from` to the last visit of `to` after it.
    pub fn sub_path(&self, from: NodeId, to: NodeId) -> Result<Path> {
        let nodes = self.nodes();
        let i = nodes.iter().position(|&n| n == from).ok_or(Error::NodeNotOnPath(from.index()))?;
        let j = nodes
            .iter()
            .rposition(|&n| n == to)
            .filter(|&j| j >= i)
            .ok_or(Error::NodeNotOnPath(to.index()))?;
        Ok(Self::from_parts(from, to, self.hops[i..j].to_vec()))
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Hop;
    type IntoIter = std::slice::Iter<'a, Hop>;

    fn into_iter(self) -> Self::IntoIter {
        self.hops.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::stable_graph::{EdgeIndex, NodeIndex};

    fn hop(e: usize, s: usize, t: usize, w: f64) -> Hop {
        Hop { edge: EdgeIndex::new(e), source: NodeIndex::new(s), target: NodeIndex::new(t), weight: w }
    }

    fn n(i: usize) -> NodeId {
        NodeIndex::new(i)
    }

    fn chain() -> Path {
        Path::from_hops(vec![hop(0, 0, 1, 1.0), hop(1, 1, 2, 2.5), hop(2, 2, 3, 0.5)]).unwrap()
    }

    #[test]
    fn length_and_weight() {
        let p = chain();
        assert_eq!(p.len(), 3);
        assert_eq!(p.weight(), 4.0);
        assert_eq!(p.nodes(), vec![n(0), n(1), n(2), n(3)]);
        assert!(p.is_loopless());
        assert_eq!(p.iter().count(), 3);
        assert_eq!((&p).into_iter().count(), 3);
    }

    #[test]
    fn rejects_gaps() {
        let err = Path::from_hops(vec![hop(0, 0, 1, 1.0), hop(1, 2, 3, 1.0)]).unwrap_err();
        assert!(matches!(err, Error::DisjointPath { end: 1, start: 2 }));
        assert!(Path::new(n(5), n(3), vec![hop(0, 0, 3, 1.0)]).is_err());
        assert!(Path::new(n(0), n(1), vec![]).is_err());
        assert!(Path::new(n(0), n(0), vec![]).unwrap().is_empty());
    }

    #[test]
    fn append_requires_contiguity() {
        let p = chain();
        let q = Path::from_hops(vec![hop(3, 3, 4, 1.0)]).unwrap();
        let pq = p.append(&q).unwrap();
        assert_eq!(pq.len(), 4);
        assert_eq!(pq.weight(), 5.0);
        assert_eq!(pq.end(), n(4));
        assert!(matches!(q.append(&p), Err(Error::DisjointPath { .. })));
    }

    #[test]
    fn sub_path_round_trips() {
        let p = chain();
        assert_eq!(p.sub_path(p.start(), p.end()).unwrap(), p);
        let ab = p.sub_path(n(0), n(2)).unwrap();
        let bc = p.sub_path(n(2), n(3)).unwrap();
        assert_eq!(ab.append(&bc).unwrap(), p.sub_path(n(0), n(3)).unwrap());
        assert_eq!(p.sub_path(n(1), n(1)).unwrap(), Path::trivial(n(1)));
        assert!(matches!(p.sub_path(n(2), n(1)), Err(Error::NodeNotOnPath(1))));
        assert!(matches!(p.sub_path(n(9), n(1)), Err(Error::NodeNotOnPath(9))));
    }
}
