//! Reachability sets and transitive counts.
//!
//! Counts reuse one "visited stamp" buffer (`Vec<u32>`) across all start nodes instead of
//! re-allocating a `seen` set per BFS. Counts never include the start node itself, even when a
//! cycle leads back to it.

use crate::graph::{BioGraph, NodeId, Orientation, Vertex};
use crate::Result;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

/// Per-node transitive counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReachCounts {
    /// Number of distinct nodes that can reach the node.
    pub dependents: HashMap<NodeId, usize>,
    /// Number of distinct nodes the node can reach.
    pub dependencies: HashMap<NodeId, usize>,
}

/// Nodes reachable from any of `sources`, sources included, in BFS order.
pub fn reachable_from<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    sources: &[NodeId],
    orientation: Orientation,
) -> Result<Vec<NodeId>> {
    bfs(graph, sources, |n| graph.hops(n, orientation).into_iter().map(|h| h.target).collect())
}

/// Nodes that can reach any of `targets` along directed edges, targets included.
pub fn reaching<N: Vertex, E: Clone>(graph: &BioGraph<N, E>, targets: &[NodeId]) -> Result<Vec<NodeId>> {
    bfs(graph, targets, |n| graph.predecessors(n))
}

fn bfs<N, E, F>(graph: &BioGraph<N, E>, starts: &[NodeId], next: F) -> Result<Vec<NodeId>>
where
    N: Vertex,
    E: Clone,
    F: Fn(NodeId) -> Vec<NodeId>,
{
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    let mut order = Vec::new();
    for &s in starts {
        graph.check_node(s)?;
        if seen.insert(s) {
            queue.push_back(s);
        }
    }
    while let Some(cur) = queue.pop_front() {
        order.push(cur);
        for nx in next(cur) {
            if seen.insert(nx) {
                queue.push_back(nx);
            }
        }
    }
    Ok(order)
}

/// Transitive reachability counts for every node.
///
/// This is O(n (n + m)); it is meant for "blast radius" questions on graphs of a few
/// thousand nodes. No algorithm in this crate consumes it: it is a public helper for callers
/// that want to rank nodes by how much of the network depends on them.
pub fn reachability_counts<N: Vertex, E: Clone>(graph: &BioGraph<N, E>) -> ReachCounts {
    let ids: Vec<NodeId> = graph.node_ids().collect();
    let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let adjacency = |dir: Direction| -> Vec<Vec<usize>> {
        ids.iter()
            .map(|&n| {
                let edges = match dir {
                    Direction::Outgoing => graph.successors(n),
                    Direction::Incoming => graph.predecessors(n),
                };
                edges.iter().filter_map(|m| index.get(m).copied()).collect()
            })
            .collect()
    };
    let fwd = adjacency(Direction::Outgoing);
    let rev = adjacency(Direction::Incoming);

    let n = ids.len();
    let mut visited = vec![0u32; n];
    let mut stamp = 0u32;
    let mut queue: Vec<usize> = Vec::new();
    let mut count_from = |start: usize, adj: &[Vec<usize>]| -> usize {
        stamp = stamp.wrapping_add(1);
        queue.clear();
        visited[start] = stamp;
        queue.push(start);
        let mut head = 0;
        while head < queue.len() {
            let cur = queue[head];
            head += 1;
            for &nx in &adj[cur] {
                if visited[nx] != stamp {
                    visited[nx] = stamp;
                    queue.push(nx);
                }
            }
        }
        queue.len() - 1
    };

    let mut counts = ReachCounts::default();
    for (i, &node) in ids.iter().enumerate() {
        counts.dependencies.insert(node, count_from(i, &fwd));
        counts.dependents.insert(node, count_from(i, &rev));
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(n: usize, edges: &[(usize, usize)]) -> (BioGraph<String>, Vec<NodeId>) {
        let mut g = BioGraph::new();
        let ids: Vec<NodeId> = (0..n).map(|i| g.add_node(format!("n{i}"))).collect();
        for &(s, t) in edges {
            g.add_edge(ids[s], ids[t], ()).unwrap();
        }
        (g, ids)
    }

    #[test]
    fn counts_on_small_dag() {
        // 0 -> 1 -> 2, 0 -> 2, and 3 isolated
        let (g, n) = build(4, &[(0, 1), (1, 2), (0, 2)]);
        let c = reachability_counts(&g);
        assert_eq!(c.dependencies[&n[0]], 2);
        assert_eq!(c.dependencies[&n[1]], 1);
        assert_eq!(c.dependencies[&n[2]], 0);
        assert_eq!(c.dependencies[&n[3]], 0);
        assert_eq!(c.dependents[&n[2]], 2);
        assert_eq!(c.dependents[&n[1]], 1);
        assert_eq!(c.dependents[&n[0]], 0);
    }

    #[test]
    fn cycle_does_not_count_start() {
        let (g, n) = build(3, &[(0, 1), (1, 2), (2, 0)]);
        let c = reachability_counts(&g);
        for id in n {
            assert_eq!(c.dependencies[&id], 2);
            assert_eq!(c.dependents[&id], 2);
        }
    }

    #[test]
    fn forward_backward_and_undirected_sets() {
        let (g, n) = build(4, &[(0, 1), (1, 2), (3, 2)]);
        assert_eq!(reachable_from(&g, &[n[0]], Orientation::Directed).unwrap(), vec![n[0], n[1], n[2]]);
        assert_eq!(reachable_from(&g, &[n[0]], Orientation::Undirected).unwrap().len(), 4);
        let mut up = reaching(&g, &[n[2]]).unwrap();
        up.sort();
        assert_eq!(up, n);
    }
}
