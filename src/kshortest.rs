//! K shortest loopless paths (Yen's deviation algorithm).
//!
//! Public invariant:
//! - Returned paths are loopless and pairwise distinct.
//! - Weights are non-decreasing; equal weights are ordered by hop count, then by discovery.
//! - Fewer than `k` paths is a normal result when fewer exist.

use crate::graph::{BioGraph, EdgeId, Link, NodeId, Orientation, Vertex};
use crate::path::Path;
use crate::shortest::{edge_union, search, Exclusions};
use crate::Result;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

pub fn k_shortest_paths<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    start: NodeId,
    end: NodeId,
    k: usize,
) -> Result<Vec<Path>> {
    k_shortest_paths_oriented(graph, start, end, k, Orientation::Directed)
}

pub fn k_shortest_paths_oriented<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    start: NodeId,
    end: NodeId,
    k: usize,
    orientation: Orientation,
) -> Result<Vec<Path>> {
    graph.check_node(start)?;
    graph.check_node(end)?;
    graph.validate_weights()?;
    Ok(yen(graph, start, end, k, orientation))
}

fn yen<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    start: NodeId,
    end: NodeId,
    k: usize,
    orientation: Orientation,
) -> Vec<Path> {
    if k == 0 || start == end {
        return Vec::new();
    }
    let Some(first) = search(graph, start, Some(end), orientation, &Exclusions::default(), |_| 0.0).path_to(end)
    else {
        return Vec::new();
    };

    let signature = |p: &Path| -> Vec<Link> { p.iter().map(|h| h.link()).collect() };
    let mut seen: HashSet<Vec<Link>> = HashSet::new();
    seen.insert(signature(&first));
    let mut accepted = vec![first];

    let mut pool: Vec<Path> = Vec::new();
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, usize, usize)>> = BinaryHeap::new();

    while accepted.len() < k {
        let Some(last) = accepted.last() else { break };
        let nodes = last.nodes();

        for i in 0..last.len() {
            let spur = nodes[i];
            let root = &last.hops()[..i];

            let mut excl = Exclusions::default();
            excl.nodes.extend(nodes[..i].iter().copied());
            for p in &accepted {
                if p.len() > i && p.hops()[..i].iter().map(|h| h.link()).eq(root.iter().map(|h| h.link())) {
                    excl.edges.insert(p.hops()[i].edge);
                }
            }

            let Some(spur_path) = search(graph, spur, Some(end), orientation, &excl, |_| 0.0).path_to(end) else {
                continue;
            };
            let mut hops = root.to_vec();
            hops.extend_from_slice(spur_path.hops());
            let candidate = Path::from_parts(start, end, hops);
            if seen.insert(signature(&candidate)) {
                heap.push(Reverse((OrderedFloat(candidate.weight()), candidate.len(), pool.len())));
                pool.push(candidate);
            }
        }

        let Some(Reverse((_, _, idx))) = heap.pop() else { break };
        accepted.push(pool[idx].clone());
    }

    tracing::trace!(requested = k, found = accepted.len(), "k shortest paths");
    accepted
}

/// Top-`k` paths between every ordered pair of `nodes`, concatenated pair by pair.
pub fn k_shortest_paths_between<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    nodes: &[NodeId],
    k: usize,
    orientation: Orientation,
) -> Result<Vec<Path>> {
    for &n in nodes {
        graph.check_node(n)?;
    }
    graph.validate_weights()?;
    let mut out = Vec::new();
    for &s in nodes {
        for &t in nodes {
            if s != t {
                out.extend(yen(graph, s, t, k, orientation));
            }
        }
    }
    Ok(out)
}

/// Deduplicated edge union of the top-`k` paths between every ordered pair of `nodes`.
pub fn k_shortest_union<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    nodes: &[NodeId],
    k: usize,
    orientation: Orientation,
) -> Result<Vec<EdgeId>> {
    let paths = k_shortest_paths_between(graph, nodes, k, orientation)?;
    Ok(edge_union(&paths))
}
