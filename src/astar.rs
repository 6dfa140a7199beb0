//! Goal-directed search (A*) with an externally supplied heuristic.
//!
//! The heuristic is a function of `(node, goal)` estimating the remaining cost, typically a
//! lower bound derived from chemical similarity. With an admissible heuristic the result has the
//! same weight as [`shortest_path`](crate::shortest_path); a heuristic returning `0.0`
//! everywhere degrades to plain Dijkstra. Negative or non-finite estimates are read as `0.0`.

use crate::graph::{BioGraph, NodeId, Orientation, Vertex};
use crate::path::Path;
use crate::shortest::{search, Exclusions};
use crate::Result;

/// Heuristic that never guides the search.
pub fn zero_heuristic(_node: NodeId, _goal: NodeId) -> f64 {
    0.0
}

pub fn astar<N, E, H>(graph: &BioGraph<N, E>, start: NodeId, goal: NodeId, heuristic: H) -> Result<Option<Path>>
where
    N: Vertex,
    E: Clone,
    H: Fn(NodeId, NodeId) -> f64,
{
    astar_oriented(graph, start, goal, Orientation::Directed, heuristic)
}

pub fn astar_oriented<N, E, H>(
    graph: &BioGraph<N, E>,
    start: NodeId,
    goal: NodeId,
    orientation: Orientation,
    heuristic: H,
) -> Result<Option<Path>>
where
    N: Vertex,
    E: Clone,
    H: Fn(NodeId, NodeId) -> f64,
{
    graph.check_node(start)?;
    graph.check_node(goal)?;
    graph.validate_weights()?;
    let tree = search(graph, start, Some(goal), orientation, &Exclusions::default(), |n| heuristic(n, goal));
    Ok(tree.path_to(goal))
}
