//! Single-source shortest paths (Dijkstra), distance aggregation, path unions and the metric
//! closure over a terminal set.
//!
//! Public invariant:
//! - Weights must be non-negative; every entry point validates the graph first.
//! - "No path" is `Ok(None)` (or an absent entry), never an error.
//! - Ties are resolved deterministically: the heap is keyed by `(estimate, cost, node index)`
//!   and hops are relaxed in edge insertion order.

use crate::graph::{BioGraph, EdgeId, Hop, NodeId, Orientation, Vertex};
use crate::path::Path;
use crate::Result;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Result of a single-source search: distances and the last hop into every reached node.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    source: NodeId,
    dist: HashMap<NodeId, f64>,
    pred: HashMap<NodeId, Hop>,
}

impl ShortestPathTree {
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// `None` when `node` was not reached.
    pub fn distance(&self, node: NodeId) -> Option<f64> {
        self.dist.get(&node).copied()
    }

    /// Reached nodes (the source included) with their distances.
    pub fn reached(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.dist.iter().map(|(&n, &d)| (n, d))
    }

    /// Best path from the source to `target`; `None` if unreachable or `target` is the source.
    pub fn path_to(&self, target: NodeId) -> Option<Path> {
        if target == self.source || !self.pred.contains_key(&target) {
            return None;
        }
        let mut hops = Vec::new();
        let mut cur = target;
        while cur != self.source {
            let hop = self.pred.get(&cur)?;
            hops.push(*hop);
            cur = hop.source;
            if hops.len() > self.pred.len() {
                return None;
            }
        }
        hops.reverse();
        Some(Path::from_parts(self.source, target, hops))
    }
}

/// Nodes and edges a search must not use (Yen spur searches).
#[derive(Debug, Default, Clone)]
pub(crate) struct Exclusions {
    pub nodes: HashSet<NodeId>,
    pub edges: HashSet<EdgeId>,
}

/// Best-first search shared by Dijkstra and A*.
///
/// With `target = Some(t)` the search stops once `t` is settled. `heuristic(n)` estimates the
/// remaining cost from `n` to the target; use `|_| 0.0` for plain Dijkstra. Weights are assumed
/// validated by the caller.
pub(crate) fn search<N, E, H>(
    graph: &BioGraph<N, E>,
    source: NodeId,
    target: Option<NodeId>,
    orientation: Orientation,
    exclusions: &Exclusions,
    heuristic: H,
) -> ShortestPathTree
where
    N: Vertex,
    E: Clone,
    H: Fn(NodeId) -> f64,
{
    let mut dist: HashMap<NodeId, f64> = HashMap::new();
    let mut pred: HashMap<NodeId, Hop> = HashMap::new();
    let mut heap = BinaryHeap::new();

    let estimate = |n: NodeId, g: f64| -> OrderedFloat<f64> {
        let h = heuristic(n);
        let h = if h.is_finite() && h > 0.0 { h } else { 0.0 };
        OrderedFloat(g + h)
    };

    dist.insert(source, 0.0);
    heap.push(Reverse((estimate(source, 0.0), OrderedFloat(0.0), source)));

    while let Some(Reverse((_, OrderedFloat(g), node))) = heap.pop() {
        // Stale entry: a cheaper route to `node` was found after this one was queued.
        if g > dist.get(&node).copied().unwrap_or(f64::INFINITY) {
            continue;
        }
        if Some(node) == target {
            break;
        }
        for hop in graph.hops(node, orientation) {
            if hop.target == node
                || exclusions.edges.contains(&hop.edge)
                || exclusions.nodes.contains(&hop.target)
            {
                continue;
            }
            let cand = g + hop.weight;
            if cand < dist.get(&hop.target).copied().unwrap_or(f64::INFINITY) {
                dist.insert(hop.target, cand);
                pred.insert(hop.target, hop);
                heap.push(Reverse((estimate(hop.target, cand), OrderedFloat(cand), hop.target)));
            }
        }
    }

    ShortestPathTree { source, dist, pred }
}

/// Dijkstra from `source` over the whole reachable graph.
pub fn shortest_path_tree<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    source: NodeId,
    orientation: Orientation,
) -> Result<ShortestPathTree> {
    graph.check_node(source)?;
    graph.validate_weights()?;
    Ok(search(graph, source, None, orientation, &Exclusions::default(), |_| 0.0))
}

/// Minimum-weight directed path from `start` to `end`.
pub fn shortest_path<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    start: NodeId,
    end: NodeId,
) -> Result<Option<Path>> {
    shortest_path_oriented(graph, start, end, Orientation::Directed)
}

pub fn shortest_path_oriented<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    start: NodeId,
    end: NodeId,
    orientation: Orientation,
) -> Result<Option<Path>> {
    graph.check_node(start)?;
    graph.check_node(end)?;
    graph.validate_weights()?;
    let tree = search(graph, start, Some(end), orientation, &Exclusions::default(), |_| 0.0);
    Ok(tree.path_to(end))
}

fn reduce_distances<N, E, F>(
    graph: &BioGraph<N, E>,
    sources: &[NodeId],
    targets: &[NodeId],
    orientation: Orientation,
    mut reduce: F,
) -> Result<HashMap<NodeId, f64>>
where
    N: Vertex,
    E: Clone,
    F: FnMut(&[f64]) -> f64,
{
    for &n in sources.iter().chain(targets) {
        graph.check_node(n)?;
    }
    graph.validate_weights()?;
    let mut out = HashMap::with_capacity(sources.len());
    for &s in sources {
        let tree = search(graph, s, None, orientation, &Exclusions::default(), |_| 0.0);
        let reached: Vec<f64> =
            targets.iter().filter(|&&t| t != s).filter_map(|&t| tree.distance(t)).collect();
        out.insert(s, reduce(&reached));
    }
    Ok(out)
}

/// For each source, the distance to its closest target (`+inf` if none is reachable).
pub fn min_distance<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    sources: &[NodeId],
    targets: &[NodeId],
    orientation: Orientation,
) -> Result<HashMap<NodeId, f64>> {
    reduce_distances(graph, sources, targets, orientation, |d| d.iter().copied().fold(f64::INFINITY, f64::min))
}

/// For each source, the mean distance over reachable targets (`+inf` if none is reachable).
pub fn average_distance<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    sources: &[NodeId],
    targets: &[NodeId],
    orientation: Orientation,
) -> Result<HashMap<NodeId, f64>> {
    reduce_distances(graph, sources, targets, orientation, |d| {
        if d.is_empty() {
            f64::INFINITY
        } else {
            d.iter().sum::<f64>() / d.len() as f64
        }
    })
}

/// Best paths from every source to every other target, one per reachable ordered pair.
pub fn shortest_paths_between<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    sources: &[NodeId],
    targets: &[NodeId],
    orientation: Orientation,
) -> Result<Vec<Path>> {
    for &n in sources.iter().chain(targets) {
        graph.check_node(n)?;
    }
    graph.validate_weights()?;
    let mut paths = Vec::new();
    for &s in sources {
        let tree = search(graph, s, None, orientation, &Exclusions::default(), |_| 0.0);
        paths.extend(targets.iter().filter_map(|&t| tree.path_to(t)));
    }
    Ok(paths)
}

/// Deduplicated edge union of the best paths between all ordered pairs of `nodes`, in
/// first-seen order. Feed it to [`BioGraph::induced_subgraph`] to extract the subnetwork.
pub fn shortest_path_union<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    nodes: &[NodeId],
    orientation: Orientation,
) -> Result<Vec<EdgeId>> {
    let paths = shortest_paths_between(graph, nodes, nodes, orientation)?;
    Ok(edge_union(&paths))
}

pub(crate) fn edge_union<'a, I: IntoIterator<Item = &'a Path>>(paths: I) -> Vec<EdgeId> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for p in paths {
        for e in p.edges() {
            if seen.insert(e) {
                out.push(e);
            }
        }
    }
    out
}

/// Metric closure over `terminals`: a graph on the terminals whose edges carry the underlying
/// best path (weight = path weight). Unconnected pairs get no edge.
///
/// Undirected closures hold one edge per unordered pair, oriented from the earlier terminal in
/// `terminals` to the later one.
pub fn metric_closure<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    terminals: &[NodeId],
    orientation: Orientation,
) -> Result<BioGraph<N, Path>> {
    build_closure(graph, terminals, terminals, orientation)
}

/// Directed metric closure from `sources` to `targets`.
pub fn metric_closure_between<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    sources: &[NodeId],
    targets: &[NodeId],
) -> Result<BioGraph<N, Path>> {
    build_closure(graph, sources, targets, Orientation::Directed)
}

fn build_closure<N: Vertex, E: Clone>(
    graph: &BioGraph<N, E>,
    sources: &[NodeId],
    targets: &[NodeId],
    orientation: Orientation,
) -> Result<BioGraph<N, Path>> {
    for &n in sources.iter().chain(targets) {
        graph.check_node(n)?;
    }
    graph.validate_weights()?;

    let mut closure: BioGraph<N, Path> = BioGraph::new();
    let mut local: HashMap<NodeId, NodeId> = HashMap::new();
    for &n in sources.iter().chain(targets) {
        if let Some(v) = graph.node(n) {
            local.entry(n).or_insert_with(|| closure.add_node(v.clone()));
        }
    }

    // First occurrence orders each unordered pair.
    let mut rank: HashMap<NodeId, usize> = HashMap::new();
    for (i, &n) in sources.iter().chain(targets).enumerate() {
        rank.entry(n).or_insert(i);
    }
    let mut done: HashSet<(NodeId, NodeId)> = HashSet::new();
    for &s in sources {
        let tree = search(graph, s, None, orientation, &Exclusions::default(), |_| 0.0);
        for &t in targets {
            if orientation == Orientation::Undirected {
                let pair = if rank[&s] <= rank[&t] { (s, t) } else { (t, s) };
                if !done.insert(pair) {
                    continue;
                }
            }
            let Some(path) = tree.path_to(t) else { continue };
            let (Some(&ls), Some(&lt)) = (local.get(&s), local.get(&t)) else { continue };
            let weight = path.weight();
            let e = closure.add_derived_edge(ls, lt, path)?;
            closure.set_weight(e, weight)?;
        }
    }
    tracing::debug!(
        terminals = closure.node_count(),
        edges = closure.edge_count(),
        "built metric closure"
    );
    Ok(closure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn build(keys: &[&str], edges: &[(usize, usize, f64)]) -> (BioGraph<String>, Vec<NodeId>, Vec<EdgeId>) {
        let mut g = BioGraph::new();
        let n: Vec<NodeId> = keys.iter().map(|k| g.add_node(k.to_string())).collect();
        let e = edges
            .iter()
            .map(|&(s, t, w)| {
                let e = g.add_edge(n[s], n[t], ()).unwrap();
                g.set_weight(e, w).unwrap();
                e
            })
            .collect();
        (g, n, e)
    }

    #[test]
    fn picks_the_lighter_detour() {
        let (g, n, e) = build(&["a", "b", "c"], &[(0, 2, 10.0), (0, 1, 1.0), (1, 2, 1.0)]);
        let p = shortest_path(&g, n[0], n[2]).unwrap().unwrap();
        assert_eq!(p.edges(), vec![e[1], e[2]]);
        assert_eq!(p.weight(), 2.0);
    }

    #[test]
    fn parallel_edges_use_the_lightest() {
        let (g, n, e) = build(&["a", "b"], &[(0, 1, 3.0), (0, 1, 1.0)]);
        let p = shortest_path(&g, n[0], n[1]).unwrap().unwrap();
        assert_eq!(p.edges(), vec![e[1]]);
    }

    #[test]
    fn unreachable_is_none_unknown_is_error() {
        let (g, n, _) = build(&["a", "b"], &[(0, 1, 1.0)]);
        assert!(shortest_path(&g, n[1], n[0]).unwrap().is_none());
        assert!(shortest_path(&g, n[0], n[0]).unwrap().is_none());
        let p = shortest_path_oriented(&g, n[1], n[0], Orientation::Undirected).unwrap().unwrap();
        assert_eq!(p.nodes(), vec![n[1], n[0]]);
        let ghost = petgraph::stable_graph::NodeIndex::new(42);
        assert!(matches!(shortest_path(&g, n[0], ghost), Err(Error::UnknownNode(_))));
    }

    #[test]
    fn sentinel_weights_fail_fast() {
        let (g, n, _) = build(&["a", "b"], &[(0, 1, -1.0)]);
        assert!(matches!(shortest_path(&g, n[0], n[1]), Err(Error::NegativeWeight { .. })));
    }

    #[test]
    fn min_and_average_distance() {
        let (g, n, _) = build(&["s", "x", "y", "z"], &[(0, 1, 1.0), (1, 2, 2.0), (0, 3, 5.0)]);
        let min = min_distance(&g, &[n[0], n[2]], &[n[2], n[3]], Orientation::Directed).unwrap();
        assert_eq!(min[&n[0]], 3.0);
        assert_eq!(min[&n[2]], f64::INFINITY);
        let avg = average_distance(&g, &[n[0]], &[n[2], n[3]], Orientation::Directed).unwrap();
        assert_eq!(avg[&n[0]], 4.0);
    }

    #[test]
    fn union_deduplicates_edges() {
        let (g, n, e) = build(&["a", "b", "c"], &[(0, 1, 1.0), (1, 2, 1.0)]);
        let union = shortest_path_union(&g, &[n[0], n[1], n[2]], Orientation::Directed).unwrap();
        assert_eq!(union, vec![e[0], e[1]]);
        let sub = g.induced_subgraph(union);
        assert_eq!(sub.edge_count(), 2);
    }

    #[test]
    fn metric_closure_annotates_paths() {
        let (g, n, _) = build(&["a", "m", "b", "lone"], &[(0, 1, 1.0), (1, 2, 2.0)]);
        let closure = metric_closure(&g, &[n[0], n[2], n[3]], Orientation::Undirected).unwrap();
        assert_eq!(closure.node_count(), 3);
        assert_eq!(closure.edge_count(), 1);
        let e = closure.edge_ids().next().unwrap();
        assert_eq!(closure.weight(e), Some(3.0));
        assert_eq!(closure.edge(e).unwrap().len(), 2);

        let directed = metric_closure_between(&g, &[n[2]], &[n[0]]).unwrap();
        assert_eq!(directed.edge_count(), 0);
    }

    #[test]
    fn undirected_closure_has_one_edge_per_pair() {
        let (g, n, _) = build(&["a", "m", "b"], &[(0, 1, 1.0), (1, 2, 2.0)]);
        let closure = metric_closure(&g, &[n[2], n[0], n[2]], Orientation::Undirected).unwrap();
        assert_eq!(closure.node_count(), 2);
        assert_eq!(closure.edge_count(), 1);
        let both = metric_closure(&g, &[n[0], n[2]], Orientation::Directed).unwrap();
        assert_eq!(both.edge_count(), 1);
    }
}
