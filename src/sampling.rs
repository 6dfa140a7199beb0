//! Seeded random sampling of nodes and edges.
//!
//! Samples are drawn without replacement from the id-sorted node (edge) list with a
//! `ChaCha8Rng` seeded from `seed`, so the same graph and seed always give the same sample.

use crate::graph::{BioGraph, EdgeId, NodeId, Vertex};
use crate::{Error, Result};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// `k` distinct nodes, in sampling order.
pub fn sample_nodes<N: Vertex, E: Clone>(graph: &BioGraph<N, E>, k: usize, seed: u64) -> Result<Vec<NodeId>> {
    let mut ids: Vec<NodeId> = graph.node_ids().collect();
    ids.sort_unstable();
    sample(&ids, k, seed)
}

/// `k` distinct edges, in sampling order.
pub fn sample_edges<N: Vertex, E: Clone>(graph: &BioGraph<N, E>, k: usize, seed: u64) -> Result<Vec<EdgeId>> {
    let mut ids: Vec<EdgeId> = graph.edge_ids().collect();
    ids.sort_unstable();
    sample(&ids, k, seed)
}

fn sample<T: Copy>(pool: &[T], k: usize, seed: u64) -> Result<Vec<T>> {
    if k > pool.len() {
        return Err(Error::InvalidSampleSize { requested: k, available: pool.len() });
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Ok(index::sample(&mut rng, pool.len(), k).into_iter().map(|i| pool[i]).collect())
}
