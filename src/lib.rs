//! `rxngraph`: topology analysis for biological reaction networks.
//!
//! A reaction network is modeled as a directed, weighted multigraph ([`BioGraph`]) whose nodes
//! are compounds, reactions or pathways. On top of it this crate provides path search
//! (single-pair, k-shortest, all-pairs, A*), a Steiner tree approximation, and three centrality
//! families (path-based, eigenvector/personalized rank, absorbing random walk).
//!
//! Public invariants (must not drift):
//! - **Identity**: nodes and edges are addressed by [`NodeId`] / [`EdgeId`]; parallel edges
//!   between the same pair are distinct and never deduplicated implicitly.
//! - **Read-only engines**: algorithms take `&BioGraph` and return new values ([`Path`],
//!   matrices, maps, subgraphs). Only weighting policies and explicit transforms mutate.
//! - **Non-negative search**: weighted searches fail fast with [`Error::NegativeWeight`] when a
//!   negative or NaN weight (including [`UNSUPPORTED_WEIGHT`]) is present.
//! - **Determinism**: results depend only on the graph, the inputs and (for randomized
//!   components) the explicit seed. Ties are broken by edge insertion order.
//!
//! Swappable (allowed to change without breaking the contract):
//! - internal data structures and heap layout
//! - which of several equal-weight paths is returned

pub mod allpairs;
pub mod astar;
pub mod betweenness;
pub mod entity;
pub mod graph;
pub mod kshortest;
pub mod pagerank;
pub mod path;
pub mod random_walk;
pub mod reachability;
pub mod sampling;
pub mod shortest;
pub mod steiner;
pub mod topk;
pub mod weighting;

pub use allpairs::{AllPairsConfig, Combiner, DistanceMatrix, FloydWarshall, PathMatrix};
pub use astar::{astar, astar_oriented, zero_heuristic};
pub use betweenness::{
    betweenness_centrality, closeness, eccentricity, farness, geodesic_betweenness,
    BetweennessConfig, Flow,
};
pub use entity::{
    BipartiteGraph, BipartiteNode, Compound, CompoundGraph, Pathway, PathwayGraph, Reaction,
    ReactionEdge, ReactionGraph,
};
pub use graph::{BioGraph, EdgeId, EdgeView, Hop, Link, NodeId, Orientation, Vertex};
pub use kshortest::{
    k_shortest_paths, k_shortest_paths_between, k_shortest_paths_oriented, k_shortest_union,
};
pub use pagerank::{
    eigenvector_centrality, pagerank, personalized_rank, personalized_rank_checked, Norm,
    RankConfig, RankRun,
};
pub use path::Path;
pub use random_walk::{passage_times, PassageConfig, PassageTimes};
pub use reachability::{reachability_counts, reachable_from, reaching, ReachCounts};
pub use sampling::{sample_edges, sample_nodes};
pub use shortest::{
    average_distance, metric_closure, metric_closure_between, min_distance, shortest_path,
    shortest_path_oriented, shortest_path_tree, shortest_path_union, shortest_paths_between,
    ShortestPathTree,
};
pub use steiner::{steiner_tree, steiner_tree_between, SteinerTree};
pub use topk::{normalize, top_k};
pub use weighting::{
    Current, DegreeWeight, EdgeWeights, Evidence, FromFn, FromScore, Probability, RandomWeight,
    ReactionGrouped, Similarity, Uniform, Unsupported, WeightingPolicy, UNSUPPORTED_WEIGHT,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown node: {0}")]
    UnknownNode(String),
    #[error("unknown edge: {0}")]
    UnknownEdge(usize),
    #[error("self-loop rejected on node {0}")]
    SelfLoop(String),
    #[error("edge endpoints {source_key} -> {target_key} are not compatible in this graph")]
    IncompatibleEndpoints { source_key: String, target_key: String },
    #[error("paths are not contiguous: first ends at node {end}, second starts at node {start}")]
    DisjointPath { end: usize, start: usize },
    #[error("node {0} is not on the path")]
    NodeNotOnPath(usize),
    #[error("cannot sample {requested} elements out of {available}")]
    InvalidSampleSize { requested: usize, available: usize },
    #[error("no pair of terminals can be connected")]
    DisconnectedTerminals,
    #[error("iteration did not converge after {iterations} iterations (last delta {delta:e})")]
    NonConvergent { iterations: usize, delta: f64 },
    #[error("edge {edge} carries weight {weight}, which a non-negative search cannot use")]
    NegativeWeight { edge: usize, weight: f64 },
    #[error("graph has no edges")]
    NoEdges,
    #[error("linear system is singular")]
    SingularSystem,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
