use rxngraph::{
    betweenness_centrality, eigenvector_centrality, geodesic_betweenness, k_shortest_paths,
    k_shortest_union, pagerank, passage_times, shortest_path, shortest_path_oriented,
    steiner_tree, top_k, AllPairsConfig, BetweennessConfig, BioGraph, Compound, CompoundGraph,
    EdgeId, Error, Evidence, FloydWarshall, NodeId, Orientation, PassageConfig, Path,
    Probability, RankConfig, ReactionEdge, ReactionGrouped, Uniform, WeightingPolicy,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// a->b, b->c, a->d, d->e, e->f, f->c, all weight 1.0.
fn detour_graph() -> (BioGraph<String>, Vec<NodeId>, Vec<EdgeId>) {
    let mut g = BioGraph::new();
    let n: Vec<NodeId> = ["a", "b", "c", "d", "e", "f"].iter().map(|k| g.add_node(k.to_string())).collect();
    let e = [(0, 1), (1, 2), (0, 3), (3, 4), (4, 5), (5, 2)]
        .iter()
        .map(|&(s, t)| g.add_edge(n[s], n[t], ()).unwrap())
        .collect();
    (g, n, e)
}

fn keys(g: &BioGraph<String>, p: &Path) -> Vec<String> {
    p.nodes().iter().filter_map(|&n| g.key(n).map(str::to_owned)).collect()
}

#[test]
fn shortest_path_reroutes_after_reweighting() {
    init_tracing();
    let (mut g, n, e) = detour_graph();

    let p = shortest_path(&g, n[0], n[2]).unwrap().unwrap();
    assert_eq!(p.len(), 2);
    assert_eq!(p.weight(), 2.0);
    assert_eq!(p.edges(), vec![e[0], e[1]]);

    g.set_weight(e[1], 1000.0).unwrap();
    let p = shortest_path(&g, n[0], n[2]).unwrap().unwrap();
    assert_eq!(p.len(), 4);
    assert_eq!(p.weight(), 4.0);
    assert_eq!(keys(&g, &p), ["a", "d", "e", "f", "c"]);
}

#[test]
fn k_shortest_are_ordered_and_loopless() {
    init_tracing();
    let (mut g, n, _) = detour_graph();
    g.add_edge(n[4], n[1], ()).unwrap();

    let paths = k_shortest_paths(&g, n[0], n[2], 3).unwrap();
    assert_eq!(paths.len(), 3);
    assert!(paths.windows(2).all(|w| w[0].weight() <= w[1].weight()));
    assert!(paths.iter().all(Path::is_loopless));
    assert_eq!(paths[0].weight(), 2.0);
    let weights: Vec<f64> = paths.iter().map(Path::weight).collect();
    assert_eq!(weights, [2.0, 4.0, 4.0]);

    let union = k_shortest_union(&g, &[n[0], n[2]], 3, Orientation::Directed).unwrap();
    let sub = g.induced_subgraph(union.iter().copied());
    assert_eq!(sub.edge_count(), union.len());
    assert!(sub.contains_node(n[4]));
}

#[test]
fn undirected_search_walks_edges_backwards() {
    let (g, n, _) = detour_graph();
    assert!(shortest_path(&g, n[2], n[0]).unwrap().is_none());
    let back = shortest_path_oriented(&g, n[2], n[0], Orientation::Undirected).unwrap().unwrap();
    assert_eq!(back.weight(), 2.0);
    assert!(back.iter().all(|h| h.is_reversed(&g)));
}

#[test]
fn all_pairs_agrees_with_single_pair_search() {
    let (mut g, n, e) = detour_graph();
    g.set_weight(e[1], 10.0).unwrap();
    g.set_weight(e[4], 0.5).unwrap();

    let mut fw = FloydWarshall::new(&g);
    for &s in &n {
        for &t in &n {
            let d = fw.distance(s, t).unwrap().unwrap();
            if s == t {
                assert_eq!(d, 0.0);
                continue;
            }
            match shortest_path(&g, s, t).unwrap() {
                Some(p) => {
                    assert!((p.weight() - d).abs() < 1e-12);
                    assert_eq!(fw.path(s, t).unwrap().map(|q| q.weight()), Some(d));
                }
                None => assert_eq!(d, f64::INFINITY),
            }
        }
    }

    let mut undirected = FloydWarshall::with_config(&g, AllPairsConfig::undirected());
    assert!(undirected.distances().unwrap().is_symmetric(1e-12));
}

#[test]
fn star_betweenness() {
    // One center, 5 leaves, bidirectional spokes: n = 6 nodes in total.
    let mut g: BioGraph<String> = BioGraph::new();
    let center = g.add_node("center".into());
    let leaves: Vec<NodeId> = (0..5).map(|i| g.add_node(format!("leaf{i}"))).collect();
    for &l in &leaves {
        g.add_edge(center, l, ()).unwrap();
        g.add_edge(l, center, ()).unwrap();
    }
    let n = g.node_count() as f64;

    let mut fw = FloydWarshall::new(&g);
    let geo = geodesic_betweenness(&mut fw).unwrap();
    assert_eq!(geo[&center], (n - 1.0) * (n - 2.0));
    assert!(leaves.iter().all(|l| geo[l] == 0.0));

    let brandes = betweenness_centrality(&g, BetweennessConfig::default()).unwrap();
    assert_eq!(brandes[&center], geo[&center]);
    assert_eq!(top_k(&brandes, 1), vec![(center, 20.0)]);
}

#[test]
fn wheel_rank_is_proportional_to_degree() {
    // Hub joined to all six rim nodes; rim is a cycle. Hub degree 6, rim degree 3.
    let mut g: BioGraph<String> = BioGraph::new();
    let hub = g.add_node("hub".into());
    let rim: Vec<NodeId> = (0..6).map(|i| g.add_node(format!("r{i}"))).collect();
    for i in 0..6 {
        for (a, b) in [(hub, rim[i]), (rim[i], rim[(i + 1) % 6])] {
            g.add_edge(a, b, ()).unwrap();
            g.add_edge(b, a, ()).unwrap();
        }
    }
    let config = RankConfig { jump: 0.0, max_iterations: 1000, tolerance: 1e-13, ..RankConfig::default() };
    let run = pagerank(&g, config).unwrap();
    assert!(run.converged);
    for r in &rim {
        assert!((run.scores[&hub] / run.scores[r] - 2.0).abs() < 1e-6);
    }

    let empty: BioGraph<String> = {
        let mut g = BioGraph::new();
        g.add_node("lonely".into());
        g
    };
    assert!(matches!(eigenvector_centrality(&empty, config), Err(Error::NoEdges)));
}

#[test]
fn compound_network_end_to_end() {
    init_tracing();
    // glc -> g6p -> f6p -> pyr, with a side branch g6p -> pgl -> pyr through a poorly supported
    // reaction. Terminals glc and pyr.
    let mut g: CompoundGraph = BioGraph::new();
    let id = |g: &mut CompoundGraph, k: &str| g.add_node(Compound::new(k));
    let glc = id(&mut g, "glc");
    let g6p = id(&mut g, "g6p");
    let f6p = id(&mut g, "f6p");
    let pgl = id(&mut g, "pgl");
    let pyr = id(&mut g, "pyr");
    for (s, t, r) in [(glc, g6p, "HEX1"), (g6p, f6p, "PGI"), (f6p, pyr, "PFK"), (g6p, pgl, "G6PDH"), (pgl, pyr, "PGL")] {
        g.add_edge(s, t, ReactionEdge::new(r)).unwrap();
    }

    let grouped = ReactionGrouped { inner: Uniform, group: |e: &ReactionEdge| e.reaction.clone() };
    Probability(grouped).apply(&mut g).unwrap();
    let out: f64 = g.outgoing(g6p).iter().filter_map(|&e| g.weight(e)).sum();
    assert!((out - 1.0).abs() < 1e-12);

    let tree = steiner_tree(&g, &[glc, pyr], Orientation::Undirected).unwrap();
    assert_eq!(tree.covered().len(), 2);
    assert_eq!(tree.edges().len(), 3);

    let filter = Evidence::new(Uniform, |e: rxngraph::EdgeView<'_, ReactionEdge>| e.payload.reaction != "PGI");
    filter.apply(&mut g).unwrap();
    let p = shortest_path(&g, glc, pyr).unwrap().unwrap();
    assert!(p.contains_node(pgl));

    let times = passage_times(&g, &[glc, pyr], PassageConfig::default()).unwrap();
    assert!((times.nodes[&pgl] - 1.0).abs() < 1e-9);
}
