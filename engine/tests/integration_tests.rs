use p2p_router::{
    algo::{
        dijkstra::query::{bidirectional_dijkstra::Server as BiDijkServer, dijkstra::Server as DijkServer, geo_dijkstra::Server as GeoDijkServer},
        edge_flags::*,
        partition::*,
        *,
    },
    cli::{Algorithm, Config},
    datastr::graph::*,
    experiments, io,
};
use rand::prelude::*;

fn graph() -> OwnedGraph {
    // One based in the picture, zero based in the code.
    //
    //            5
    //     1 ----------> 2
    //     |             ^ \
    //   3 |           1 |  \ 2
    //     v             |   v
    //     3 ------------+   4
    //     |                 ^
    //     +-------6---------+
    //
    // 5 is isolated.
    OwnedGraph::from_arcs(5, &[(0, 1, 5), (0, 2, 3), (2, 1, 1), (1, 3, 2), (2, 3, 6)])
}

fn coords_for(graph: &OwnedGraph) -> Coordinates {
    let pairs: Vec<(i32, i32)> = (0..graph.num_nodes() as i32).map(|i| (i * 1000, (i % 3) * 1000)).collect();
    Coordinates::from_pairs(&pairs).unwrap()
}

/// Bellman-Ford from a single source.
fn brute_force_distances(graph: &OwnedGraph, from: NodeId) -> Vec<Option<u64>> {
    let mut dist = vec![None; graph.num_nodes()];
    dist[from as usize] = Some(0u64);
    for _ in 0..graph.num_nodes() {
        let mut changed = false;
        for (tail, link) in graph.edges() {
            if let Some(tail_dist) = dist[tail as usize] {
                let candidate = tail_dist + u64::from(link.weight);
                if dist[link.node as usize].map_or(true, |head_dist| candidate < head_dist) {
                    dist[link.node as usize] = Some(candidate);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    dist
}

/// A random graph with coordinates, every edge at least as long as the great circle distance between its ends.
fn random_network(num_nodes: usize, num_arcs: usize, seed: u64) -> (OwnedGraph, Coordinates) {
    let mut rng = StdRng::seed_from_u64(seed);
    let pairs: Vec<(i32, i32)> = (0..num_nodes)
        .map(|_| (rng.gen_range(-1_000_000..1_000_000), rng.gen_range(40_000_000..41_000_000)))
        .collect();
    let coords = Coordinates::from_pairs(&pairs).unwrap();
    let arcs: Vec<(NodeId, NodeId, Weight)> = (0..num_arcs)
        .map(|_| {
            let tail = rng.gen_range(0..num_nodes as NodeId);
            let head = rng.gen_range(0..num_nodes as NodeId);
            let weight = p2p_router::geo::distance(coords.get(tail), coords.get(head)) + 1 + rng.gen_range(0..5000);
            (tail, head, weight)
        })
        .collect();
    (OwnedGraph::from_arcs(num_nodes, &arcs), coords)
}

fn path_weight(path: &[PathEdge]) -> Weight {
    path.iter().map(|edge| edge.weight).sum()
}

fn assert_valid_path(graph: &OwnedGraph, query: Query, path: &[PathEdge]) {
    let mut at = query.from;
    for edge in path {
        assert_eq!(edge.from, at);
        let link = graph.link(edge.edge_id);
        assert_eq!((link.node, link.weight), (edge.to, edge.weight));
        at = edge.to;
    }
    assert_eq!(at, query.to);
}

#[test]
fn plain_search_finds_shortest_path() {
    let graph = graph();
    let mut server = DijkServer::new(&graph);
    let query = Query { from: 0, to: 3 };
    let mut result = server.query(query);
    assert_eq!(result.distance(), Some(6));
    assert_eq!(result.node_path(query), vec![0, 2, 1, 3]);
}

#[test]
fn isolated_vertex_is_unreachable() {
    let graph = graph();
    let mut server = DijkServer::new(&graph);
    let mut result = server.query(Query { from: 0, to: 4 });
    assert!(!result.has_path());
    assert_eq!(result.distance(), None);
    assert!(result.path().is_empty());
}

#[test]
fn source_equals_target() {
    let graph = graph();
    let reverse = graph.reverse();
    let coords = coords_for(&graph);
    let query = Query { from: 2, to: 2 };
    assert_eq!(DijkServer::new(&graph).query(query).distance(), Some(0));
    assert_eq!(BiDijkServer::new(&graph, &reverse).query(query).distance(), Some(0));
    assert_eq!(GeoDijkServer::new(&graph, &coords).query(query).distance(), Some(0));
}

#[test]
fn square_corners_in_own_grid_cells() {
    let coords = Coordinates::from_pairs(&[(0, 0), (0, 100), (100, 0), (100, 100)]).unwrap();
    let partition = PartitioningType::Grid { rows: 2, columns: 2 }.partition(&coords).unwrap();
    assert_eq!(partition.num_regions(), 4);
    for region in partition.regions() {
        assert_eq!(region.vertices.len(), 1);
    }
}

#[test]
fn boundary_edge_flagged_by_both_policies() {
    // regions {0, 1} and {2, 3}, connected only by 1 -> 2
    let graph = OwnedGraph::from_arcs(4, &[(0, 1, 2), (1, 0, 2), (1, 2, 3), (2, 3, 1), (3, 2, 1)]);
    let reverse = graph.reverse();
    let partition = Partition::from_region_ids(vec![0, 0, 1, 1], 2);
    assert_eq!(partition.boundary_vertices(&graph), vec![1, 2]);

    let (naive, naive_roots) = EdgeFlags::compute(&graph, &reverse, &partition, FlagPolicy::Naive, false);
    let (enhanced, enhanced_roots) = EdgeFlags::compute(&graph, &reverse, &partition, FlagPolicy::Enhanced, false);
    assert!(enhanced_roots < naive_roots);

    let cross_edge = graph.edge_index(1, 2).unwrap();
    assert!(naive.is_flagged(cross_edge, 1));
    assert!(enhanced.is_flagged(cross_edge, 1));
    assert!(!enhanced.is_flagged(cross_edge, 0));
    for (tail, link) in graph.edges() {
        if partition.region_of(tail) == partition.region_of(link.node) {
            assert!(enhanced.is_flagged(link.edge_id, partition.region_of(tail)));
        }
    }
    assert_eq!(naive, enhanced);
}

#[test]
fn all_searches_agree_with_brute_force() {
    for seed in 0..5 {
        let (graph, coords) = random_network(60, 200, seed);
        let reverse = graph.reverse();
        let mut dijkstra = DijkServer::new(&graph);
        let mut bidirectional = BiDijkServer::new(&graph, &reverse);
        let mut geo = GeoDijkServer::new(&graph, &coords);

        for from in 0..graph.num_nodes() as NodeId {
            let distances = brute_force_distances(&graph, from);
            for to in 0..graph.num_nodes() as NodeId {
                let query = Query { from, to };
                let expected = distances[to as usize].map(|dist| dist as Weight);

                let mut result = dijkstra.query(query);
                assert_eq!(result.distance(), expected, "dijkstra {:?} seed {}", query, seed);
                if let Some(dist) = expected {
                    let path = result.path();
                    assert_valid_path(&graph, query, &path);
                    assert_eq!(path_weight(&path), dist);
                }

                let mut result = geo.query(query);
                assert_eq!(result.distance(), expected, "geo {:?} seed {}", query, seed);
                if expected.is_some() {
                    assert_valid_path(&graph, query, &result.path());
                }

                // the weak stopping rule may report a longer path, but never a shorter one or a wrong reachability
                let mut result = bidirectional.query(query);
                assert_eq!(result.has_path(), expected.is_some(), "bidirectional {:?} seed {}", query, seed);
                if let (Some(found), Some(dist)) = (result.distance(), expected) {
                    assert!(found >= dist);
                    let path = result.path();
                    assert_valid_path(&graph, query, &path);
                    assert_eq!(path_weight(&path), found);
                }
            }
        }
    }
}

#[test]
fn bidirectional_first_meeting_node_can_be_off_the_shortest_path() {
    // 0 --5--> 2 --5--> 1
    // 0 --3--> 3 --3--> 4 --3--> 1
    let graph = OwnedGraph::from_arcs(5, &[(0, 2, 5), (2, 1, 5), (0, 3, 3), (3, 4, 3), (4, 1, 3)]);
    let reverse = graph.reverse();
    let query = Query { from: 0, to: 1 };

    assert_eq!(DijkServer::new(&graph).query(query).distance(), Some(9));

    let mut server = BiDijkServer::new(&graph, &reverse);
    let mut result = server.query(query);
    assert_eq!(result.distance(), Some(10));
    assert_eq!(result.node_path(query), vec![0, 2, 1]);
    assert_eq!(server.meeting_node(), Some(2));
}

#[test]
fn edge_flags_keep_distances_exact() {
    let (graph, coords) = random_network(80, 260, 17);
    let reverse = graph.reverse();
    let partitionings = [
        PartitioningType::Grid { rows: 3, columns: 4 },
        PartitioningType::QuadTree { max_vertices_per_quadrant: 6 },
        PartitioningType::KdTree { max_vertices_per_region: 4 },
    ];

    for partitioning in &partitionings {
        let partition = partitioning.partition(&coords).unwrap();
        assert_eq!(partition.num_nodes(), graph.num_nodes());

        for &policy in &[FlagPolicy::Naive, FlagPolicy::Enhanced] {
            let (flags, _) = EdgeFlags::compute(&graph, &reverse, &partition, policy, false);
            let (backward_flags, _) = EdgeFlags::compute(&reverse, &graph, &partition, policy, false);
            assert_eq!(flags.num_regions(), partition.num_regions());
            assert_eq!(flags.num_edges(), graph.num_arcs());

            let mut flagged = flagged_server(&graph, &flags, &partition);
            let mut bidirectional = bidirectional_flagged_server(&graph, &reverse, &flags, &backward_flags, &partition);
            let mut plain = DijkServer::new(&graph);

            for from in 0..graph.num_nodes() as NodeId {
                for to in 0..graph.num_nodes() as NodeId {
                    let query = Query { from, to };
                    let expected = plain.query(query).distance();

                    let mut result = flagged.query(query);
                    assert_eq!(result.distance(), expected, "{:?} {:?} {:?}", partitioning, policy, query);
                    if expected.is_some() {
                        assert_valid_path(&graph, query, &result.path());
                    }

                    let result = bidirectional.query(query);
                    assert_eq!(result.has_path(), expected.is_some(), "{:?} {:?} {:?}", partitioning, policy, query);
                    if let (Some(found), Some(dist)) = (result.distance(), expected) {
                        assert!(found >= dist);
                    }
                }
            }
        }
    }
}

#[test]
fn enhanced_flags_cover_naive_flags() {
    for seed in 0..3 {
        let (graph, coords) = random_network(50, 180, 100 + seed);
        let reverse = graph.reverse();
        let partition = PartitioningType::KdTree { max_vertices_per_region: 5 }.partition(&coords).unwrap();
        let (naive, naive_roots) = EdgeFlags::compute(&graph, &reverse, &partition, FlagPolicy::Naive, true);
        let (enhanced, enhanced_roots) = EdgeFlags::compute(&graph, &reverse, &partition, FlagPolicy::Enhanced, true);
        assert_eq!(naive_roots, graph.num_nodes());
        assert_eq!(enhanced_roots, partition.boundary_vertices(&graph).len());

        // enhanced may additionally flag same region edges which are on no shortest path
        for edge in 0..graph.num_arcs() as EdgeId {
            for region in 0..partition.num_regions() as RegionId {
                if naive.is_flagged(edge, region) {
                    assert!(enhanced.is_flagged(edge, region), "seed {} edge {} region {}", seed, edge, region);
                } else if enhanced.is_flagged(edge, region) {
                    let tail = graph.tail(edge);
                    assert_eq!(partition.region_of(tail), region);
                    assert_eq!(partition.region_of(graph.link(edge).node), region);
                }
            }
        }
    }
}

#[test]
fn partitions_cover_every_node_once() {
    let (_, coords) = random_network(150, 0, 3);
    let partitionings = [
        PartitioningType::Grid { rows: 5, columns: 5 },
        PartitioningType::QuadTree { max_vertices_per_quadrant: 6 },
        PartitioningType::KdTree { max_vertices_per_region: 4 },
    ];
    for partitioning in &partitionings {
        let partition = partitioning.partition(&coords).unwrap();
        let mut seen = vec![0; coords.len()];
        for (id, region) in partition.regions().iter().enumerate() {
            assert_eq!(region.id as usize, id);
            for &node in &region.vertices {
                seen[node as usize] += 1;
                assert_eq!(partition.region_of(node), region.id);
            }
        }
        assert!(seen.iter().all(|&count| count == 1), "{:?}", partitioning);
    }
}

#[test]
fn persisted_flags_are_reused_and_corrupt_files_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let (graph, coords) = random_network(40, 120, 5);
    let reverse = graph.reverse();
    let config = Config {
        algorithm: Algorithm::EdgeFlags,
        partitioning_type: 1,
        flag_dir: dir.path().join("flags"),
        ..Config::default()
    };

    let computed = preprocess(&graph, &reverse, &coords, &config).unwrap();
    assert!(!computed.stats.loaded_from_persisted_file);
    let path = flag_file_path(&config.flag_dir, false);
    assert!(path.exists());

    let loaded = preprocess(&graph, &reverse, &coords, &config).unwrap();
    assert!(loaded.stats.loaded_from_persisted_file);
    assert_eq!(loaded.stats.nodes_scanned, 0);
    assert_eq!(loaded.flags, computed.flags);

    std::fs::write(&path, "1\t2\t0101\n").unwrap();
    let recomputed = preprocess(&graph, &reverse, &coords, &config).unwrap();
    assert!(!recomputed.stats.loaded_from_persisted_file);
    assert_eq!(recomputed.flags, computed.flags);
    assert_eq!(EdgeFlags::read_from_file(&graph, computed.partition.num_regions(), &path).unwrap(), computed.flags);
}

#[test]
fn flags_of_another_partition_are_not_reused() {
    let dir = tempfile::tempdir().unwrap();
    let (graph, coords) = random_network(60, 200, 23);
    let reverse = graph.reverse();
    let by_rows = Config {
        algorithm: Algorithm::EdgeFlags,
        rows: 5,
        columns: 1,
        flag_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let by_columns = Config { rows: 1, columns: 5, ..by_rows.clone() };

    let first = preprocess(&graph, &reverse, &coords, &by_rows).unwrap();
    assert!(!first.stats.loaded_from_persisted_file);
    let second = preprocess(&graph, &reverse, &coords, &by_columns).unwrap();
    assert_eq!(first.partition.num_regions(), second.partition.num_regions());
    assert_ne!(first.partition.region_ids(), second.partition.region_ids());
    assert!(!second.stats.loaded_from_persisted_file);
    assert!(second.stats.nodes_scanned > 0);

    let mut flagged = flagged_server(&graph, &second.flags, &second.partition);
    let mut plain = DijkServer::new(&graph);
    for from in 0..graph.num_nodes() as NodeId {
        for to in 0..graph.num_nodes() as NodeId {
            let query = Query { from, to };
            assert_eq!(flagged.query(query).distance(), plain.query(query).distance(), "{:?}", query);
        }
    }

    // the side files now describe the column partition
    assert!(preprocess(&graph, &reverse, &coords, &by_columns).unwrap().stats.loaded_from_persisted_file);

    // flags without a record of their partition are not trusted
    std::fs::remove_file(region_file_path(&flag_file_path(dir.path(), false))).unwrap();
    let recomputed = preprocess(&graph, &reverse, &coords, &by_columns).unwrap();
    assert!(!recomputed.stats.loaded_from_persisted_file);
    assert_eq!(recomputed.flags, second.flags);
}

#[test]
fn experiment_runs_and_writes_reports() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    std::fs::create_dir_all(&input).unwrap();

    let (graph, coords) = random_network(30, 100, 9);
    let graph_path = input.join("random.gr");
    io::store_graph(&graph, &graph_path).unwrap();
    io::store_coordinates(&coords, input.join("random.co")).unwrap();
    let queries = experiments::generate_random_queries(graph.num_nodes(), 20, &mut StdRng::seed_from_u64(2));
    io::store_queries(&queries, input.join("random.p2p")).unwrap();

    let graph = io::load_graph(&graph_path).unwrap();
    let coords = io::load_coordinates(input.join("random.co"), graph.num_nodes()).unwrap();
    let queries = io::load_queries(input.join("random.p2p"), graph.num_nodes()).unwrap();
    let reverse = graph.reverse();

    let mut distances = None;
    for code in 0..5 {
        let config = Config {
            algorithm: Algorithm::from_code(code).unwrap(),
            partitioning_type: 2,
            edge_flag_calc_method: FlagPolicy::Enhanced,
            flag_dir: input.clone(),
            results_dir: dir.path().join("results"),
            ..Config::default()
        };
        let result = experiments::run_experiment(&config, &graph, &reverse, &coords, &queries).unwrap();
        assert_eq!(result.outcomes.len(), queries.len());
        assert_eq!(result.summary.num_queries, queries.len());
        assert_eq!(result.preprocessing.is_some(), config.algorithm.uses_edge_flags());

        let reachability: Vec<bool> = result.outcomes.iter().map(|outcome| outcome.distance.is_some()).collect();
        match &distances {
            None => distances = Some(reachability),
            Some(expected) => assert_eq!(&reachability, expected, "{:?}", config.algorithm),
        }

        let written = experiments::write_reports(&config, &graph_path, &graph, &result).unwrap();
        assert_eq!(written.len(), if config.algorithm.uses_edge_flags() { 2 } else { 1 });
        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert!(text.contains(&format!("p res sp p2p q random_{}", config.algorithm.name())));
        assert!(text.contains(&format!("g {} {}", graph.num_nodes(), graph.num_arcs())));
    }

    assert!(flag_file_path(&input, false).exists());
    assert!(flag_file_path(&input, true).exists());
    assert!(dir.path().join("results/random_DijkstraWithEdgeFlags.p2p.p.res").exists());
}

#[test]
fn queries_outside_the_graph_are_rejected() {
    let graph = graph();
    let reverse = graph.reverse();
    let coords = coords_for(&graph);
    let result = experiments::run_experiment(&Config::default(), &graph, &reverse, &coords, &[Query { from: 0, to: 5 }]);
    assert!(matches!(result, Err(p2p_router::Error::VertexOutOfRange { id: 6, .. })));
}
