//! Running query batches, summarizing them into result reports and generating query files.

use rand::prelude::*;
use serde::Serialize;
use std::{
    fs::File,
    io::{prelude::*, BufWriter},
    path::{Path, PathBuf},
};

use crate::{
    algo::{
        dijkstra::query::{bidirectional_dijkstra, dijkstra, geo_dijkstra},
        edge_flags::*,
        *,
    },
    cli::{Algorithm, Config},
    datastr::graph::*,
    io::file_stem,
    report::*,
    Error, Result,
};

/// Distance and counters of one executed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryOutcome {
    pub from: NodeId,
    pub to: NodeId,
    pub distance: Option<Weight>,
    pub stats: QueryStats,
}

/// Run all queries one after another on `server`.
/// Every query becomes an item of the reporting collection, if one is given.
pub fn run_queries<S: QueryServer>(
    server: &mut S,
    queries: &[Query],
    num_nodes: usize,
    mut reporting_context: Option<&mut CollectionContextGuard>,
) -> Result<Vec<QueryOutcome>> {
    for query in queries {
        for node in [query.from, query.to] {
            if node as usize >= num_nodes {
                return Err(Error::VertexOutOfRange {
                    id: i64::from(node) + 1,
                    num_nodes,
                });
            }
        }
    }

    let mut outcomes = Vec::with_capacity(queries.len());
    for &query in queries {
        let _query_ctxt = reporting_context.as_mut().map(|ctxt| ctxt.push_collection_item());
        report!("from", query.from + 1);
        report!("to", query.to + 1);

        let result = server.query(query);
        let outcome = QueryOutcome {
            from: query.from,
            to: query.to,
            distance: result.distance(),
            stats: *result.stats(),
        };
        report!("result", outcome.distance);
        report!("stats", outcome.stats);
        outcomes.push(outcome);
    }

    let summary = QuerySummary::from_outcomes(&outcomes);
    log::info!("{} queries, avg. query time {:.3}ms", summary.num_queries, summary.avg_time_ms);
    Ok(outcomes)
}

/// Averages over a batch of queries. All zero for an empty batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QuerySummary {
    pub num_queries: usize,
    pub avg_time_ms: f64,
    pub avg_nodes_scanned: f64,
    pub avg_edges_scanned: f64,
    pub avg_distance_improvements: f64,
}

impl QuerySummary {
    pub fn from_outcomes(outcomes: &[QueryOutcome]) -> QuerySummary {
        if outcomes.is_empty() {
            return QuerySummary::default();
        }
        let n = outcomes.len() as f64;
        let avg = |f: fn(&QueryStats) -> f64| outcomes.iter().map(|outcome| f(&outcome.stats)).sum::<f64>() / n;
        QuerySummary {
            num_queries: outcomes.len(),
            avg_time_ms: avg(|stats| stats.execution_time_nanos as f64 / 1_000_000.0),
            avg_nodes_scanned: avg(|stats| stats.nodes_scanned as f64),
            avg_edges_scanned: avg(|stats| stats.edges_scanned as f64),
            avg_distance_improvements: avg(|stats| stats.distance_improvement_count as f64),
        }
    }
}

/// Everything a run of one algorithm on a query batch produced.
#[derive(Debug, Clone)]
pub struct ExperimentResult {
    pub outcomes: Vec<QueryOutcome>,
    pub summary: QuerySummary,
    /// Only for the edge flag algorithms
    pub preprocessing: Option<PreprocessingStats>,
}

/// Preprocess if the configured algorithm needs it and run all queries with it.
/// Each query is reported as an item of the `queries` collection.
pub fn run_experiment(config: &Config, graph: &OwnedGraph, reverse: &OwnedGraph, coords: &Coordinates, queries: &[Query]) -> Result<ExperimentResult> {
    assert!(!graph.is_reversed() && reverse.is_reversed());
    report!("algorithm", config.algorithm.name());
    let num_nodes = graph.num_nodes();

    let (outcomes, preprocessing) = match config.algorithm {
        Algorithm::Dijkstra => (run_reported(&mut dijkstra::Server::new(graph), queries, num_nodes)?, None),
        Algorithm::BidirectionalDijkstra => (run_reported(&mut bidirectional_dijkstra::Server::new(graph, reverse), queries, num_nodes)?, None),
        Algorithm::GeoDijkstra => (run_reported(&mut geo_dijkstra::Server::new(graph, coords), queries, num_nodes)?, None),
        Algorithm::EdgeFlags => {
            let Preprocessed { partition, flags, stats } = preprocess(graph, reverse, coords, config)?;
            report!("preprocessing", stats);
            let mut server = flagged_server(graph, &flags, &partition);
            (run_reported(&mut server, queries, num_nodes)?, Some(stats))
        }
        Algorithm::BidirectionalEdgeFlags => {
            let Preprocessed { partition, flags, stats } = preprocess(graph, reverse, coords, config)?;
            let (backward_flags, backward_stats) = load_or_compute_flags(reverse, graph, &partition, config)?;
            let stats = stats.combine(&backward_stats);
            report!("preprocessing", stats);
            let mut server = bidirectional_flagged_server(graph, reverse, &flags, &backward_flags, &partition);
            (run_reported(&mut server, queries, num_nodes)?, Some(stats))
        }
    };

    let summary = QuerySummary::from_outcomes(&outcomes);
    Ok(ExperimentResult {
        outcomes,
        summary,
        preprocessing,
    })
}

fn run_reported<S: QueryServer>(server: &mut S, queries: &[Query], num_nodes: usize) -> Result<Vec<QueryOutcome>> {
    let mut queries_ctxt = push_collection_context("queries".to_string());
    run_queries(server, queries, num_nodes, Some(&mut queries_ctxt))
}

/// Kind of a `.res` report, `q` for queries and `p` for preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Queries,
    Preprocessing,
}

impl ReportKind {
    fn code(self) -> char {
        match self {
            ReportKind::Queries => 'q',
            ReportKind::Preprocessing => 'p',
        }
    }
}

/// `<results_dir>/<graph stem>_<algorithm>.p2p.<q|p>.res`
pub fn report_path(results_dir: &Path, graph_path: &Path, algorithm: Algorithm, kind: ReportKind) -> PathBuf {
    results_dir.join(format!("{}_{}.p2p.{}.res", file_stem(graph_path), algorithm.name(), kind.code()))
}

pub fn write_query_report<W: Write>(mut writer: W, name: &str, num_nodes: usize, num_arcs: usize, summary: &QuerySummary) -> Result<()> {
    writeln!(writer, "c performance result of querying operations")?;
    writeln!(writer, "c g - graph configuration")?;
    writeln!(writer, "c t - average time per query (in milliseconds)")?;
    writeln!(writer, "c v - number of nodes scanned")?;
    writeln!(writer, "c e - number of edges scanned")?;
    writeln!(writer, "c i - number of distance improvements (aka number of effective relax operations)")?;
    writeln!(writer, "c")?;
    writeln!(writer, "c")?;
    writeln!(writer, "p res sp p2p q {}", name)?;
    writeln!(writer, "g {} {}", num_nodes, num_arcs)?;
    writeln!(writer, "t {:.1}", summary.avg_time_ms)?;
    writeln!(writer, "v {:.1}", summary.avg_nodes_scanned)?;
    writeln!(writer, "e {:.1}", summary.avg_edges_scanned)?;
    writeln!(writer, "i {:.1}", summary.avg_distance_improvements)?;
    writer.flush()?;
    Ok(())
}

pub fn write_preprocessing_report<W: Write>(mut writer: W, name: &str, num_nodes: usize, num_arcs: usize, stats: &PreprocessingStats) -> Result<()> {
    writeln!(writer, "c performance result of preprocessing operations")?;
    writeln!(writer, "c g - graph configuration")?;
    writeln!(writer, "c t - time spent to preprocessing (in milliseconds)")?;
    writeln!(writer, "c v - number of nodes scanned during preprocessing")?;
    writeln!(writer, "c")?;
    writeln!(writer, "c")?;
    writeln!(writer, "p res sp p2p p {}", name)?;
    writeln!(writer, "g {} {}", num_nodes, num_arcs)?;
    writeln!(writer, "t {:.1}", stats.execution_time_nanos as f64 / 1_000_000.0)?;
    writeln!(writer, "v {}", stats.nodes_scanned)?;
    writer.flush()?;
    Ok(())
}

/// Write the query report and, for the edge flag algorithms, the preprocessing report into the results directory.
/// Returns the paths of the written files.
pub fn write_reports(config: &Config, graph_path: &Path, graph: &OwnedGraph, result: &ExperimentResult) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&config.results_dir)?;
    let mut written = Vec::new();

    let path = report_path(&config.results_dir, graph_path, config.algorithm, ReportKind::Queries);
    write_query_report(BufWriter::new(File::create(&path)?), &file_stem(&path), graph.num_nodes(), graph.num_arcs(), &result.summary)?;
    written.push(path);

    if let Some(stats) = &result.preprocessing {
        let path = report_path(&config.results_dir, graph_path, config.algorithm, ReportKind::Preprocessing);
        write_preprocessing_report(BufWriter::new(File::create(&path)?), &file_stem(&path), graph.num_nodes(), graph.num_arcs(), stats)?;
        written.push(path);
    }

    for path in &written {
        log::info!("wrote {}", path.display());
    }
    Ok(written)
}

/// `num_queries` queries with independent uniformly random source and target.
pub fn generate_random_queries(num_nodes: usize, num_queries: usize, rng: &mut StdRng) -> Vec<Query> {
    assert!(num_nodes > 0 || num_queries == 0);
    (0..num_queries)
        .map(|_| Query {
            from: rng.gen_range(0..num_nodes as NodeId),
            to: rng.gen_range(0..num_nodes as NodeId),
        })
        .collect()
}

/// `num_queries` queries from one random source to distinct targets
/// at most `radius_meters` away by great circle distance. The source itself may be one of the targets.
pub fn generate_local_queries(coords: &Coordinates, num_queries: usize, radius_meters: f64, rng: &mut StdRng) -> Result<Vec<Query>> {
    if coords.is_empty() {
        return Err(Error::QueryGeneration("graph without nodes".to_string()));
    }
    let from = rng.gen_range(0..coords.len() as NodeId);
    let candidates: Vec<NodeId> = (0..coords.len() as NodeId)
        .filter(|&node| crate::geo::distance_meters(coords.get(from), coords.get(node)) <= radius_meters)
        .collect();

    if candidates.len() < num_queries {
        return Err(Error::QueryGeneration(format!(
            "only {} nodes within {}m of node {}, {} queries requested",
            candidates.len(),
            radius_meters,
            from + 1,
            num_queries
        )));
    }

    Ok(candidates.choose_multiple(rng, num_queries).map(|&to| Query { from, to }).collect())
}
