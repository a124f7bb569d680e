// Answer a batch of point to point queries with one of the algorithms and write the result reports.

#[macro_use]
extern crate p2p_router;
use p2p_router::{
    cli::Config,
    datastr::graph::*,
    experiments, io,
    report::{benchmark::report_time, *},
};

use clap::Parser;
use std::{error::Error, path::PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Point to point shortest path queries on DIMACS road networks", long_about = None)]
struct Cli {
    /// Graph in DIMACS .gr format
    graph: PathBuf,
    /// Node coordinates in DIMACS .co format
    coordinates: PathBuf,
    /// Queries in DIMACS .p2p format
    queries: PathBuf,
    /// Properties file with the run configuration
    #[arg(long, default_value = "config.txt")]
    config: PathBuf,
    /// 0 Dijkstra, 1 bidirectional, 2 geo, 3 edge flags, 4 bidirectional edge flags
    #[arg(long)]
    algorithm: Option<u32>,
    /// 0 grid, 1 quad tree, 2 kd-tree
    #[arg(long)]
    partitioning: Option<u32>,
    /// 0 naive, 1 enhanced
    #[arg(long)]
    flag_method: Option<u32>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    let cli = Cli::parse();
    let _reporter = enable_reporting("p2p");

    let mut config = Config::load(&cli.config)?;
    if let Some(code) = cli.algorithm {
        config.set("algorithm", &code.to_string())?;
    }
    if let Some(code) = cli.partitioning {
        config.set("partitioning_type", &code.to_string())?;
    }
    if let Some(code) = cli.flag_method {
        config.set("edge_flag_calc_method", &code.to_string())?;
    }
    report!("config", config);

    let graph = io::load_graph(&cli.graph)?;
    let coords = io::load_coordinates(&cli.coordinates, graph.num_nodes())?;
    let queries = io::load_queries(&cli.queries, graph.num_nodes())?;
    let reverse = graph.reverse();
    report!("graph", { "num_nodes": graph.num_nodes(), "num_arcs": graph.num_arcs() });
    report!("num_queries", queries.len());

    let result = report_time(config.algorithm.name(), || experiments::run_experiment(&config, &graph, &reverse, &coords, &queries))?;
    report!("summary", result.summary);

    experiments::write_reports(&config, &cli.graph, &graph, &result)?;

    Ok(())
}
