// Generate a DIMACS .p2p query file, either with uniformly random pairs
// or with one random source and targets within a radius around it.

use p2p_router::{cli::CliErr, experiments, io};

use clap::{Parser, ValueEnum};
use rand::prelude::*;
use std::{error::Error, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// One source, targets within --radius meters
    Local,
    /// Independent random sources and targets
    Random,
}

#[derive(Parser)]
#[command(author, version, about = "Generate point to point queries for a DIMACS road network", long_about = None)]
struct Cli {
    #[arg(value_enum)]
    mode: Mode,
    /// Number of queries
    num_queries: usize,
    /// Node coordinates in DIMACS .co format
    coordinates: PathBuf,
    /// Radius in meters for local queries
    #[arg(long, default_value_t = 1000.0)]
    radius: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Output file, defaults to `input/<stem>_queries.<loc|rand>.p2p`
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    let cli = Cli::parse();

    // node count from the problem line, without one every v line is a node
    let text = std::fs::read_to_string(&cli.coordinates)?;
    let announced = text
        .lines()
        .find(|line| line.starts_with("p "))
        .and_then(|line| line.split_whitespace().nth(4))
        .and_then(|count| count.parse::<usize>().ok());
    let num_nodes = announced.unwrap_or_else(|| text.lines().filter(|line| line.starts_with("v ")).count());
    if num_nodes == 0 {
        return Err(Box::new(CliErr("coordinate file without nodes")));
    }
    let coords = io::read_coordinates(text.as_bytes(), num_nodes)?;

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let (queries, suffix) = match cli.mode {
        Mode::Local => (experiments::generate_local_queries(&coords, cli.num_queries, cli.radius, &mut rng)?, "loc"),
        Mode::Random => (experiments::generate_random_queries(coords.len(), cli.num_queries, &mut rng), "rand"),
    };

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from("input").join(format!("{}_queries.{}.p2p", io::file_stem(&cli.coordinates), suffix)));
    if let Some(dir) = output.parent() {
        std::fs::create_dir_all(dir)?;
    }
    io::store_queries(&queries, &output)?;
    log::info!("wrote {} queries for {} nodes to {}", queries.len(), num_nodes, output.display());

    Ok(())
}
