//! Utilities for reading and writing data structures from and to disk.
//!
//! The formats live in `dimacs`, this module adds convenience functions working on paths.
//!
//! # Example
//!
//! ```no_run
//! # use p2p_router::{datastr::graph::*, io::*};
//! let graph = load_graph("input/tiny.gr")?;
//! let coords = load_coordinates("input/tiny.co", graph.num_nodes())?;
//! let queries = load_queries("input/tiny.p2p", graph.num_nodes())?;
//! # Ok::<(), p2p_router::Error>(())
//! ```

use crate::algo::Query;
use crate::datastr::graph::*;
use crate::Result;
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

pub mod dimacs;
pub use self::dimacs::*;

pub fn load_graph<P: AsRef<Path>>(path: P) -> Result<OwnedGraph> {
    let graph = read_graph(BufReader::new(File::open(path.as_ref())?))?;
    log::info!("read graph with {} nodes and {} arcs from {}", graph.num_nodes(), graph.num_arcs(), path.as_ref().display());
    Ok(graph)
}

pub fn load_coordinates<P: AsRef<Path>>(path: P, num_nodes: usize) -> Result<Coordinates> {
    read_coordinates(BufReader::new(File::open(path)?), num_nodes)
}

pub fn load_queries<P: AsRef<Path>>(path: P, num_nodes: usize) -> Result<Vec<Query>> {
    read_queries(BufReader::new(File::open(path)?), num_nodes)
}

pub fn store_graph<P: AsRef<Path>>(graph: &OwnedGraph, path: P) -> Result<()> {
    write_graph(graph, BufWriter::new(File::create(path)?))
}

pub fn store_coordinates<P: AsRef<Path>>(coords: &Coordinates, path: P) -> Result<()> {
    write_coordinates(coords, BufWriter::new(File::create(path)?))
}

pub fn store_queries<P: AsRef<Path>>(queries: &[Query], path: P) -> Result<()> {
    write_queries(queries, BufWriter::new(File::create(path)?))
}

/// File name up to the first dot, `"input/NY.gr"` becomes `"NY"`.
pub fn file_stem(path: &Path) -> String {
    let name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
    match name.find('.') {
        Some(dot) => name[..dot].to_string(),
        None => name,
    }
}
