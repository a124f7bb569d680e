//! Point to point shortest path queries on road networks.
//!
//! Contains the adjacency array graph, an indexed priority queue, several variants of Dijkstra's algorithm
//! (plain, bidirectional, goal directed on geo coordinates and edge flag pruned)
//! and the preprocessing pipeline for edge flags (spatial partitioning, flag computation and persistence).

#![allow(clippy::too_many_arguments)]

#[macro_use]
pub mod report;
pub mod algo;
pub mod cli;
pub mod datastr;
pub mod error;
pub mod experiments;
pub mod geo;
pub mod io;

pub use error::{Error, Result};

#[allow(dead_code)]
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
