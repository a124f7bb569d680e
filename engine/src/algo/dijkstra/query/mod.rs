//! Query Server wrappers for the different dijkstra variants

use super::*;
use crate::report::benchmark::measure;

pub mod bidirectional_dijkstra;
pub mod dijkstra;
pub mod geo_dijkstra;
