//! Utility module for command line interfaces and the run configuration.

use crate::algo::edge_flags::FlagPolicy;
use crate::algo::partition::PartitioningType;
use crate::{Error, Result};
use serde::Serialize;
use std::{
    error::Error as StdError,
    fmt,
    fmt::Display,
    path::{Path, PathBuf},
};

/// An error struct to wrap simple static error messages
#[derive(Debug)]
pub struct CliErr(pub &'static str);

impl Display for CliErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl StdError for CliErr {}

/// The query algorithms, numbered as in the `algorithm` config key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Algorithm {
    Dijkstra,
    BidirectionalDijkstra,
    GeoDijkstra,
    EdgeFlags,
    BidirectionalEdgeFlags,
}

impl Algorithm {
    pub fn from_code(code: u32) -> Option<Algorithm> {
        match code {
            0 => Some(Algorithm::Dijkstra),
            1 => Some(Algorithm::BidirectionalDijkstra),
            2 => Some(Algorithm::GeoDijkstra),
            3 => Some(Algorithm::EdgeFlags),
            4 => Some(Algorithm::BidirectionalEdgeFlags),
            _ => None,
        }
    }

    /// Name used in the file names of result reports.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Dijkstra => "Dijkstra",
            Algorithm::BidirectionalDijkstra => "BidirectDijkstra",
            Algorithm::GeoDijkstra => "DijkstraForGeoNets",
            Algorithm::EdgeFlags => "DijkstraWithEdgeFlags",
            Algorithm::BidirectionalEdgeFlags => "BidirectDijkstraWithEdgeFlags",
        }
    }

    pub fn uses_edge_flags(self) -> bool {
        matches!(self, Algorithm::EdgeFlags | Algorithm::BidirectionalEdgeFlags)
    }
}

/// Settings of a run, read from a properties file with `key=value` lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub algorithm: Algorithm,
    /// 0 grid, 1 quad tree, 2 kd-tree
    pub partitioning_type: u32,
    pub edge_flag_calc_method: FlagPolicy,
    pub rows: usize,
    pub columns: usize,
    pub max_vertices_per_quadrant: usize,
    pub max_vertices_per_region: usize,
    pub parallel_preprocessing: bool,
    /// Where edge flag side files are read from and written to
    pub flag_dir: PathBuf,
    /// Where `.res` reports are written to
    pub results_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            algorithm: Algorithm::Dijkstra,
            partitioning_type: 0,
            edge_flag_calc_method: FlagPolicy::Naive,
            rows: 5,
            columns: 5,
            max_vertices_per_quadrant: 6,
            max_vertices_per_region: 4,
            parallel_preprocessing: false,
            flag_dir: PathBuf::from("input"),
            results_dir: PathBuf::from("results"),
        }
    }
}

fn invalid(key: &str, value: &str) -> Error {
    Error::Config {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| invalid(key, value))
}

impl Config {
    /// Parse properties text. Keys not given keep their default, unknown keys are ignored.
    pub fn from_properties(text: &str) -> Result<Config> {
        let mut config = Config::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = match line.find(|c| c == '=' || c == ':') {
                Some(idx) => (line[..idx].trim(), line[idx + 1..].trim()),
                None => match line.split_once(char::is_whitespace) {
                    Some((key, value)) => (key, value.trim()),
                    None => (line, ""),
                },
            };
            config.set(key, value)?;
        }

        Ok(config)
    }

    /// Read the config file at `path`. A missing file means all defaults.
    pub fn load(path: &Path) -> Result<Config> {
        match std::fs::read_to_string(path) {
            Ok(text) => Config::from_properties(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config file at {}, using defaults", path.display());
                Ok(Config::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Set a single key. Fails on malformed values and unknown codes.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "algorithm" => {
                self.algorithm = Algorithm::from_code(parse_number(key, value)?).ok_or_else(|| invalid(key, value))?;
            }
            "partitioning_type" => {
                let code: u32 = parse_number(key, value)?;
                if code > 2 {
                    return Err(invalid(key, value));
                }
                self.partitioning_type = code;
            }
            "edge_flag_calc_method" => {
                self.edge_flag_calc_method = match parse_number::<u32>(key, value)? {
                    0 => FlagPolicy::Naive,
                    1 => FlagPolicy::Enhanced,
                    _ => return Err(invalid(key, value)),
                };
            }
            "rows" => self.rows = parse_number(key, value)?,
            "columns" => self.columns = parse_number(key, value)?,
            "max_vertices_per_quadrant" => self.max_vertices_per_quadrant = parse_number(key, value)?,
            "max_vertices_per_region" => self.max_vertices_per_region = parse_number(key, value)?,
            "parallel_preprocessing" => {
                self.parallel_preprocessing = match value {
                    "true" | "1" => true,
                    "false" | "0" => false,
                    _ => return Err(invalid(key, value)),
                };
            }
            "flag_dir" => self.flag_dir = PathBuf::from(value),
            "results_dir" => self.results_dir = PathBuf::from(value),
            _ => log::warn!("ignoring unknown config key {}", key),
        }
        Ok(())
    }

    /// The partitioning strategy with its parameters.
    pub fn partitioning(&self) -> Result<PartitioningType> {
        match self.partitioning_type {
            0 => Ok(PartitioningType::Grid {
                rows: self.rows,
                columns: self.columns,
            }),
            1 => Ok(PartitioningType::QuadTree {
                max_vertices_per_quadrant: self.max_vertices_per_quadrant,
            }),
            2 => Ok(PartitioningType::KdTree {
                max_vertices_per_region: self.max_vertices_per_region,
            }),
            code => Err(invalid("partitioning_type", &code.to_string())),
        }
    }
}
