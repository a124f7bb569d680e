//! Spatial partitioning of the nodes of a graph into regions.
//!
//! Every node ends up in exactly one region.
//! Region ids are dense and assigned in a deterministic discovery order of the strategy.

use crate::datastr::graph::*;
use crate::{Error, Result};
use serde::Serialize;

pub mod grid;
pub mod kd_tree;
pub mod quad_tree;

pub use self::grid::GridPartitioner;
pub use self::kd_tree::KdTreePartitioner;
pub use self::quad_tree::QuadTreePartitioner;

pub type RegionId = u32;

/// Closed axis aligned rectangle in micro degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub min_lon: i64,
    pub min_lat: i64,
    pub max_lon: i64,
    pub max_lat: i64,
}

impl BoundingBox {
    /// Smallest box containing all coordinates, grown by one unit towards the minimum
    /// and ten units towards the maximum to catch outliers.
    /// The result always has a non zero extent, also for a single node or no nodes at all.
    pub fn enclosing(coords: &Coordinates) -> BoundingBox {
        let min = |values: &[i32]| values.iter().min().map_or(0, |&v| i64::from(v));
        let max = |values: &[i32]| values.iter().max().map_or(0, |&v| i64::from(v));

        BoundingBox {
            min_lon: min(coords.longitudes()) - 1,
            min_lat: min(coords.latitudes()) - 1,
            max_lon: max(coords.longitudes()) + 10,
            max_lat: max(coords.latitudes()) + 10,
        }
    }

    pub fn width(&self) -> i64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> i64 {
        self.max_lat - self.min_lat
    }

    pub fn contains(&self, (lon, lat): (i32, i32)) -> bool {
        let (lon, lat) = (i64::from(lon), i64::from(lat));
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub id: RegionId,
    pub bounding_box: Option<BoundingBox>,
    pub vertices: Vec<NodeId>,
}

/// Assignment of every node to exactly one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    region_of: Vec<RegionId>,
    regions: Vec<Region>,
}

impl Partition {
    /// Build from a list of regions.
    /// Panics unless region ids are `0..regions.len()` and every node of `0..num_nodes` occurs in exactly one region.
    pub fn from_regions(num_nodes: usize, regions: Vec<Region>) -> Partition {
        let mut region_of = vec![RegionId::max_value(); num_nodes];
        for (idx, region) in regions.iter().enumerate() {
            assert_eq!(region.id as usize, idx, "region ids have to be dense");
            for &node in &region.vertices {
                assert_eq!(region_of[node as usize], RegionId::max_value(), "node {} in more than one region", node);
                region_of[node as usize] = region.id;
            }
        }
        assert!(region_of.iter().all(|&r| r != RegionId::max_value()), "node without region");

        Partition { region_of, regions }
    }

    /// Build from a region id per node. Regions get no bounding box.
    pub fn from_region_ids(region_of: Vec<RegionId>, num_regions: usize) -> Partition {
        let mut regions: Vec<Region> = (0..num_regions)
            .map(|id| Region {
                id: id as RegionId,
                bounding_box: None,
                vertices: Vec::new(),
            })
            .collect();
        for (node, &region) in region_of.iter().enumerate() {
            regions[region as usize].vertices.push(node as NodeId);
        }
        Partition { region_of, regions }
    }

    #[inline]
    pub fn region_of(&self, node: NodeId) -> RegionId {
        self.region_of[node as usize]
    }

    pub fn region_ids(&self) -> &[RegionId] {
        &self.region_of
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn num_regions(&self) -> usize {
        self.regions.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.region_of.len()
    }

    /// Nodes incident to at least one edge whose endpoints are in different regions, ascending.
    pub fn boundary_vertices<G: LinkIterable<NodeId>>(&self, graph: &G) -> Vec<NodeId> {
        let mut is_boundary = vec![false; graph.num_nodes()];
        for node in 0..graph.num_nodes() as NodeId {
            for head in graph.link_iter(node) {
                if self.region_of(node) != self.region_of(head) {
                    is_boundary[node as usize] = true;
                    is_boundary[head as usize] = true;
                }
            }
        }
        (0..graph.num_nodes() as NodeId).filter(|&node| is_boundary[node as usize]).collect()
    }
}

/// A strategy to split nodes into regions based on their coordinates.
pub trait Partitioner {
    fn partition(&self, coords: &Coordinates) -> Partition;
    fn name(&self) -> &'static str;
}

/// The partitioning strategies selectable through the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PartitioningType {
    Grid { rows: usize, columns: usize },
    QuadTree { max_vertices_per_quadrant: usize },
    KdTree { max_vertices_per_region: usize },
}

impl PartitioningType {
    pub fn partitioner(&self) -> Result<Box<dyn Partitioner>> {
        let invalid = |key: &str, value: usize| Error::Config {
            key: key.to_string(),
            value: value.to_string(),
        };
        let partitioner: Box<dyn Partitioner> = match *self {
            PartitioningType::Grid { rows, columns } => {
                if rows == 0 {
                    return Err(invalid("rows", rows));
                }
                if columns == 0 {
                    return Err(invalid("columns", columns));
                }
                Box::new(GridPartitioner { rows, columns })
            }
            PartitioningType::QuadTree { max_vertices_per_quadrant } => {
                if max_vertices_per_quadrant == 0 {
                    return Err(invalid("max_vertices_per_quadrant", max_vertices_per_quadrant));
                }
                Box::new(QuadTreePartitioner { max_vertices_per_quadrant })
            }
            PartitioningType::KdTree { max_vertices_per_region } => {
                if max_vertices_per_region == 0 {
                    return Err(invalid("max_vertices_per_region", max_vertices_per_region));
                }
                Box::new(KdTreePartitioner { max_vertices_per_region })
            }
        };
        Ok(partitioner)
    }

    /// Partition with the selected strategy.
    pub fn partition(&self, coords: &Coordinates) -> Result<Partition> {
        let partitioner = self.partitioner()?;
        let partition = partitioner.partition(coords);
        log::info!("{} partitioning complete: {} regions", partitioner.name(), partition.num_regions());
        Ok(partition)
    }
}
