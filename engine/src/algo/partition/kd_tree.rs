//! Kd-tree partitioning.
//!
//! Node sets are recursively split at the median, by longitude on even depths and by latitude on odd depths.
//! Nodes with a coordinate strictly below the median go to the lesser side, the rest to the greater side.
//! Sets of at most `max_vertices_per_region` nodes become leaves, and every leaf becomes a region.

use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdTreePartitioner {
    pub max_vertices_per_region: usize,
}

impl KdTreePartitioner {
    fn split(&self, coords: &Coordinates, mut nodes: Vec<NodeId>, depth: usize, leaves: &mut Vec<Vec<NodeId>>) {
        if nodes.len() <= self.max_vertices_per_region {
            leaves.push(nodes);
            return;
        }

        let key = |node: NodeId| {
            let (lon, lat) = coords.get(node);
            if depth % 2 == 0 {
                lon
            } else {
                lat
            }
        };
        nodes.sort_unstable_by_key(|&node| (key(node), node));

        let median = key(nodes[nodes.len() / 2]);
        let mut split_at = nodes.partition_point(|&node| key(node) < median);
        // many equal coordinates, fall back to splitting the sorted sequence in half
        if split_at == 0 {
            split_at = nodes.len() / 2;
        }

        let greater = nodes.split_off(split_at);
        self.split(coords, nodes, depth + 1, leaves);
        self.split(coords, greater, depth + 1, leaves);
    }
}

impl Partitioner for KdTreePartitioner {
    fn partition(&self, coords: &Coordinates) -> Partition {
        assert!(self.max_vertices_per_region > 0);
        let mut leaves = Vec::new();
        if !coords.is_empty() {
            self.split(coords, (0..coords.len() as NodeId).collect(), 0, &mut leaves);
        }

        let regions = leaves
            .into_iter()
            .enumerate()
            .map(|(id, vertices)| Region {
                id: id as RegionId,
                bounding_box: None,
                vertices,
            })
            .collect();
        Partition::from_regions(coords.len(), regions)
    }

    fn name(&self) -> &'static str {
        "Kd-Tree"
    }
}
