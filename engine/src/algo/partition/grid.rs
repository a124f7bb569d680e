//! Rectangular grid partitioning.
//!
//! The bounding box of all nodes is cut into `rows` slices along the longitude axis
//! and `columns` slices along the latitude axis.
//! Cell `(i, j)` becomes region `i * columns + j`.
//! Cells are closed, so a node on a shared border matches several cells.
//! It is assigned to the first of them in row major order, which is always the one with the smaller row and column index.

use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPartitioner {
    pub rows: usize,
    pub columns: usize,
}

/// Index of the first closed slice `[k * size, (k + 1) * size]` containing `offset`.
/// The last slice extends to infinity.
fn first_slice(offset: i64, size: i64, count: usize) -> usize {
    debug_assert!(offset >= 0 && size > 0);
    let slice = if offset > 0 && offset % size == 0 { offset / size - 1 } else { offset / size };
    std::cmp::min(slice as usize, count - 1)
}

impl GridPartitioner {
    fn cells(&self, bbox: &BoundingBox) -> (i64, i64) {
        let cell_width = std::cmp::max(bbox.width() / self.rows as i64, 1);
        let cell_height = std::cmp::max(bbox.height() / self.columns as i64, 1);
        (cell_width, cell_height)
    }

    fn cell_box(&self, bbox: &BoundingBox, row: usize, column: usize) -> BoundingBox {
        let (cell_width, cell_height) = self.cells(bbox);
        let mut cell = BoundingBox {
            min_lon: bbox.min_lon + row as i64 * cell_width,
            min_lat: bbox.min_lat + column as i64 * cell_height,
            max_lon: bbox.min_lon + (row as i64 + 1) * cell_width,
            max_lat: bbox.min_lat + (column as i64 + 1) * cell_height,
        };
        // integer division leaves a remainder, the last row and column absorb it
        if row == self.rows - 1 {
            cell.max_lon = std::cmp::max(cell.max_lon, bbox.max_lon);
        }
        if column == self.columns - 1 {
            cell.max_lat = std::cmp::max(cell.max_lat, bbox.max_lat);
        }
        cell
    }
}

impl Partitioner for GridPartitioner {
    fn partition(&self, coords: &Coordinates) -> Partition {
        assert!(self.rows > 0 && self.columns > 0);
        let bbox = BoundingBox::enclosing(coords);
        let (cell_width, cell_height) = self.cells(&bbox);

        let mut regions: Vec<Region> = (0..self.rows)
            .flat_map(|row| (0..self.columns).map(move |column| (row, column)))
            .enumerate()
            .map(|(id, (row, column))| Region {
                id: id as RegionId,
                bounding_box: Some(self.cell_box(&bbox, row, column)),
                vertices: Vec::new(),
            })
            .collect();

        for node in 0..coords.len() as NodeId {
            let (lon, lat) = coords.get(node);
            let row = first_slice(i64::from(lon) - bbox.min_lon, cell_width, self.rows);
            let column = first_slice(i64::from(lat) - bbox.min_lat, cell_height, self.columns);
            let region = &mut regions[row * self.columns + column];
            debug_assert!(region.bounding_box.map_or(false, |cell| cell.contains((lon, lat))));
            region.vertices.push(node);
        }

        Partition::from_regions(coords.len(), regions)
    }

    fn name(&self) -> &'static str {
        "Rectangular"
    }
}
