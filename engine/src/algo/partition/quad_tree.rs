//! Adaptive quad tree partitioning.
//!
//! Starts with a single bucket covering the bounding box of all nodes.
//! A bucket holding `max_vertices_per_quadrant` nodes is full, inserting into a full bucket
//! splits it into four quadrants and redistributes its nodes.
//! Every leaf of the final tree becomes one region, empty leaves included.

use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadTreePartitioner {
    pub max_vertices_per_quadrant: usize,
}

type QuadrantIdx = usize;

#[derive(Debug)]
enum Content {
    Bucket { vertices: Vec<NodeId>, full: bool },
    Pointer { nw: QuadrantIdx, ne: QuadrantIdx, sw: QuadrantIdx, se: QuadrantIdx },
}

#[derive(Debug)]
struct Quadrant {
    x: i64,
    y: i64,
    w: i64,
    h: i64,
    content: Content,
}

impl Quadrant {
    fn leaf(x: i64, y: i64, w: i64, h: i64) -> Quadrant {
        Quadrant {
            x,
            y,
            w,
            h,
            content: Content::Bucket {
                vertices: Vec::new(),
                full: false,
            },
        }
    }

    fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            min_lon: self.x,
            min_lat: self.y,
            max_lon: self.x + self.w,
            max_lat: self.y + self.h,
        }
    }
}

struct QuadTree<'c> {
    coords: &'c Coordinates,
    capacity: usize,
    quadrants: Vec<Quadrant>,
}

impl<'c> QuadTree<'c> {
    fn new(coords: &'c Coordinates, capacity: usize) -> Self {
        let bbox = BoundingBox::enclosing(coords);
        QuadTree {
            coords,
            capacity,
            quadrants: vec![Quadrant::leaf(bbox.min_lon, bbox.min_lat, bbox.width(), bbox.height())],
        }
    }

    fn insert(&mut self, node: NodeId) {
        let (lon, lat) = self.coords.get(node);
        let (lon, lat) = (i64::from(lon), i64::from(lat));

        let mut current = 0;
        loop {
            let quadrant = &mut self.quadrants[current];
            let (hw, hh) = (quadrant.w / 2, quadrant.h / 2);
            let splittable = hw > 0 && hh > 0;
            match &mut quadrant.content {
                Content::Pointer { nw, ne, sw, se } => {
                    current = if lon < quadrant.x + hw {
                        if lat < quadrant.y + hh {
                            *nw
                        } else {
                            *sw
                        }
                    } else if lat < quadrant.y + hh {
                        *ne
                    } else {
                        *se
                    };
                }
                Content::Bucket { vertices, full } => {
                    // quadrants too small to split just keep growing
                    if !*full || !splittable {
                        vertices.push(node);
                        *full = vertices.len() >= self.capacity;
                        return;
                    }
                    self.split(current);
                }
            }
        }
    }

    fn split(&mut self, idx: QuadrantIdx) {
        let Quadrant { x, y, w, h, .. } = self.quadrants[idx];
        let (hw, hh) = (w / 2, h / 2);

        let first_child = self.quadrants.len();
        self.quadrants.push(Quadrant::leaf(x, y, hw, hh));
        self.quadrants.push(Quadrant::leaf(x + hw, y, w - hw, hh));
        self.quadrants.push(Quadrant::leaf(x, y + hh, hw, h - hh));
        self.quadrants.push(Quadrant::leaf(x + hw, y + hh, w - hw, h - hh));

        let old = std::mem::replace(
            &mut self.quadrants[idx].content,
            Content::Pointer {
                nw: first_child,
                ne: first_child + 1,
                sw: first_child + 2,
                se: first_child + 3,
            },
        );
        if let Content::Bucket { vertices, .. } = old {
            for node in vertices {
                self.insert(node);
            }
        }
    }

    /// Leaves in depth first order, visiting children north east, south east, south west, north west.
    fn into_regions(mut self) -> Vec<Region> {
        let mut regions = Vec::new();
        let mut stack = vec![0];
        while let Some(idx) = stack.pop() {
            let bounding_box = self.quadrants[idx].bounding_box();
            match &mut self.quadrants[idx].content {
                Content::Pointer { nw, ne, sw, se } => {
                    stack.extend_from_slice(&[*nw, *sw, *se, *ne]);
                }
                Content::Bucket { vertices, .. } => {
                    regions.push(Region {
                        id: regions.len() as RegionId,
                        bounding_box: Some(bounding_box),
                        vertices: std::mem::take(vertices),
                    });
                }
            }
        }
        regions
    }
}

impl Partitioner for QuadTreePartitioner {
    fn partition(&self, coords: &Coordinates) -> Partition {
        assert!(self.max_vertices_per_quadrant > 0);
        let mut tree = QuadTree::new(coords, self.max_vertices_per_quadrant);
        for node in 0..coords.len() as NodeId {
            tree.insert(node);
        }
        log::debug!("quad tree with {} quadrants", tree.quadrants.len());
        Partition::from_regions(coords.len(), tree.into_regions())
    }

    fn name(&self) -> &'static str {
        "Quad Tree"
    }
}
