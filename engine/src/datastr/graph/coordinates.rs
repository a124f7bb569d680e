//! Geographic positions of nodes.

use super::NodeId;
use crate::{Error, Result};

/// Longitude range in micro degrees
pub const MAX_LONGITUDE: i32 = 180_000_000;
/// Latitude range in micro degrees
pub const MAX_LATITUDE: i32 = 90_000_000;

/// Longitude and latitude of every node in integer micro degrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    longitude: Vec<i32>,
    latitude: Vec<i32>,
}

impl Coordinates {
    /// Build from two vectors of equal length.
    /// Values outside of `[-180°, 180°]` or `[-90°, 90°]` are rejected.
    pub fn new(longitude: Vec<i32>, latitude: Vec<i32>) -> Result<Coordinates> {
        assert_eq!(longitude.len(), latitude.len());
        if let Some(&lon) = longitude.iter().find(|&&lon| lon.unsigned_abs() > MAX_LONGITUDE as u32) {
            return Err(Error::LongitudeOutOfRange(lon.into()));
        }
        if let Some(&lat) = latitude.iter().find(|&&lat| lat.unsigned_abs() > MAX_LATITUDE as u32) {
            return Err(Error::LatitudeOutOfRange(lat.into()));
        }
        Ok(Coordinates { longitude, latitude })
    }

    /// Build from `(longitude, latitude)` pairs.
    pub fn from_pairs(pairs: &[(i32, i32)]) -> Result<Coordinates> {
        let (longitude, latitude) = pairs.iter().copied().unzip();
        Coordinates::new(longitude, latitude)
    }

    pub fn len(&self) -> usize {
        self.longitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.longitude.is_empty()
    }

    #[inline]
    pub fn longitude(&self, node: NodeId) -> i32 {
        self.longitude[node as usize]
    }

    #[inline]
    pub fn latitude(&self, node: NodeId) -> i32 {
        self.latitude[node as usize]
    }

    /// `(longitude, latitude)` of a node
    #[inline]
    pub fn get(&self, node: NodeId) -> (i32, i32) {
        (self.longitude(node), self.latitude(node))
    }

    pub fn longitudes(&self) -> &[i32] {
        &self.longitude
    }

    pub fn latitudes(&self) -> &[i32] {
        &self.latitude
    }
}
