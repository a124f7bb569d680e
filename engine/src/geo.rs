//! Great circle distances between geo coordinates.

use crate::datastr::graph::Weight;

/// Nautical miles per degree times statute miles per nautical mile times kilometers per mile
const KM_PER_DEGREE: f64 = 60.0 * 1.1515 * 1.609344;

/// Spherical law of cosines distance in meters between two points given in micro degrees `(longitude, latitude)`.
pub fn distance_meters((lon_a, lat_a): (i32, i32), (lon_b, lat_b): (i32, i32)) -> f64 {
    if (lon_a, lat_a) == (lon_b, lat_b) {
        // acos is badly conditioned around 1.0
        return 0.0;
    }
    let lat_a = (f64::from(lat_a) * 0.000_001).to_radians();
    let lat_b = (f64::from(lat_b) * 0.000_001).to_radians();
    let theta = ((f64::from(lon_a) - f64::from(lon_b)) * 0.000_001).to_radians();

    let cos_angle = lat_a.sin() * lat_b.sin() + lat_a.cos() * lat_b.cos() * theta.cos();
    // rounding may push identical points slightly above 1.0
    let angle = cos_angle.clamp(-1.0, 1.0).acos().to_degrees();

    angle * KM_PER_DEGREE * 1000.0
}

/// Great circle distance in the DIMACS distance unit (tenths of meters, rounded).
pub fn distance(a: (i32, i32), b: (i32, i32)) -> Weight {
    (distance_meters(a, b) * 10.0 + 0.5).floor() as Weight
}
