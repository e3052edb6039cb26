//! Synthetic location generation around a geofence center, used by the
//! accuracy tests and the CLI accuracy run.

use crate::registry::GeofenceCenter;
use rand::Rng;

/// (latitude, longitude) pairs in radians, bucketed by where the generator
/// placed them relative to the boundary circle.
#[derive(Debug, Clone, Default)]
pub struct GeneratedPoints {
    pub inside: Vec<(f64, f64)>,
    pub outside: Vec<(f64, f64)>,
    pub edge: Vec<(f64, f64)>,
}

/// Generate points around `center` by offsetting it along a random bearing:
/// `inside` at distances in [0, r), `outside` in (r, 2r], `edge` on the
/// circle itself. The longitude offset is stretched by 1/cos(lat) so the
/// offsets stay isotropic in meters.
pub fn generate_user_points(
    center: &GeofenceCenter,
    radius_m: f64,
    earth_radius_m: f64,
    num_points: usize,
    rng: &mut impl Rng,
) -> GeneratedPoints {
    let mut points = GeneratedPoints::default();
    for _ in 0..num_points {
        let distance = rng.gen_range(0.0..radius_m);
        points.inside.push(offset_point(center, distance, earth_radius_m, rng));

        let distance = rng.gen_range(radius_m + 1.0..radius_m * 2.0);
        points.outside.push(offset_point(center, distance, earth_radius_m, rng));

        points.edge.push(offset_point(center, radius_m, earth_radius_m, rng));
    }
    points
}

/// One point at the given ground distance from the center, random bearing.
pub fn offset_point(
    center: &GeofenceCenter,
    distance_m: f64,
    earth_radius_m: f64,
    rng: &mut impl Rng,
) -> (f64, f64) {
    let theta = rng.gen_range(0.0..std::f64::consts::TAU);
    let offset_lat = distance_m / earth_radius_m;
    let offset_lon = offset_lat / center.latitude().cos();
    (
        center.latitude() + offset_lat * theta.sin(),
        center.longitude() + offset_lon * theta.cos(),
    )
}
