/// One circular geofence boundary center, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceCenter {
    longitude: f64,
    latitude: f64,
}

impl GeofenceCenter {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    pub fn from_degrees(longitude: f64, latitude: f64) -> Self {
        Self { longitude: longitude.to_radians(), latitude: latitude.to_radians() }
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }
}

/// Ordered collection of geofence centers plus the shared boundary radius
///
/// Supplied to the Boundary Evaluator at startup and read-only afterwards.
/// The order is load-bearing: it is the only correlation between an
/// evaluation result and "which center" on the receiving side, since center
/// coordinates are never disclosed to the Key Holder or Location Owner.
#[derive(Debug, Clone)]
pub struct GeofenceRegistry {
    centers: Vec<GeofenceCenter>,
    radius_m: f64,
    earth_radius_m: f64,
}

impl GeofenceRegistry {
    pub fn new(centers: Vec<GeofenceCenter>, radius_m: f64, earth_radius_m: f64) -> Self {
        assert!(radius_m > 0.0 && radius_m.is_finite(), "geofence radius must be positive");
        assert!(earth_radius_m > 0.0 && earth_radius_m.is_finite(), "earth radius must be positive");
        Self { centers, radius_m, earth_radius_m }
    }

    pub fn centers(&self) -> &[GeofenceCenter] {
        &self.centers
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn earth_radius_m(&self) -> f64 {
        self.earth_radius_m
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Plaintext ground truth: is the point within the boundary radius of
    /// the given center? The encrypted pipeline is judged against this.
    pub fn contains_plaintext(&self, center: &GeofenceCenter, latitude: f64, longitude: f64) -> bool {
        let distance = haversine_distance(
            latitude,
            longitude,
            center.latitude(),
            center.longitude(),
            self.earth_radius_m,
        );
        distance <= self.radius_m
    }
}

/// Exact haversine great-circle distance between two points, in the same
/// unit as `earth_radius`.
pub fn haversine_distance(
    lat_a: f64,
    lon_a: f64,
    lat_b: f64,
    lon_b: f64,
    earth_radius: f64,
) -> f64 {
    let a = ((lat_a - lat_b) / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * ((lon_a - lon_b) / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    earth_radius * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const EARTH_RADIUS_M: f64 = 6_371_000.0;

    #[test]
    fn zero_distance_to_itself() {
        let lat = 51.573037f64.to_radians();
        let lon = (-9.724087f64).to_radians();
        assert_eq!(haversine_distance(lat, lon, lat, lon, EARTH_RADIUS_M), 0.0);
    }

    #[test]
    fn half_degree_of_latitude_is_about_55km() {
        let lat = 51.573037f64.to_radians();
        let lon = (-9.724087f64).to_radians();
        let d = haversine_distance(lat + 0.5f64.to_radians(), lon, lat, lon, EARTH_RADIUS_M);
        assert!((d - 55_597.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn registry_plaintext_test_agrees_with_distance() {
        let center = GeofenceCenter::from_degrees(-9.724087, 51.573037);
        let registry = GeofenceRegistry::new(vec![center], 1000.0, EARTH_RADIUS_M);
        assert!(registry.contains_plaintext(&center, center.latitude(), center.longitude()));
        assert!(!registry.contains_plaintext(
            &center,
            center.latitude() + 0.5f64.to_radians(),
            center.longitude(),
        ));
    }
}
