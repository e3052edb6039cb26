use geofence_phe::{GeofenceCenter, GeofenceRegistry};
use serde::Deserialize;

/// TOML deployment configuration: the geofence registry, classification
/// constants and key size. Centers are written in degrees and converted to
/// radians at load.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scheme: String,
    pub key_bits: u64,
    pub radius_m: f64,
    pub earth_radius_m: f64,
    pub centers: Vec<CenterConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CenterConfig {
    pub longitude: f64,
    pub latitude: f64,
}

impl Config {
    pub fn registry(&self) -> GeofenceRegistry {
        let centers = self
            .centers
            .iter()
            .map(|center| GeofenceCenter::from_degrees(center.longitude, center.latitude))
            .collect();
        GeofenceRegistry::new(centers, self.radius_m, self.earth_radius_m)
    }
}
