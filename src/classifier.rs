use crate::encoder::Scheme;
use crate::error::{Error, Result};
use crate::evaluator::IntermediateValue;
use crate::paillier::PaillierPrivateKey;
use serde::{Deserialize, Serialize};

/// Decrypted proxies may drift past the valid decode domain by encryption
/// and fixed-point noise. Excursions up to this tolerance are clamped to the
/// nearest bound; anything larger is a `DomainError`. This clamp-or-error
/// policy is part of the classifier contract.
pub const DOMAIN_TOLERANCE: f64 = 1e-6;

/// Boundary membership decision for one geofence center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceStatus {
    Inside,
    Outside,
}

impl GeofenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeofenceStatus::Inside => "inside",
            GeofenceStatus::Outside => "outside",
        }
    }
}

/// Terminal artifact of one evaluation: the decrypted distance proxy and
/// the membership decision derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    pub distance_proxy: f64,
    pub status: GeofenceStatus,
}

/// Decrypt each intermediate value and classify it against the boundary
/// radius, preserving input order.
///
/// Decryption failures are reported, never defaulted: a result list is only
/// produced when every entry decrypted and decoded cleanly.
pub fn classify_results(
    scheme: Scheme,
    values: &[IntermediateValue],
    private_key: &PaillierPrivateKey,
    radius_m: f64,
    earth_radius_m: f64,
) -> Result<Vec<ClassificationResult>> {
    values
        .iter()
        .map(|value| {
            let proxy = private_key.decrypt(value)?;
            let distance = decode_distance(scheme, proxy, earth_radius_m)?;
            let status = if distance <= radius_m {
                GeofenceStatus::Inside
            } else {
                GeofenceStatus::Outside
            };
            Ok(ClassificationResult { distance_proxy: proxy, status })
        })
        .collect()
}

/// Closed-form inverse of the encoding: decrypted proxy to meters.
///
/// *Reference*: v is the haversine `a` value; the central angle is
/// `2·atan2(√v, √(1−v))`. *Proposed*: v is `1 − cos(Δσ)`, inverted through
/// `2·asin(√(v/2))`.
pub fn decode_distance(scheme: Scheme, proxy: f64, earth_radius_m: f64) -> Result<f64> {
    let max = match scheme {
        Scheme::Reference => 1.0,
        Scheme::Proposed => 2.0,
    };
    let v = clamp_to_domain(proxy, 0.0, max)?;
    let distance = match scheme {
        Scheme::Reference => earth_radius_m * 2.0 * v.sqrt().atan2((1.0 - v).sqrt()),
        Scheme::Proposed => 2.0 * earth_radius_m * (v / 2.0).sqrt().asin(),
    };
    Ok(distance)
}

fn clamp_to_domain(value: f64, min: f64, max: f64) -> Result<f64> {
    if value >= min && value <= max {
        return Ok(value);
    }
    if value >= min - DOMAIN_TOLERANCE && value <= max + DOMAIN_TOLERANCE {
        return Ok(value.clamp(min, max));
    }
    Err(Error::Domain { value, min, max })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EARTH_RADIUS_M: f64 = 6_371_000.0;

    #[test]
    fn zero_proxy_is_zero_distance() {
        assert_eq!(decode_distance(Scheme::Reference, 0.0, EARTH_RADIUS_M).unwrap(), 0.0);
        assert_eq!(decode_distance(Scheme::Proposed, 0.0, EARTH_RADIUS_M).unwrap(), 0.0);
    }

    #[test]
    fn both_decodings_agree_for_short_distances() {
        // 1 km geofence scale: a ≈ (d / 2R)², v_prop = 2a.
        let a = (500.0 / (2.0 * EARTH_RADIUS_M)).powi(2);
        let reference = decode_distance(Scheme::Reference, a, EARTH_RADIUS_M).unwrap();
        let proposed = decode_distance(Scheme::Proposed, 2.0 * a, EARTH_RADIUS_M).unwrap();
        assert!((reference - proposed).abs() < 1e-6);
        assert!((reference - 500.0).abs() < 1e-6);
    }

    #[test]
    fn noise_sized_excursions_are_clamped() {
        let just_below = decode_distance(Scheme::Reference, -1e-9, EARTH_RADIUS_M).unwrap();
        assert_eq!(just_below, 0.0);
        let just_above = decode_distance(Scheme::Reference, 1.0 + 1e-9, EARTH_RADIUS_M).unwrap();
        assert!((just_above - EARTH_RADIUS_M * std::f64::consts::PI).abs() < 1e-3);
    }

    #[test]
    fn large_excursions_are_domain_errors() {
        let err = decode_distance(Scheme::Proposed, 2.5, EARTH_RADIUS_M).unwrap_err();
        assert!(matches!(err, Error::Domain { .. }));
        let err = decode_distance(Scheme::Reference, -0.01, EARTH_RADIUS_M).unwrap_err();
        assert!(matches!(err, Error::Domain { .. }));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&GeofenceStatus::Inside).unwrap(), "\"inside\"");
        assert_eq!(
            serde_json::from_str::<GeofenceStatus>("\"outside\"").unwrap(),
            GeofenceStatus::Outside
        );
    }
}
