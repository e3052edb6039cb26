use crate::context::EncryptionContext;
use crate::encoder::{LocationTerms, Scheme};
use crate::error::{Error, Result};
use crate::paillier::EncryptedScalar;
use crate::registry::{GeofenceCenter, GeofenceRegistry};
use rayon::prelude::*;

/// Encrypted distance proxy for one (LocationTerms, GeofenceCenter) pair: a
/// monotonic function of the great-circle distance, not the distance itself.
pub type IntermediateValue = EncryptedScalar;

/// Combine the encrypted terms with plaintext per-center coefficients into
/// one intermediate value per registered center, in registry order.
///
/// The coefficients are trigonometric functions of each center's own
/// coordinates, computed locally and never encrypted or transmitted. The
/// whole pass is a pure homomorphic transform: no decryption is ever
/// invoked, so this role learns nothing about which center the point falls
/// inside. Centers are evaluated in parallel; output order is registry
/// order.
pub fn evaluate_registry(
    scheme: Scheme,
    terms: &LocationTerms,
    context: &EncryptionContext,
    registry: &GeofenceRegistry,
) -> Result<Vec<IntermediateValue>> {
    if terms.public_key() != context.public_key() {
        return Err(Error::ContextMismatch);
    }
    if terms.scheme() != scheme {
        return Err(Error::missing_terms(scheme.term_keys().iter().copied()));
    }
    Ok(registry
        .centers()
        .par_iter()
        .map(|center| evaluate_center(terms, center))
        .collect())
}

fn evaluate_center(terms: &LocationTerms, center: &GeofenceCenter) -> IntermediateValue {
    let lat = center.latitude();
    let lon = center.longitude();
    match terms {
        LocationTerms::Proposed(terms) => terms
            .c1
            .mul_plain(-lat.sin())
            .add(&terms.c2.mul_plain(-lat.cos() * lon.cos()))
            .add(&terms.c3.mul_plain(-lat.cos() * lon.sin()))
            .add_plain(1.0),
        LocationTerms::Reference(terms) => {
            let half_lat_sin = (lat / 2.0).sin();
            let half_lat_cos = (lat / 2.0).cos();
            let lat_cos = lat.cos();
            let half_lon_cos = (lon / 2.0).cos();
            let half_lon_sin = (lon / 2.0).sin();
            terms
                .t1
                .mul_plain(half_lat_sin * half_lat_sin)
                .add(&terms.t3.mul_plain(-2.0 * half_lat_sin * half_lat_cos))
                .add(&terms.t2.mul_plain(half_lat_cos * half_lat_cos))
                .add(&terms.t4.mul_plain(lat_cos * half_lon_cos * half_lon_cos))
                .add(&terms.t5.mul_plain(-2.0 * lat_cos * half_lon_cos * half_lon_sin))
                .add(&terms.t6.mul_plain(lat_cos * half_lon_sin * half_lon_sin))
        }
    }
}
