use crate::context::EncryptionContext;
use crate::error::{Error, Result};
use crate::paillier::{EncryptedScalar, PaillierPublicKey};

/// The two encoding variants sharing one Encoder/Evaluator/Classifier
/// contract.
///
/// *Reference* mirrors the textbook haversine expansion through half-angle
/// identities: six encrypted terms, six plaintext multiply-accumulates per
/// center, and an exact central-angle decode.
///
/// *Proposed* encrypts the Cartesian projection of the point on the unit
/// sphere: three encrypted terms, three multiply-accumulates per center, a
/// materially smaller payload, at the price of a small-angle decode only
/// accurate for distances short relative to Earth's radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Reference,
    Proposed,
}

impl Scheme {
    pub fn name(&self) -> &'static str {
        match self {
            Scheme::Reference => "reference",
            Scheme::Proposed => "proposed",
        }
    }

    /// The wire keys a `user_encrypted_location` payload of this variant
    /// must carry, in reporting order.
    pub fn term_keys(&self) -> &'static [&'static str] {
        match self {
            Scheme::Reference => &[
                "t1_ct", "t1_exp", "t2_ct", "t2_exp", "t3_ct", "t3_exp", "t4_ct", "t4_exp",
                "t5_ct", "t5_exp", "t6_ct", "t6_exp",
            ],
            Scheme::Proposed => &["c1_ct", "c1_exp", "c2_ct", "c2_exp", "c3_ct", "c3_exp"],
        }
    }
}

impl std::str::FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reference" => Ok(Scheme::Reference),
            "proposed" => Ok(Scheme::Proposed),
            other => Err(Error::Validation(format!("unknown scheme '{other}'"))),
        }
    }
}

/// Six encrypted half-angle quantities of the reference encoding, all
/// derived from the owner's (latitude, longitude):
///
/// * `t1` = cos²(lat/2)
/// * `t2` = sin²(lat/2)
/// * `t3` = cos(lat/2)·sin(lat/2)
/// * `t4` = cos(lat)·sin²(lon/2)
/// * `t5` = cos(lat)·sin(lon/2)·cos(lon/2)
/// * `t6` = cos(lat)·cos²(lon/2)
#[derive(Debug, Clone)]
pub struct ReferenceTerms {
    pub t1: EncryptedScalar,
    pub t2: EncryptedScalar,
    pub t3: EncryptedScalar,
    pub t4: EncryptedScalar,
    pub t5: EncryptedScalar,
    pub t6: EncryptedScalar,
}

/// Three encrypted Cartesian components of the proposed encoding:
/// `c1` = sin(lat), `c2` = cos(lat)·cos(lon), `c3` = cos(lat)·sin(lon).
#[derive(Debug, Clone)]
pub struct ProposedTerms {
    pub c1: EncryptedScalar,
    pub c2: EncryptedScalar,
    pub c3: EncryptedScalar,
}

/// Encrypted trigonometric cross-terms for one location-disclosure event.
/// Created once, consumed by the Boundary Evaluator, never mutated.
#[derive(Debug, Clone)]
pub enum LocationTerms {
    Reference(ReferenceTerms),
    Proposed(ProposedTerms),
}

impl LocationTerms {
    pub fn scheme(&self) -> Scheme {
        match self {
            LocationTerms::Reference(_) => Scheme::Reference,
            LocationTerms::Proposed(_) => Scheme::Proposed,
        }
    }

    /// The public key every term in this bundle was encrypted under.
    pub fn public_key(&self) -> &PaillierPublicKey {
        match self {
            LocationTerms::Reference(terms) => terms.t1.public_key(),
            LocationTerms::Proposed(terms) => terms.c1.public_key(),
        }
    }

    /// Wire (key, scalar) pairs in the variant's reporting order.
    pub fn wire_terms(&self) -> Vec<(&'static str, &EncryptedScalar)> {
        match self {
            LocationTerms::Reference(terms) => vec![
                ("t1", &terms.t1),
                ("t2", &terms.t2),
                ("t3", &terms.t3),
                ("t4", &terms.t4),
                ("t5", &terms.t5),
                ("t6", &terms.t6),
            ],
            LocationTerms::Proposed(terms) => {
                vec![("c1", &terms.c1), ("c2", &terms.c2), ("c3", &terms.c3)]
            }
        }
    }
}

/// Encode a plaintext location into the encrypted terms of the given
/// variant. Runs on the Location Owner; the only failure mode is a
/// non-finite coordinate, since encryption under a well-formed context
/// cannot fail.
pub fn encode_location(
    scheme: Scheme,
    latitude: f64,
    longitude: f64,
    context: &EncryptionContext,
) -> Result<LocationTerms> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(Error::Encoding { latitude, longitude });
    }
    match scheme {
        Scheme::Reference => {
            let half_lat_cos = (latitude / 2.0).cos();
            let half_lat_sin = (latitude / 2.0).sin();
            let half_lon_sin = (longitude / 2.0).sin();
            let half_lon_cos = (longitude / 2.0).cos();
            let lat_cos = latitude.cos();
            Ok(LocationTerms::Reference(ReferenceTerms {
                t1: context.encrypt(half_lat_cos * half_lat_cos),
                t2: context.encrypt(half_lat_sin * half_lat_sin),
                t3: context.encrypt(half_lat_cos * half_lat_sin),
                t4: context.encrypt(lat_cos * half_lon_sin * half_lon_sin),
                t5: context.encrypt(lat_cos * half_lon_sin * half_lon_cos),
                t6: context.encrypt(lat_cos * half_lon_cos * half_lon_cos),
            }))
        }
        Scheme::Proposed => Ok(LocationTerms::Proposed(ProposedTerms {
            c1: context.encrypt(latitude.sin()),
            c2: context.encrypt(latitude.cos() * longitude.cos()),
            c3: context.encrypt(latitude.cos() * longitude.sin()),
        })),
    }
}
