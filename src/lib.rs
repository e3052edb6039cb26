//! Privacy-preserving circular geofencing over partially homomorphic
//! encryption.
//!
//! A mobile client proves whether its location lies inside one of several
//! geofence boundaries without revealing the location in plaintext to any
//! other party. The haversine great-circle test is reformulated so that the
//! Boundary Evaluator only needs ciphertext additions and plaintext-scalar
//! multiplications, and a three-role trust split keeps the decryption key
//! (Key Holder) separated from the service that sees the geofence
//! boundaries (Boundary Evaluator):
//!
//! * the Location Owner encrypts trigonometric cross-terms of its
//!   coordinates and learns only the final classification list;
//! * the Boundary Evaluator combines them with plaintext per-center
//!   coefficients, never holding a decryption key;
//! * the Key Holder decrypts one scalar per center and inverts the encoding
//!   into an inside/outside decision, never seeing center coordinates.
//!
//! Two encoding variants share the same pipeline: the six-term `Reference`
//! haversine expansion and the three-term `Proposed` unit-sphere projection.

pub mod classifier;
pub mod context;
pub mod encoder;
pub mod error;
pub mod evaluator;
pub mod paillier;
pub mod protocol;
pub mod registry;
pub mod roles;
pub mod test_utils;
pub mod utils;
pub mod wire;

pub use classifier::{classify_results, ClassificationResult, GeofenceStatus, DOMAIN_TOLERANCE};
pub use context::EncryptionContext;
pub use encoder::{encode_location, LocationTerms, Scheme};
pub use error::{Error, Result};
pub use evaluator::{evaluate_registry, IntermediateValue};
pub use paillier::{generate_keypair, EncryptedScalar, PaillierKeyPair, PaillierPublicKey};
pub use protocol::{DisclosureOutcome, DisclosureRequest, ProtocolCoordinator, Stage};
pub use registry::{haversine_distance, GeofenceCenter, GeofenceRegistry};
pub use roles::{
    BoundaryEvaluatorService, BoundaryEvaluatorTransport, KeyHolderService, KeyHolderTransport,
    LocationOwner,
};
pub use utils::init_tracing;
