//! The three protocol roles and the transport seams between them.
//!
//! Transport is synchronous request/response with a bounded timeout expected
//! at every call boundary; a timed-out or unreachable peer surfaces as
//! `Error::Transport` to the caller. The in-process wiring used by tests and
//! the CLI implements the same traits an HTTP client would.

use crate::classifier::classify_results;
use crate::context::EncryptionContext;
use crate::encoder::{encode_location, LocationTerms, Scheme};
use crate::error::{Error, Result};
use crate::evaluator::evaluate_registry;
use crate::paillier::{generate_keypair, EncryptedScalar, PaillierKeyPair};
use crate::registry::GeofenceRegistry;
use crate::wire::{
    extract_location_terms, location_payload, parse_submit_location, ClassifiedEntry,
    KeyContextResponse, StatusEntry, SubmitGeofenceResultRequest, SubmitGeofenceResultResponse,
    SubmitLocationRequest, SubmitLocationResponse, WireCiphertext,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Calls a Location Owner or Boundary Evaluator can make against the Key
/// Holder.
pub trait KeyHolderTransport {
    fn fetch_key_context(&self) -> Result<KeyContextResponse>;
    fn submit_geofence_result(
        &self,
        request: &SubmitGeofenceResultRequest,
    ) -> Result<SubmitGeofenceResultResponse>;
}

/// Calls a Location Owner can make against the Boundary Evaluator.
pub trait BoundaryEvaluatorTransport {
    fn submit_location(&self, body: &Value) -> Result<SubmitLocationResponse>;
}

impl<T: KeyHolderTransport> KeyHolderTransport for Arc<T> {
    fn fetch_key_context(&self) -> Result<KeyContextResponse> {
        (**self).fetch_key_context()
    }

    fn submit_geofence_result(
        &self,
        request: &SubmitGeofenceResultRequest,
    ) -> Result<SubmitGeofenceResultResponse> {
        (**self).submit_geofence_result(request)
    }
}

impl<T: BoundaryEvaluatorTransport> BoundaryEvaluatorTransport for Arc<T> {
    fn submit_location(&self, body: &Value) -> Result<SubmitLocationResponse> {
        (**self).submit_location(body)
    }
}

/// Key Holder role: owns the only decryption key in the system plus the
/// classification constants. The keypair is generated once at startup and
/// read-only afterwards.
pub struct KeyHolderService {
    keypair: PaillierKeyPair,
    scheme: Scheme,
    radius_m: f64,
    earth_radius_m: f64,
}

impl KeyHolderService {
    pub fn new(keypair: PaillierKeyPair, scheme: Scheme, radius_m: f64, earth_radius_m: f64) -> Self {
        Self { keypair, scheme, radius_m, earth_radius_m }
    }

    pub fn generate(key_bits: u64, scheme: Scheme, radius_m: f64, earth_radius_m: f64) -> Self {
        let start = Instant::now();
        let keypair = generate_keypair(key_bits);
        info!("Time to generate {key_bits}-bit keypair: {:?}", start.elapsed());
        Self::new(keypair, scheme, radius_m, earth_radius_m)
    }

    /// Public half of the context; the private key never leaves this role.
    pub fn context(&self) -> EncryptionContext {
        EncryptionContext::new(self.keypair.public().clone())
    }

    pub fn handle_key_context(&self) -> KeyContextResponse {
        KeyContextResponse { public_key_n: self.context().fingerprint() }
    }

    pub fn handle_geofence_result(
        &self,
        request: &SubmitGeofenceResultRequest,
    ) -> Result<SubmitGeofenceResultResponse> {
        if request.public_key_n != self.context().fingerprint() {
            return Err(Error::ContextMismatch);
        }
        let values: Vec<EncryptedScalar> = request
            .encrypted_results
            .iter()
            .map(|wire| {
                EncryptedScalar::from_parts(
                    self.keypair.public().clone(),
                    wire.ciphertext.clone(),
                    wire.exponent,
                )
            })
            .collect();
        let start = Instant::now();
        let results = classify_results(
            self.scheme,
            &values,
            self.keypair.private(),
            self.radius_m,
            self.earth_radius_m,
        )?;
        info!("Time to decrypt and classify {} results: {:?}", results.len(), start.elapsed());
        Ok(SubmitGeofenceResultResponse::success(
            results
                .into_iter()
                .map(|result| ClassifiedEntry { value: result.distance_proxy, status: result.status })
                .collect(),
        ))
    }
}

impl KeyHolderTransport for KeyHolderService {
    fn fetch_key_context(&self) -> Result<KeyContextResponse> {
        Ok(self.handle_key_context())
    }

    fn submit_geofence_result(
        &self,
        request: &SubmitGeofenceResultRequest,
    ) -> Result<SubmitGeofenceResultResponse> {
        self.handle_geofence_result(request)
    }
}

/// Boundary Evaluator role: owns the geofence registry and the trusted key
/// context, applies the homomorphic transform, and relays the Key Holder's
/// decisions back to the owner with the decrypted proxies stripped.
pub struct BoundaryEvaluatorService<K: KeyHolderTransport> {
    registry: GeofenceRegistry,
    scheme: Scheme,
    trusted_context: EncryptionContext,
    key_holder: K,
}

impl<K: KeyHolderTransport> BoundaryEvaluatorService<K> {
    /// Fetch the key context this evaluator will trust for its lifetime.
    pub fn bootstrap(registry: GeofenceRegistry, scheme: Scheme, key_holder: K) -> Result<Self> {
        let response = key_holder.fetch_key_context()?;
        let n = response.public_key_n.parse().map_err(|_| {
            Error::Transport("key holder returned a malformed key context".into())
        })?;
        debug!("trusting key context fingerprint of {} digits", response.public_key_n.len());
        Ok(Self { registry, scheme, trusted_context: EncryptionContext::from_modulus(n), key_holder })
    }

    pub fn registry(&self) -> &GeofenceRegistry {
        &self.registry
    }

    pub fn trusted_context(&self) -> &EncryptionContext {
        &self.trusted_context
    }

    pub fn handle_submit_location(&self, body: &Value) -> Result<SubmitLocationResponse> {
        let request = self.validate(body)?;
        let terms = extract_location_terms(
            &request.user_encrypted_location,
            self.scheme,
            self.trusted_context.public_key(),
        )?;
        let start = Instant::now();
        let values = evaluate_registry(self.scheme, &terms, &self.trusted_context, &self.registry)?;
        info!(
            "Time to evaluate {} terms against {} centers: {:?}",
            terms.wire_terms().len(),
            self.registry.len(),
            start.elapsed(),
        );
        let downstream = SubmitGeofenceResultRequest {
            encrypted_results: values.iter().map(WireCiphertext::from_scalar).collect(),
            public_key_n: request.public_key_n,
        };
        let response = self.key_holder.submit_geofence_result(&downstream)?;
        Ok(SubmitLocationResponse::success(
            response.results.into_iter().map(|entry| StatusEntry { status: entry.status }).collect(),
        ))
    }

    /// Payload validation performed before any cryptographic work: required
    /// fields present, fingerprint matches the trusted context.
    fn validate(&self, body: &Value) -> Result<SubmitLocationRequest> {
        let request = parse_submit_location(body)?;
        if request.public_key_n != self.trusted_context.fingerprint() {
            return Err(Error::ContextMismatch);
        }
        Ok(request)
    }
}

impl<K: KeyHolderTransport> BoundaryEvaluatorTransport for BoundaryEvaluatorService<K> {
    fn submit_location(&self, body: &Value) -> Result<SubmitLocationResponse> {
        self.handle_submit_location(body)
    }
}

/// Location Owner role: the only party that ever sees the plaintext
/// coordinates. Learns nothing about individual geofence centers; only the
/// final classification list comes back.
pub struct LocationOwner {
    latitude: f64,
    longitude: f64,
    context: EncryptionContext,
}

impl LocationOwner {
    pub fn new(latitude: f64, longitude: f64, context: EncryptionContext) -> Self {
        Self { latitude, longitude, context }
    }

    /// Fetch the public context from the Key Holder and bind to it.
    pub fn bootstrap(
        latitude: f64,
        longitude: f64,
        key_holder: &impl KeyHolderTransport,
    ) -> Result<Self> {
        let response = key_holder.fetch_key_context()?;
        let n = response.public_key_n.parse().map_err(|_| {
            Error::Transport("key holder returned a malformed key context".into())
        })?;
        Ok(Self::new(latitude, longitude, EncryptionContext::from_modulus(n)))
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn context(&self) -> &EncryptionContext {
        &self.context
    }

    pub fn encode_terms(&self, scheme: Scheme) -> Result<LocationTerms> {
        let start = Instant::now();
        let terms = encode_location(scheme, self.latitude, self.longitude, &self.context)?;
        info!("Time to encode {} location terms: {:?}", terms.wire_terms().len(), start.elapsed());
        Ok(terms)
    }

    pub fn submit_request(&self, terms: &LocationTerms) -> Value {
        location_payload(terms, &self.context.fingerprint())
    }
}
