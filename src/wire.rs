//! JSON payload contracts between the three roles. Field names are
//! bit-exact; ciphertexts and the modulus travel as decimal strings since
//! JSON numbers cannot carry multi-thousand-bit integers.

use crate::classifier::GeofenceStatus;
use crate::encoder::{LocationTerms, ProposedTerms, ReferenceTerms, Scheme};
use crate::error::{Error, Result};
use crate::paillier::{EncryptedScalar, PaillierPublicKey};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Decimal-string serde for big unsigned integers.
pub mod biguint_decimal {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(|_| de::Error::custom("expected a decimal integer string"))
    }
}

/// Validated body of `POST /submit-location`.
#[derive(Debug, Clone)]
pub struct SubmitLocationRequest {
    pub user_encrypted_location: Map<String, Value>,
    pub public_key_n: String,
}

/// Validate the outer shape of a submit-location body. Field-presence
/// messages are part of the wire contract.
pub fn parse_submit_location(body: &Value) -> Result<SubmitLocationRequest> {
    let data = match body.as_object() {
        Some(data) if !data.is_empty() => data,
        _ => return Err(Error::Validation("Request data is missing".into())),
    };
    if !data.contains_key("user_encrypted_location") || !data.contains_key("public_key_n") {
        return Err(Error::Validation(
            "Missing 'user_encrypted_location' or 'public_key_n' in request data".into(),
        ));
    }
    let terms = data["user_encrypted_location"].as_object().ok_or_else(|| {
        Error::Validation("Invalid 'user_encrypted_location' in request data".into())
    })?;
    let public_key_n = data["public_key_n"]
        .as_str()
        .ok_or_else(|| Error::Validation("Invalid 'public_key_n' in request data".into()))?;
    Ok(SubmitLocationRequest {
        user_encrypted_location: terms.clone(),
        public_key_n: public_key_n.to_string(),
    })
}

/// Rebuild typed location terms from the payload map, against the expected
/// variant. Reports the full list of absent keys in one shot.
pub fn extract_location_terms(
    payload: &Map<String, Value>,
    scheme: Scheme,
    public_key: &PaillierPublicKey,
) -> Result<LocationTerms> {
    let missing: Vec<&str> = scheme
        .term_keys()
        .iter()
        .copied()
        .filter(|key| !payload.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(Error::missing_terms(missing));
    }

    let scalar = |name: &str| -> Result<EncryptedScalar> {
        let ct_key = format!("{name}_ct");
        let exp_key = format!("{name}_exp");
        let ciphertext: BigUint = payload[&ct_key]
            .as_str()
            .and_then(|text| text.parse().ok())
            .ok_or_else(|| invalid_term(&ct_key))?;
        let exponent = payload[&exp_key].as_i64().ok_or_else(|| invalid_term(&exp_key))?;
        Ok(EncryptedScalar::from_parts(public_key.clone(), ciphertext, exponent))
    };

    match scheme {
        Scheme::Proposed => Ok(LocationTerms::Proposed(ProposedTerms {
            c1: scalar("c1")?,
            c2: scalar("c2")?,
            c3: scalar("c3")?,
        })),
        Scheme::Reference => Ok(LocationTerms::Reference(ReferenceTerms {
            t1: scalar("t1")?,
            t2: scalar("t2")?,
            t3: scalar("t3")?,
            t4: scalar("t4")?,
            t5: scalar("t5")?,
            t6: scalar("t6")?,
        })),
    }
}

fn invalid_term(key: &str) -> Error {
    Error::Validation(format!("Invalid value for '{key}' in 'user_encrypted_location'"))
}

/// Owner-side construction of the submit-location body.
pub fn location_payload(terms: &LocationTerms, public_key_n: &str) -> Value {
    let mut map = Map::new();
    for (name, scalar) in terms.wire_terms() {
        map.insert(format!("{name}_ct"), Value::String(scalar.ciphertext().to_string()));
        map.insert(format!("{name}_exp"), json!(scalar.exponent()));
    }
    json!({ "user_encrypted_location": map, "public_key_n": public_key_n })
}

/// One serialized intermediate value on its way to the Key Holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireCiphertext {
    #[serde(with = "biguint_decimal")]
    pub ciphertext: BigUint,
    pub exponent: i64,
}

impl WireCiphertext {
    pub fn from_scalar(scalar: &EncryptedScalar) -> Self {
        Self { ciphertext: scalar.ciphertext().clone(), exponent: scalar.exponent() }
    }
}

/// Body of `POST /submit-geofence-result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitGeofenceResultRequest {
    pub encrypted_results: Vec<WireCiphertext>,
    pub public_key_n: String,
}

/// One classified entry as the Key Holder reports it: the decrypted
/// distance proxy and the membership decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedEntry {
    pub value: f64,
    pub status: GeofenceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitGeofenceResultResponse {
    pub status: String,
    pub results: Vec<ClassifiedEntry>,
}

impl SubmitGeofenceResultResponse {
    pub fn success(results: Vec<ClassifiedEntry>) -> Self {
        Self { status: "success".into(), results }
    }
}

/// One status-only entry as the Boundary Evaluator relays it back to the
/// Location Owner; the decrypted proxies stay with the Key Holder response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: GeofenceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitLocationResponse {
    pub status: String,
    pub results: Vec<StatusEntry>,
}

impl SubmitLocationResponse {
    pub fn success(results: Vec<StatusEntry>) -> Self {
        Self { status: "success".into(), results }
    }
}

/// Body of `GET /get-key-context`: the public context, never the private
/// key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyContextResponse {
    pub public_key_n: String,
}

/// Error body shared by every endpoint, paired with the HTTP status the
/// transport layer should attach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(error: &Error) -> (u16, Self) {
        (error.http_status(), Self { status: "error".into(), message: error.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EncryptionContext;
    use crate::encoder::encode_location;
    use crate::paillier::generate_keypair;

    #[test]
    fn empty_and_non_object_bodies_are_missing_data() {
        for body in [json!(null), json!({}), json!("text")] {
            let err = parse_submit_location(&body).unwrap_err();
            assert_eq!(err.to_string(), "Request data is missing");
        }
    }

    #[test]
    fn absent_outer_fields_are_named() {
        let err = parse_submit_location(&json!({ "public_key_n": "5" })).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing 'user_encrypted_location' or 'public_key_n' in request data"
        );
    }

    #[test]
    fn missing_term_keys_are_listed_in_order() {
        let keys = generate_keypair(128);
        let payload = Map::new();
        let err = extract_location_terms(&payload, Scheme::Proposed, keys.public()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required keys in 'user_encrypted_location': c1_ct, c1_exp, c2_ct, c2_exp, c3_ct, c3_exp"
        );
    }

    #[test]
    fn payload_round_trips_to_identical_terms() {
        let keys = generate_keypair(256);
        let context = EncryptionContext::new(keys.public().clone());
        let terms = encode_location(Scheme::Proposed, 0.9002, -0.1697, &context).unwrap();
        let body = location_payload(&terms, &context.fingerprint());

        let request = parse_submit_location(&body).unwrap();
        assert_eq!(request.public_key_n, context.fingerprint());
        let rebuilt = extract_location_terms(
            &request.user_encrypted_location,
            Scheme::Proposed,
            context.public_key(),
        )
        .unwrap();
        let (LocationTerms::Proposed(a), LocationTerms::Proposed(b)) = (&terms, &rebuilt) else {
            panic!("wrong variant");
        };
        assert_eq!(a.c1.ciphertext(), b.c1.ciphertext());
        assert_eq!(a.c3.exponent(), b.c3.exponent());
    }

    #[test]
    fn error_response_carries_status_and_exact_message() {
        let (status, body) = ErrorResponse::from_error(&Error::ContextMismatch);
        assert_eq!(status, 400);
        assert_eq!(body.status, "error");
        assert_eq!(
            body.message,
            "Public key mismatch. Encryption was not done with the correct public key."
        );
    }

    #[test]
    fn wire_ciphertext_serializes_decimal_strings() {
        let wire = WireCiphertext { ciphertext: BigUint::from(123456789u64), exponent: -13 };
        let text = serde_json::to_string(&wire).unwrap();
        assert_eq!(text, r#"{"ciphertext":"123456789","exponent":-13}"#);
        let back: WireCiphertext = serde_json::from_str(&text).unwrap();
        assert_eq!(back.ciphertext, wire.ciphertext);
    }
}
