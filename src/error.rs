use itertools::Itertools;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy for the geofence evaluation protocol.
///
/// Each role validates its own inputs before doing any cryptographic work and
/// fails fast with one of these variants. Only `Transport` may trigger
/// caller-side fallback behavior (an `"unknown"` status); no variant is ever
/// mapped to an `inside`/`outside` classification.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed request payload. The message is part of the wire
    /// contract and travels verbatim in the error response body.
    #[error("{0}")]
    Validation(String),

    /// The payload does not carry the named terms the configured encoding
    /// variant requires.
    #[error("Missing required keys in 'user_encrypted_location': {}", .keys.iter().join(", "))]
    MissingTerm { keys: Vec<String> },

    /// The context fingerprint supplied by the caller does not match the
    /// context this role trusts.
    #[error("Public key mismatch. Encryption was not done with the correct public key.")]
    ContextMismatch,

    /// Latitude/longitude handed to the term encoder were not finite.
    #[error("latitude/longitude must be finite, got ({latitude}, {longitude})")]
    Encoding { latitude: f64, longitude: f64 },

    /// The ciphertext could not be decrypted under the held private key
    /// (wrong key or corrupted payload).
    #[error("ciphertext is not decryptable under the held private key")]
    Decryption,

    /// The decrypted distance proxy fell outside the mathematically valid
    /// domain of the decoding by more than the noise tolerance.
    #[error("decrypted value {value} outside the valid domain [{min}, {max}]")]
    Domain { value: f64, min: f64, max: f64 },

    /// A downstream role was unreachable or timed out. Surfaced to the
    /// original caller as an `"unknown"` outcome, never as a classification.
    #[error("downstream role unreachable: {0}")]
    Transport(String),
}

impl Error {
    /// HTTP status the out-of-scope transport layer should attach to this
    /// error when serializing it into a response body.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_)
            | Error::MissingTerm { .. }
            | Error::ContextMismatch
            | Error::Encoding { .. } => 400,
            Error::Decryption | Error::Domain { .. } | Error::Transport(_) => 500,
        }
    }

    pub fn missing_terms<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::MissingTerm { keys: keys.into_iter().map(Into::into).collect() }
    }
}
