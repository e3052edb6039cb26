use crate::paillier::{EncryptedScalar, PaillierPublicKey};
use num_bigint::BigUint;

/// Public encryption context shared by every role
///
/// Created once at Key Holder startup and read-only afterwards; all
/// concurrent evaluations reference the same context. It carries only public
/// key material, never the decryption key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionContext {
    public_key: PaillierPublicKey,
}

impl EncryptionContext {
    pub fn new(public_key: PaillierPublicKey) -> Self {
        Self { public_key }
    }

    /// Rebuild a context from the modulus published by the Key Holder.
    pub fn from_modulus(n: BigUint) -> Self {
        Self { public_key: PaillierPublicKey::new(n) }
    }

    pub fn public_key(&self) -> &PaillierPublicKey {
        &self.public_key
    }

    /// Stable identifier for key-consistency checks: the decimal modulus,
    /// exactly as it travels in the `public_key_n` wire field.
    pub fn fingerprint(&self) -> String {
        self.public_key.n().to_string()
    }

    pub fn encrypt(&self, value: f64) -> EncryptedScalar {
        self.public_key.encrypt(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paillier::generate_keypair;

    #[test]
    fn fingerprint_round_trips_through_the_wire_form() {
        let keys = generate_keypair(128);
        let context = EncryptionContext::new(keys.public().clone());
        let n: BigUint = context.fingerprint().parse().unwrap();
        assert_eq!(EncryptionContext::from_modulus(n), context);
    }
}
