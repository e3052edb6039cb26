use crate::error::{Error, Result};
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rand::{thread_rng, Rng};

/// Fixed-point mantissa base. Encoding a real number picks the largest
/// base-16 exponent that still captures every bit of the f64 mantissa, so
/// encode/decode round-trips are exact.
const MANTISSA_BASE: u32 = 16;
const LOG2_BASE: i64 = 4;
const F64_MANTISSA_BITS: i64 = 53;

/// Miller-Rabin rounds for prime generation. 25 rounds push the error
/// probability below 2^-50 for the sizes used here.
const PRIMALITY_ROUNDS: usize = 25;

const SMALL_PRIMES: [u32; 24] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Public half of a Paillier keypair
///
/// # Fields
///
/// * `n`: the modulus p·q
/// * `n_sq`: n², the ciphertext modulus
/// * `max_int`: n/3, the largest encodable magnitude; residues between
///   `max_int` and `n - max_int` are not reachable by valid arithmetic and
///   signal corruption or a foreign key on decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaillierPublicKey {
    n: BigUint,
    n_sq: BigUint,
    max_int: BigUint,
}

impl PaillierPublicKey {
    pub fn new(n: BigUint) -> Self {
        let n_sq = &n * &n;
        let max_int = &n / 3u32;
        Self { n, n_sq, max_int }
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    /// Encrypt a real number under this key, blinded with a fresh random
    /// factor r^n.
    pub fn encrypt(&self, value: f64) -> EncryptedScalar {
        let encoded = EncodedNumber::encode(self, value);
        let mut rng = thread_rng();
        let ciphertext = self.obfuscate(self.raw_encrypt(&encoded.mantissa), &mut rng);
        EncryptedScalar { public_key: self.clone(), ciphertext, exponent: encoded.exponent }
    }

    /// Deterministic encryption of an encoded mantissa: (1 + n·m) mod n².
    /// With generator g = n + 1, g^m reduces to this binomial form.
    fn raw_encrypt(&self, mantissa: &BigUint) -> BigUint {
        (BigUint::one() + &self.n * mantissa) % &self.n_sq
    }

    fn obfuscate(&self, ciphertext: BigUint, rng: &mut impl Rng) -> BigUint {
        let r = rng.gen_biguint_range(&BigUint::one(), &self.n);
        (ciphertext * r.modpow(&self.n, &self.n_sq)) % &self.n_sq
    }
}

/// Private half of a Paillier keypair. Never leaves the Key Holder.
#[derive(Debug, Clone)]
pub struct PaillierPrivateKey {
    lambda: BigUint,
    mu: BigUint,
    public: PaillierPublicKey,
}

impl PaillierPrivateKey {
    pub fn public(&self) -> &PaillierPublicKey {
        &self.public
    }

    /// Decrypt an encrypted scalar back to a real number.
    ///
    /// Fails with `Error::Decryption` if the ciphertext is outside the
    /// ciphertext group or the decrypted residue lands in the dead zone
    /// between the positive and negative encodable ranges, which is where
    /// foreign-key or corrupted ciphertexts end up.
    pub fn decrypt(&self, scalar: &EncryptedScalar) -> Result<f64> {
        assert_eq!(
            scalar.public_key.n, self.public.n,
            "ciphertext was built against a different encryption context"
        );
        if scalar.ciphertext.is_zero() || scalar.ciphertext >= self.public.n_sq {
            return Err(Error::Decryption);
        }
        let raised = scalar.ciphertext.modpow(&self.lambda, &self.public.n_sq);
        if raised.is_zero() {
            return Err(Error::Decryption);
        }
        let diff = raised - BigUint::one();
        if (&diff % &self.public.n) != BigUint::zero() {
            return Err(Error::Decryption);
        }
        let mantissa = (diff / &self.public.n * &self.mu) % &self.public.n;
        EncodedNumber { mantissa, exponent: scalar.exponent }.decode(&self.public)
    }
}

/// A generated keypair plus the derived decryption constants
/// λ = lcm(p−1, q−1) and μ = λ⁻¹ mod n.
#[derive(Debug, Clone)]
pub struct PaillierKeyPair {
    public: PaillierPublicKey,
    private: PaillierPrivateKey,
}

impl PaillierKeyPair {
    pub fn public(&self) -> &PaillierPublicKey {
        &self.public
    }

    pub fn private(&self) -> &PaillierPrivateKey {
        &self.private
    }
}

/// Generate a keypair with an n of the given bit length.
pub fn generate_keypair(bits: u64) -> PaillierKeyPair {
    assert!(bits >= 64, "modulus below 64 bits cannot encode an f64 mantissa");
    let mut rng = thread_rng();
    let p = generate_prime(bits / 2, &mut rng);
    let q = loop {
        let q = generate_prime(bits / 2, &mut rng);
        if q != p {
            break q;
        }
    };
    let n = &p * &q;
    let lambda = (&p - BigUint::one()).lcm(&(&q - BigUint::one()));
    let public = PaillierPublicKey::new(n);
    let mu = modinv(&lambda, &public.n).expect("lambda is invertible modulo n");
    let private = PaillierPrivateKey { lambda, mu, public: public.clone() };
    PaillierKeyPair { public, private }
}

/// Fixed-point representation of a real number: mantissa mod n and a base-16
/// exponent, `value = mantissa · 16^exponent` with negative values mapped to
/// the top of the residue range.
#[derive(Debug, Clone)]
pub struct EncodedNumber {
    mantissa: BigUint,
    exponent: i64,
}

impl EncodedNumber {
    pub fn encode(key: &PaillierPublicKey, value: f64) -> Self {
        assert!(value.is_finite(), "cannot encode a non-finite value");
        let exponent = (float_bin_exponent(value) - F64_MANTISSA_BITS).div_euclid(LOG2_BASE);
        let int_rep = (value * (MANTISSA_BASE as f64).powi(-exponent as i32)).round() as i128;
        let magnitude = BigUint::from(int_rep.unsigned_abs());
        assert!(magnitude <= key.max_int, "value too large to encode under this modulus");
        let mantissa =
            if int_rep < 0 { &key.n - magnitude } else { magnitude };
        Self { mantissa, exponent }
    }

    pub fn decode(&self, key: &PaillierPublicKey) -> Result<f64> {
        let signed = if self.mantissa <= key.max_int {
            BigInt::from(self.mantissa.clone())
        } else if self.mantissa >= &key.n - &key.max_int {
            BigInt::from(self.mantissa.clone()) - BigInt::from(key.n.clone())
        } else {
            return Err(Error::Decryption);
        };
        let mantissa = signed.to_f64().ok_or(Error::Decryption)?;
        Ok(mantissa * (MANTISSA_BASE as f64).powi(self.exponent as i32))
    }

    pub fn mantissa(&self) -> &BigUint {
        &self.mantissa
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }
}

/// One ciphertext representing a single real number under a specific public
/// key. Arithmetic between scalars under different keys is a programming
/// error and panics; the protocol layer guards against it with fingerprint
/// validation before any ciphertext is built.
#[derive(Debug, Clone)]
pub struct EncryptedScalar {
    public_key: PaillierPublicKey,
    ciphertext: BigUint,
    exponent: i64,
}

impl EncryptedScalar {
    /// Rebuild a scalar from wire parts. The caller vouches that the parts
    /// were produced under `public_key`; decryption reports corruption.
    pub fn from_parts(public_key: PaillierPublicKey, ciphertext: BigUint, exponent: i64) -> Self {
        Self { public_key, ciphertext, exponent }
    }

    pub fn public_key(&self) -> &PaillierPublicKey {
        &self.public_key
    }

    pub fn ciphertext(&self) -> &BigUint {
        &self.ciphertext
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// Homomorphic addition of two encrypted scalars.
    pub fn add(&self, other: &EncryptedScalar) -> EncryptedScalar {
        assert_eq!(
            self.public_key.n, other.public_key.n,
            "cannot add scalars under different encryption contexts"
        );
        let exponent = self.exponent.min(other.exponent);
        let lhs = self.decrease_exponent_to(exponent);
        let rhs = other.decrease_exponent_to(exponent);
        let ciphertext = (&lhs.ciphertext * &rhs.ciphertext) % &self.public_key.n_sq;
        EncryptedScalar { public_key: self.public_key.clone(), ciphertext, exponent }
    }

    /// Homomorphic addition of a plaintext constant.
    pub fn add_plain(&self, value: f64) -> EncryptedScalar {
        let encoded = EncodedNumber::encode(&self.public_key, value);
        let exponent = self.exponent.min(encoded.exponent);
        let lhs = self.decrease_exponent_to(exponent);
        let mantissa = align_mantissa(&encoded, exponent, &self.public_key);
        let ciphertext =
            (&lhs.ciphertext * self.public_key.raw_encrypt(&mantissa)) % &self.public_key.n_sq;
        EncryptedScalar { public_key: self.public_key.clone(), ciphertext, exponent }
    }

    /// Homomorphic multiplication by a plaintext scalar: c^k mod n², with a
    /// modular inversion detour for negative scalars.
    pub fn mul_plain(&self, value: f64) -> EncryptedScalar {
        let encoded = EncodedNumber::encode(&self.public_key, value);
        let key = &self.public_key;
        let ciphertext = if encoded.mantissa > key.max_int {
            let inverted = modinv(&self.ciphertext, &key.n_sq)
                .expect("ciphertext is invertible modulo n^2");
            inverted.modpow(&(&key.n - &encoded.mantissa), &key.n_sq)
        } else {
            self.ciphertext.modpow(&encoded.mantissa, &key.n_sq)
        };
        EncryptedScalar {
            public_key: key.clone(),
            ciphertext,
            exponent: self.exponent + encoded.exponent,
        }
    }

    pub fn neg(&self) -> EncryptedScalar {
        self.mul_plain(-1.0)
    }

    /// Re-express the scalar at a smaller exponent by scaling the mantissa
    /// up, i.e. raising the ciphertext to a power of the base.
    fn decrease_exponent_to(&self, exponent: i64) -> EncryptedScalar {
        assert!(exponent <= self.exponent, "cannot raise an exponent");
        if exponent == self.exponent {
            return self.clone();
        }
        let factor = BigUint::from(MANTISSA_BASE).pow((self.exponent - exponent) as u32);
        let ciphertext = self.ciphertext.modpow(&factor, &self.public_key.n_sq);
        EncryptedScalar { public_key: self.public_key.clone(), ciphertext, exponent }
    }
}

fn align_mantissa(encoded: &EncodedNumber, exponent: i64, key: &PaillierPublicKey) -> BigUint {
    assert!(exponent <= encoded.exponent, "cannot raise an exponent");
    let factor = BigUint::from(MANTISSA_BASE).pow((encoded.exponent - exponent) as u32);
    (&encoded.mantissa * factor) % &key.n
}

/// Exponent the f64 `frexp` decomposition would report, so the fixed-point
/// exponent tracks the float's own precision.
fn float_bin_exponent(value: f64) -> i64 {
    if value == 0.0 {
        0
    } else {
        value.abs().log2().floor() as i64 + 1
    }
}

fn modinv(value: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    let value = BigInt::from(value.clone());
    let modulus = BigInt::from(modulus.clone());
    let extended = value.extended_gcd(&modulus);
    if !extended.gcd.is_one() {
        return None;
    }
    let mut inverse = extended.x % &modulus;
    if inverse.is_negative() {
        inverse += &modulus;
    }
    inverse.to_biguint()
}

fn generate_prime(bits: u64, rng: &mut impl Rng) -> BigUint {
    loop {
        let mut candidate = rng.gen_biguint(bits);
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(0, true);
        if is_probable_prime(&candidate, rng) {
            return candidate;
        }
    }
}

fn is_probable_prime(candidate: &BigUint, rng: &mut impl Rng) -> bool {
    for small in SMALL_PRIMES {
        let small = BigUint::from(small);
        if *candidate == small {
            return true;
        }
        if (candidate % &small).is_zero() {
            return false;
        }
    }
    let one = BigUint::one();
    let two = BigUint::from(2u32);
    let minus_one = candidate - &one;

    // candidate - 1 = d · 2^s with d odd
    let s = minus_one.trailing_zeros().unwrap_or(0);
    let d = &minus_one >> s;

    'witness: for _ in 0..PRIMALITY_ROUNDS {
        let base = rng.gen_biguint_range(&two, &minus_one);
        let mut x = base.modpow(&d, candidate);
        if x == one || x == minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, candidate);
            if x == minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keypair() -> PaillierKeyPair {
        generate_keypair(256)
    }

    #[test]
    fn encode_decode_round_trip_is_exact() {
        let keys = test_keypair();
        for value in [0.0, 1.0, -1.0, 0.5, -0.73502, 3.1415926535897931, 1e-9, -2.0] {
            let encoded = EncodedNumber::encode(keys.public(), value);
            assert_eq!(encoded.decode(keys.public()).unwrap(), value);
        }
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let keys = test_keypair();
        for value in [0.0, 0.80316, -0.16889, 1.0, -1.0] {
            let ct = keys.public().encrypt(value);
            assert_eq!(keys.private().decrypt(&ct).unwrap(), value);
        }
    }

    #[test]
    fn homomorphic_add_and_plaintext_ops() {
        let keys = test_keypair();
        let a = keys.public().encrypt(0.625);
        let b = keys.public().encrypt(-0.25);

        let sum = keys.private().decrypt(&a.add(&b)).unwrap();
        assert!((sum - 0.375).abs() < 1e-12);

        let shifted = keys.private().decrypt(&a.add_plain(1.0)).unwrap();
        assert!((shifted - 1.625).abs() < 1e-12);

        let scaled = keys.private().decrypt(&a.mul_plain(-3.5)).unwrap();
        assert!((scaled - (-2.1875)).abs() < 1e-12);

        let negated = keys.private().decrypt(&b.neg()).unwrap();
        assert!((negated - 0.25).abs() < 1e-12);
    }

    #[test]
    fn addition_aligns_mismatched_exponents() {
        let keys = test_keypair();
        // Scalar multiplication lowers the exponent of one operand.
        let a = keys.public().encrypt(0.5).mul_plain(0.001);
        let b = keys.public().encrypt(0.25);
        let sum = keys.private().decrypt(&a.add(&b)).unwrap();
        assert!((sum - 0.2505).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "different encryption contexts")]
    fn mixing_contexts_panics() {
        let first = test_keypair();
        let second = test_keypair();
        let a = first.public().encrypt(1.0);
        let b = second.public().encrypt(1.0);
        let _ = a.add(&b);
    }

    #[test]
    fn out_of_group_ciphertext_is_a_decryption_error() {
        let keys = test_keypair();
        let bogus = EncryptedScalar::from_parts(
            keys.public().clone(),
            keys.public().n_sq.clone() + BigUint::one(),
            0,
        );
        assert!(matches!(keys.private().decrypt(&bogus), Err(Error::Decryption)));
    }

    #[test]
    fn generated_primes_are_odd_and_sized() {
        let mut rng = thread_rng();
        let p = generate_prime(64, &mut rng);
        assert_eq!(p.bits(), 64);
        assert!(p.bit(0));
    }
}
