//! RSA key generation with strong primes and CRT precomputation.

use log::debug;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Pow};
use rand::Rng;

use crate::primes;
use crate::DEFAULT_CERTAINTY;

/// Default bit size of the prime draw; the 2x+1 transform adds one bit, so
/// the modulus comes out just above 1024 bits.
pub const RSA_PRIME_BITS: u64 = 512;

#[derive(Debug, Clone, Copy)]
pub struct RsaConfig {
    /// Bit size of the probable-prime draw before the 2x+1 transform.
    pub prime_bits: u64,
    /// Miller-Rabin rounds for every primality check.
    pub certainty: u32,
}

impl Default for RsaConfig {
    fn default() -> Self {
        RsaConfig {
            prime_bits: RSA_PRIME_BITS,
            certainty: DEFAULT_CERTAINTY,
        }
    }
}

/// Public half of an RSA key pair. Freely shareable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub(crate) n: BigUint,
    pub(crate) e: BigUint,
}

impl PublicKey {
    pub fn new(n: BigUint, e: BigUint) -> Self {
        PublicKey { n, e }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    pub fn exponent(&self) -> &BigUint {
        &self.e
    }
}

/// Private decryption material: the prime factors and the precomputed CRT
/// exponents dP = d mod (p-1), dQ = d mod (q-1), qInv = q^-1 mod p.
#[derive(Debug, Clone)]
pub struct PrivateKey {
    pub(crate) d: BigUint,
    pub(crate) p: BigUint,
    pub(crate) q: BigUint,
    pub(crate) d_p: BigUint,
    pub(crate) d_q: BigUint,
    pub(crate) q_inv: BigUint,
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

/// Draw a probable prime x, transform it to p = 2x+1, and retry the whole
/// draw until the transformed value is itself probably prime.
fn strong_prime<R: Rng>(bits: u64, certainty: u32, rng: &mut R) -> BigUint {
    loop {
        let x = primes::random_prime(bits, certainty, rng);
        let p = (&x << 1u32) + 1u8;
        if primes::is_probable_prime(&p, certainty, rng) {
            return p;
        }
    }
}

/// Generate a full key pair.
///
/// The public exponent is the smallest odd e >= 3 coprime to phi whose
/// private exponent satisfies d^4 > n, which rules out keys vulnerable to
/// low-private-exponent attacks.
pub fn generate_keypair<R: Rng>(config: &RsaConfig, rng: &mut R) -> KeyPair {
    let p = strong_prime(config.prime_bits, config.certainty, rng);
    let q = loop {
        let q = strong_prime(config.prime_bits, config.certainty, rng);
        if q != p {
            break q;
        }
    };
    debug!("generated strong primes of {} and {} bits", p.bits(), q.bits());

    let n = &p * &q;
    let phi = (&p - 1u8) * (&q - 1u8);

    let mut e = BigUint::from(3u8);
    let (e, d) = loop {
        if e.gcd(&phi).is_one() {
            if let Some(d) = primes::mod_inverse(&e, &phi) {
                if (&d).pow(4u32) > n {
                    break (e, d);
                }
            }
        }
        e += 2u8;
    };
    debug!("selected public exponent e = {}", e);

    let d_p = &d % (&p - 1u8);
    let d_q = &d % (&q - 1u8);
    let q_inv = primes::mod_inverse(&q, &p).expect("q is coprime to the distinct prime p");

    KeyPair {
        public: PublicKey { n, e },
        private: PrivateKey {
            d,
            p,
            q,
            d_p,
            d_q,
            q_inv,
        },
    }
}
