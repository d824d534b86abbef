//! Diffie-Hellman group parameter generation.
//!
//! The modulus is a safe prime p = 2q+1 with q prime, which keeps the
//! multiplicative group free of small subgroups beyond {1, p-1}. The generator
//! search walks g = 1, 2, 3, ... and accepts the first g whose order is not 1,
//! i.e. g^q mod p != 1. For a safe prime this leaves order q or 2q; the check
//! does not distinguish the two, so g is not guaranteed to generate the full
//! group. That matches the reference construction and is an accepted
//! limitation of this scheme.

use log::debug;
use num_bigint::BigUint;
use num_traits::One;
use rand::Rng;

use crate::error::{Error, Result};
use crate::primes;
use crate::{DEFAULT_CERTAINTY, DH_PRIME_BITS};

/// Public parameters of the DH group: safe-prime modulus and generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupParameters {
    pub p: BigUint,
    pub g: BigUint,
}

/// Knobs for parameter generation.
#[derive(Debug, Clone, Copy)]
pub struct GroupConfig {
    /// Bit size of the prime q; the modulus p = 2q+1 has one bit more.
    pub prime_bits: u64,
    /// Miller-Rabin rounds for every primality check.
    pub certainty: u32,
}

impl Default for GroupConfig {
    fn default() -> Self {
        GroupConfig {
            prime_bits: DH_PRIME_BITS,
            certainty: DEFAULT_CERTAINTY,
        }
    }
}

/// Generate a fresh safe-prime group and a generator for it.
///
/// Returns [`Error::NoGenerator`] if the generator search exhausts [1, p-2],
/// which indicates broken parameter generation and must terminate the session
/// rather than retry.
pub fn generate<R: Rng>(config: &GroupConfig, rng: &mut R) -> Result<GroupParameters> {
    let (p, q) = loop {
        let q = primes::random_prime(config.prime_bits, config.certainty, rng);
        let p = (&q << 1u32) + 1u8;
        if primes::is_probable_prime(&p, config.certainty, rng) {
            break (p, q);
        }
    };
    debug!("generated safe prime p with {} bits", p.bits());

    let g = find_generator(&p, &q)?;
    debug!("found generator g = {}", g);

    Ok(GroupParameters { p, g })
}

/// Smallest g in [1, p-2] with g^q mod p != 1.
fn find_generator(p: &BigUint, q: &BigUint) -> Result<BigUint> {
    let one = BigUint::one();
    let limit = p - 2u8;

    let mut g = BigUint::one();
    while g <= limit {
        if g.modpow(q, p) != one {
            return Ok(g);
        }
        g += 1u8;
    }

    Err(Error::NoGenerator)
}
