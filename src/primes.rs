//! Probabilistic primality testing and modular arithmetic helpers.
//!
//! Everything here is built directly on `num-bigint` arithmetic: Miller-Rabin,
//! random prime generation, the extended Euclidean algorithm, and modular
//! inverses. The DH group generator and the RSA key generator both sit on top
//! of this module.

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::Rng;

/// Miller-Rabin primality test with `rounds` random witnesses.
///
/// Returns true if `n` is probably prime. The error probability is at most
/// 4^-rounds for an odd composite `n`.
pub fn is_probable_prime<R: Rng>(n: &BigUint, rounds: u32, rng: &mut R) -> bool {
    let two = BigUint::from(2u8);
    if n < &two {
        return false;
    }
    if *n == two || *n == BigUint::from(3u8) {
        return true;
    }
    if n.is_even() {
        return false;
    }

    // Write n-1 as d * 2^s with d odd
    let n_minus_one = n - 1u8;
    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    let n_minus_two = n - &two;

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_two);
        let mut x = a.modpow(&d, n);

        if x.is_one() || x == n_minus_one {
            continue;
        }

        for _ in 1..s {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }

        return false;
    }

    true
}

/// Generate a random probable prime with exactly `bits` bits.
///
/// Candidates are drawn uniformly from [2^(bits-1), 2^bits), forced odd, and
/// retested until one passes Miller-Rabin at the requested round count.
pub fn random_prime<R: Rng>(bits: u64, rounds: u32, rng: &mut R) -> BigUint {
    assert!(bits >= 2, "a prime needs at least 2 bits");

    let lower = BigUint::one() << (bits - 1);
    let upper = BigUint::one() << bits;

    loop {
        let mut candidate = rng.gen_biguint_range(&lower, &upper);
        if candidate.is_even() {
            candidate += 1u8;
        }
        if is_probable_prime(&candidate, rounds, rng) {
            return candidate;
        }
    }
}

/// Extended Euclidean algorithm.
///
/// Returns (g, x, y) with a*x + b*y = g = gcd(a, b).
fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let quotient = &old_r / &r;

        let next_r = &old_r - &quotient * &r;
        old_r = r;
        r = next_r;

        let next_s = &old_s - &quotient * &s;
        old_s = s;
        s = next_s;

        let next_t = &old_t - &quotient * &t;
        old_t = t;
        t = next_t;
    }

    (old_r, old_s, old_t)
}

/// Modular inverse a^-1 mod m, or None when gcd(a, m) != 1.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    let a = BigInt::from(a.clone());
    let m = BigInt::from(m.clone());

    let (g, x, _) = extended_gcd(&a, &m);
    if !g.is_one() {
        return None;
    }

    let inv = x.mod_floor(&m);
    inv.to_biguint()
}
