//! Chinese-remainder decryption.
//!
//! Computes C^d mod n as two half-size exponentiations:
//!   m1 = C^dP mod p, m2 = C^dQ mod q,
//!   h = qInv * (m1 - m2) mod p, M = m2 + h * q.

use num_bigint::BigUint;

use super::keygen::PrivateKey;

/// Recover M = C^d mod n from the CRT residues.
///
/// The caller guarantees C < n and that the private material is present; the
/// public surface in `rsa` enforces both before reaching this point.
pub fn crt_decrypt(c: &BigUint, key: &PrivateKey) -> BigUint {
    let m1 = c.modpow(&key.d_p, &key.p);
    let m2 = c.modpow(&key.d_q, &key.q);

    // m1 - m2 mod p without underflow: m2 is reduced mod p first, and p is
    // added before subtracting
    let h = (&key.q_inv * (&m1 + &key.p - (&m2 % &key.p))) % &key.p;

    m2 + h * &key.q
}
