//! OAEP encoding with hash-chained mask generation.
//!
//! The block layout for a K-byte modulus is
//!   s = (message || zero padding to K-K0 bytes) XOR G(r)
//!   t = r XOR H(s)
//! where r is a fresh K0-byte random seed and s||t is the K-byte integer that
//! gets exponentiated.
//!
//! G chains digests: each iteration hashes the previous digest (the seed on
//! the first), concatenating output until K-K0 bytes exist, truncating the
//! last chunk. This is deliberately a hash chain, not the counter-mode MGF1
//! of PKCS#1, and is reproduced exactly for compatibility with the scheme it
//! implements.

use num_bigint::BigUint;
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

use super::crt;
use super::keygen::{PrivateKey, PublicKey};

/// Random seed size in bytes.
pub const K0: usize = 16;
/// Zero-padding size in bytes.
pub const K1: usize = 16;

/// Number of whole bytes that always fit below the modulus: the largest k
/// with 2^(8k) <= n.
pub(crate) fn block_len(n: &BigUint) -> usize {
    ((n.bits() - 1) / 8) as usize
}

/// Mask generator G: K-K0 bytes of chained digests of the seed.
fn mask_g(seed: &[u8], out_len: usize) -> Vec<u8> {
    let mut output = Vec::with_capacity(out_len);
    let mut input = seed.to_vec();

    while output.len() < out_len {
        let digest = Sha256::digest(&input);
        let take = (out_len - output.len()).min(digest.len());
        output.extend_from_slice(&digest[..take]);
        input = digest.to_vec();
    }

    output
}

/// Mask generator H: first K0 bytes of one digest.
fn mask_h(data: &[u8]) -> [u8; K0] {
    let digest = Sha256::digest(data);
    let mut out = [0u8; K0];
    out.copy_from_slice(&digest[..K0]);
    out
}

/// OAEP-encode `message` and encrypt it under the public key.
///
/// Rejects messages longer than K-K0-K1 bytes before drawing any randomness
/// or touching the modulus. Seeds that produce a block value >= n are
/// discarded and redrawn.
pub fn encode<R: Rng>(public: &PublicKey, message: &[u8], rng: &mut R) -> Result<Vec<u8>> {
    let k = block_len(&public.n);
    let max_len = k - K0 - K1;
    if message.len() > max_len {
        return Err(Error::MessageTooLong {
            len: message.len(),
            max: max_len,
        });
    }

    let c = loop {
        let mut r = [0u8; K0];
        rng.fill_bytes(&mut r);

        let mut s = vec![0u8; k - K0];
        s[..message.len()].copy_from_slice(message);
        for (byte, mask) in s.iter_mut().zip(mask_g(&r, k - K0)) {
            *byte ^= mask;
        }

        let h_s = mask_h(&s);
        let mut block = s;
        for (seed_byte, mask) in r.iter().zip(h_s) {
            block.push(seed_byte ^ mask);
        }

        let c = BigUint::from_bytes_be(&block);
        if c < public.n {
            break c;
        }
    };

    Ok(c.modpow(&public.e, &public.n).to_bytes_be())
}

/// Decrypt `ciphertext` and strip the OAEP encoding.
///
/// Returns the full K-K0-K1 byte message region; the block does not record
/// the original message length, so a shorter message comes back with its
/// zero padding attached.
pub fn decode(public: &PublicKey, private: &PrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let k = block_len(&public.n);

    let c = BigUint::from_bytes_be(ciphertext);
    if c >= public.n {
        return Err(Error::CiphertextOutOfRange);
    }

    let recovered = crt::crt_decrypt(&c, private).to_bytes_be();
    // big-endian conversion drops leading zero bytes; restore them so the
    // s/t split lands on the right boundary
    if recovered.len() > k {
        return Err(Error::Verification);
    }
    let mut block = vec![0u8; k - recovered.len()];
    block.extend_from_slice(&recovered);

    let (s, t) = block.split_at(k - K0);

    let h_s = mask_h(s);
    let u: Vec<u8> = t.iter().zip(h_s).map(|(byte, mask)| byte ^ mask).collect();

    let g_u = mask_g(&u, k - K0);
    let v: Vec<u8> = s.iter().zip(g_u).map(|(byte, mask)| byte ^ mask).collect();

    if v[k - K0 - K1..].iter().any(|&byte| byte != 0) {
        return Err(Error::Verification);
    }

    Ok(v[..k - K0 - K1].to_vec())
}
