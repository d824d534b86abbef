//! From-scratch RSA-OAEP with CRT-accelerated decryption.
//!
//! Key generation, the OAEP mask functions, and the CRT math are all
//! implemented here on top of plain `num-bigint` arithmetic. The library has
//! no network or file surface; it exposes construction, `encrypt`, `decrypt`,
//! and the public-key accessors.

mod crt;
mod keygen;
mod oaep;

pub use keygen::{generate_keypair, KeyPair, PrivateKey, PublicKey, RsaConfig, RSA_PRIME_BITS};
pub use oaep::{K0, K1};

use num_bigint::BigUint;
use rand::Rng;

use crate::error::{Error, Result};

/// An RSA-OAEP instance, either decrypt-capable (generated key pair) or
/// encrypt-only (supplied public key).
pub struct Rsa {
    public: PublicKey,
    private: Option<PrivateKey>,
}

impl Rsa {
    /// Generate a fresh key pair; the instance can both encrypt and decrypt.
    pub fn generate<R: Rng>(config: &RsaConfig, rng: &mut R) -> Result<Self> {
        let pair = generate_keypair(config, rng);
        Self::check_modulus(&pair.public)?;
        Ok(Rsa {
            public: pair.public,
            private: Some(pair.private),
        })
    }

    /// Wrap a supplied public key; the instance can only encrypt.
    pub fn from_public(n: BigUint, e: BigUint) -> Result<Self> {
        let public = PublicKey::new(n, e);
        Self::check_modulus(&public)?;
        Ok(Rsa {
            public,
            private: None,
        })
    }

    fn check_modulus(public: &PublicKey) -> Result<()> {
        let bits = public.modulus().bits();
        if bits == 0 || ((bits - 1) / 8) as usize <= K0 + K1 {
            return Err(Error::ModulusTooShort);
        }
        Ok(())
    }

    pub fn n(&self) -> &BigUint {
        self.public.modulus()
    }

    pub fn e(&self) -> &BigUint {
        self.public.exponent()
    }

    /// Largest message that fits into one OAEP block.
    pub fn max_message_len(&self) -> usize {
        oaep::block_len(self.n()) - K0 - K1
    }

    /// OAEP-encode and encrypt one block.
    pub fn encrypt<R: Rng>(&self, plaintext: &[u8], rng: &mut R) -> Result<Vec<u8>> {
        oaep::encode(&self.public, plaintext, rng)
    }

    /// Decrypt one block and strip the OAEP encoding.
    ///
    /// Fails with [`Error::NoPrivateKey`] on an encrypt-only instance; that is
    /// a caller bug, distinct from any input validation failure.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let private = self.private.as_ref().ok_or(Error::NoPrivateKey)?;
        oaep::decode(&self.public, private, ciphertext)
    }
}
