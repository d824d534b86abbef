//! Ephemeral Diffie-Hellman key agreement and session key derivation.
//!
//! The responder sends the group parameters, both sides exchange public
//! values, and each derives the same 16-byte session key from the shared
//! secret. Nothing authenticates the exchanged public values, so an active
//! man-in-the-middle can sit between the endpoints; that is an accepted
//! limitation of this protocol, not something patched here.

use log::debug;
use num_bigint::{BigUint, RandBigInt};
use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::group::GroupParameters;
use crate::wire::WireCodec;
use crate::KEY_LEN;

/// Symmetric key derived from the DH shared secret.
///
/// The exponents and the shared secret never leave the handshake functions;
/// only this value escapes, one per session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey([u8; KEY_LEN]);

impl SessionKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // keep key material out of logs
        f.write_str("SessionKey(..)")
    }
}

/// First 16 bytes of SHA-256 over the shared secret's big-endian bytes.
pub fn derive_session_key(shared_secret: &BigUint) -> SessionKey {
    let digest = Sha256::digest(shared_secret.to_bytes_be());
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&digest[..KEY_LEN]);
    SessionKey(key)
}

/// Secret exponent drawn uniformly from [0, 2^bits) where bits = |p - 2|.
fn random_exponent<R: Rng>(p: &BigUint, rng: &mut R) -> BigUint {
    let bits = (p - 2u8).bits();
    rng.gen_biguint(bits)
}

/// Responder side: publish the group, exchange public values, derive the key.
///
/// Wire order: send p, send g, receive g^a, send g^b.
pub async fn respond<S, R>(
    codec: &mut WireCodec<S>,
    params: &GroupParameters,
    rng: &mut R,
) -> Result<SessionKey>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: Rng,
{
    debug!("sending group parameters");
    codec.send(&params.p.to_bytes_be()).await?;
    codec.send(&params.g.to_bytes_be()).await?;

    let b = random_exponent(&params.p, rng);
    let gb = params.g.modpow(&b, &params.p);

    let ga = BigUint::from_bytes_be(&codec.receive().await?);
    debug!("received initiator public value");
    codec.send(&gb.to_bytes_be()).await?;

    let shared = ga.modpow(&b, &params.p);
    Ok(derive_session_key(&shared))
}

/// Initiator side: receive the group, exchange public values, derive the key.
pub async fn initiate<S, R>(codec: &mut WireCodec<S>, rng: &mut R) -> Result<SessionKey>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: Rng,
{
    let p = BigUint::from_bytes_be(&codec.receive().await?);
    let g = BigUint::from_bytes_be(&codec.receive().await?);
    debug!("received group parameters, p has {} bits", p.bits());

    let a = random_exponent(&p, rng);
    let ga = g.modpow(&a, &p);

    codec.send(&ga.to_bytes_be()).await?;
    let gb = BigUint::from_bytes_be(&codec.receive().await?);
    debug!("received responder public value");

    let shared = gb.modpow(&a, &p);
    Ok(derive_session_key(&shared))
}
