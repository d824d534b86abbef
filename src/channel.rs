//! Authenticated encryption layer over the wire codec.
//!
//! Frames carry HMAC-SHA256(message) appended to the message, the pair
//! encrypted under AES-128-GCM with a fresh random nonce prepended to the
//! ciphertext. The receiver decrypts, splits off the tag, and releases the
//! message only when the tag verifies. Every failure mode (malformed frame,
//! AEAD rejection, tag mismatch) surfaces as the same indistinguishable
//! verification error.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Nonce,
};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Error, Result};
use crate::handshake::SessionKey;
use crate::wire::WireCodec;
use crate::{NONCE_LEN, TAG_LEN};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 tag over `message` under the session key.
pub fn compute_tag(key: &SessionKey, message: &[u8]) -> [u8; TAG_LEN] {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Constant-time verification of an HMAC-SHA256 tag.
pub fn verify_tag(key: &SessionKey, message: &[u8], tag: &[u8]) -> bool {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message);
    mac.verify_slice(tag).is_ok()
}

/// Build one sealed frame: nonce || AES-GCM(message || tag).
pub fn seal(key: &SessionKey, message: &[u8]) -> Result<Vec<u8>> {
    let tag = compute_tag(key, message);

    let mut plaintext = Vec::with_capacity(message.len() + TAG_LEN);
    plaintext.extend_from_slice(message);
    plaintext.extend_from_slice(&tag);

    let cipher = Aes128Gcm::new(key.as_bytes().into());
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_slice())
        .map_err(|_| Error::Verification)?;

    let mut frame = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    frame.extend_from_slice(&nonce_bytes);
    frame.extend_from_slice(&ciphertext);
    Ok(frame)
}

/// Open one sealed frame, returning the message only if every check passes.
pub fn open(key: &SessionKey, frame: &[u8]) -> Result<Vec<u8>> {
    if frame.len() < NONCE_LEN {
        return Err(Error::Verification);
    }
    let (nonce_bytes, ciphertext) = frame.split_at(NONCE_LEN);

    let cipher = Aes128Gcm::new(key.as_bytes().into());
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| Error::Verification)?;

    if plaintext.len() < TAG_LEN {
        return Err(Error::Verification);
    }
    let (message, tag) = plaintext.split_at(plaintext.len() - TAG_LEN);

    if !verify_tag(key, message, tag) {
        return Err(Error::Verification);
    }

    Ok(message.to_vec())
}

/// Seal `message` and write it as one frame.
pub async fn encrypt_and_send<S>(
    codec: &mut WireCodec<S>,
    key: &SessionKey,
    message: &[u8],
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = seal(key, message)?;
    codec.send(&frame).await
}

/// Read one frame and open it.
pub async fn receive_and_decrypt<S>(codec: &mut WireCodec<S>, key: &SessionKey) -> Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = codec.receive().await?;
    open(key, &frame)
}
