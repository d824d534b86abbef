use std::io;

use thiserror::Error;

/// Errors surfaced by the transfer protocol and the RSA toolkit.
///
/// Every cryptographic verification failure (AEAD failure, tag mismatch,
/// padding check) collapses into the single [`Error::Verification`] variant so
/// that a peer cannot distinguish which check rejected its input.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying byte stream failed or closed early.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The primitive-root search exhausted [1, p-2]. Parameter generation is
    /// broken; the process should terminate rather than retry.
    #[error("no generator found for the group modulus")]
    NoGenerator,

    /// Plaintext does not fit into a single OAEP block.
    #[error("message of {len} bytes exceeds the {max}-byte block capacity")]
    MessageTooLong { len: usize, max: usize },

    /// Ciphertext value is not strictly less than the RSA modulus.
    #[error("ciphertext out of range for the modulus")]
    CiphertextOutOfRange,

    /// The modulus is too small to hold one OAEP block.
    #[error("modulus too short for an OAEP block")]
    ModulusTooShort,

    /// Decryption was requested on a key without private material.
    #[error("key holds no decryption material")]
    NoPrivateKey,

    /// A cryptographic verification check rejected the input.
    #[error("verification failed")]
    Verification,

    /// The peer sent data that does not fit the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, Error>;
