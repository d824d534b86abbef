pub mod channel;
pub mod commands;
pub mod error;
pub mod group;
pub mod handshake;
pub mod primes;
pub mod rsa;
pub mod transfer;
pub mod wire;

/// Symmetric session key length in bytes (AES-128).
pub const KEY_LEN: usize = 16;
/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// HMAC-SHA256 tag length in bytes.
pub const TAG_LEN: usize = 32;

/// Default bit size of the prime q used to build the DH modulus p = 2q+1.
pub const DH_PRIME_BITS: u64 = 512;
/// Default Miller-Rabin round count for primality testing.
pub const DEFAULT_CERTAINTY: u32 = 40;
