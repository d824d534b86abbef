// Integration tests for the sealink transfer protocol and RSA toolkit.
// These exercise the full handshake-then-transfer sequence end to end over
// in-memory duplex streams, plus the RSA surface at realistic sizes.

use std::collections::HashMap;

use rand::rngs::OsRng;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

use sealink::error::Error;
use sealink::group::{self, GroupConfig};
use sealink::handshake;
use sealink::rsa::{Rsa, RsaConfig, K0, K1};
use sealink::transfer::{self, TransferOutcome};
use sealink::wire::WireCodec;

fn test_group_config() -> GroupConfig {
    GroupConfig {
        prime_bits: 64,
        certainty: 20,
    }
}

// ============================================================================
// End-to-End Transfer Tests
// ============================================================================

#[tokio::test]
async fn test_handshake_then_transfer_end_to_end() {
    let (client_stream, server_stream) = tokio::io::duplex(256 * 1024);

    // 10 KB of structured data so corruption cannot hide
    let contents: Vec<u8> = (0..10 * 1024u32).map(|i| (i * 31 % 256) as u8).collect();
    let expected = contents.clone();

    let server = tokio::spawn(async move {
        let params = group::generate(&test_group_config(), &mut OsRng).unwrap();
        let mut codec = WireCodec::new(server_stream);
        let key = handshake::respond(&mut codec, &params, &mut OsRng)
            .await
            .unwrap();

        let mut files: HashMap<String, Vec<u8>> = HashMap::new();
        let outcome = transfer::receive_file(&mut codec, &key, |name, bytes| {
            files.insert(name.to_string(), bytes.to_vec());
            Ok(())
        })
        .await
        .unwrap();
        (outcome, files)
    });

    let client = tokio::spawn(async move {
        let mut codec = WireCodec::new(client_stream);
        let key = handshake::initiate(&mut codec, &mut OsRng).await.unwrap();
        transfer::send_file(&mut codec, &key, "received.bin", &contents)
            .await
            .unwrap()
    });

    let sender_outcome = client.await.unwrap();
    let (receiver_outcome, files) = server.await.unwrap();

    assert_eq!(sender_outcome, TransferOutcome::Passed);
    assert_eq!(receiver_outcome, TransferOutcome::Passed);
    assert_eq!(files.get("received.bin"), Some(&expected));
}

/// Frame-aware forwarder for one direction of the intermediary. Reads length
/// prefix + payload, optionally corrupts one frame, re-frames and forwards.
async fn forward_frames(
    mut from: ReadHalf<DuplexStream>,
    mut to: WriteHalf<DuplexStream>,
    flip_in_frame: Option<usize>,
) {
    let mut index = 0usize;
    loop {
        let len = match from.read_u32().await {
            Ok(len) => len,
            Err(_) => break,
        };
        let mut payload = vec![0u8; len as usize];
        if from.read_exact(&mut payload).await.is_err() {
            break;
        }

        if Some(index) == flip_in_frame {
            let middle = payload.len() / 2;
            payload[middle] ^= 0x01;
        }
        index += 1;

        if to.write_u32(payload.len() as u32).await.is_err() {
            break;
        }
        if to.write_all(&payload).await.is_err() {
            break;
        }
        let _ = to.flush().await;
    }
}

#[tokio::test]
async fn test_intermediary_byte_flip_is_detected() {
    let (client_stream, mitm_client_side) = tokio::io::duplex(256 * 1024);
    let (mitm_server_side, server_stream) = tokio::io::duplex(256 * 1024);

    let (mitm_client_read, mitm_client_write) = tokio::io::split(mitm_client_side);
    let (mitm_server_read, mitm_server_write) = tokio::io::split(mitm_server_side);

    // client->server frames: g^a (0), filename (1), size (2), payload (3)
    tokio::spawn(forward_frames(mitm_client_read, mitm_server_write, Some(3)));
    // server->client frames pass through untouched
    tokio::spawn(forward_frames(mitm_server_read, mitm_client_write, None));

    let contents: Vec<u8> = (0..4096u32).map(|i| (i % 255) as u8).collect();

    let server = tokio::spawn(async move {
        let params = group::generate(&test_group_config(), &mut OsRng).unwrap();
        let mut codec = WireCodec::new(server_stream);
        let key = handshake::respond(&mut codec, &params, &mut OsRng)
            .await
            .unwrap();

        let mut wrote = false;
        let outcome = transfer::receive_file(&mut codec, &key, |_, _| {
            wrote = true;
            Ok(())
        })
        .await
        .unwrap();
        (outcome, wrote)
    });

    let client = tokio::spawn(async move {
        let mut codec = WireCodec::new(client_stream);
        let key = handshake::initiate(&mut codec, &mut OsRng).await.unwrap();
        transfer::send_file(&mut codec, &key, "tampered.bin", &contents)
            .await
            .unwrap()
    });

    let sender_outcome = client.await.unwrap();
    let (receiver_outcome, wrote) = server.await.unwrap();

    assert_eq!(sender_outcome, TransferOutcome::Failed);
    assert_eq!(receiver_outcome, TransferOutcome::Failed);
    assert!(!wrote, "receiver must not write a tampered file");
}

#[tokio::test]
async fn test_concurrent_sessions_are_independent() {
    // two sessions with independent keys running at the same time
    let mut handles = Vec::new();
    for session in 0..2u8 {
        handles.push(tokio::spawn(async move {
            let (client_stream, server_stream) = tokio::io::duplex(64 * 1024);
            let contents = vec![session; 2048];
            let expected = contents.clone();

            let server = tokio::spawn(async move {
                let params = group::generate(&test_group_config(), &mut OsRng).unwrap();
                let mut codec = WireCodec::new(server_stream);
                let key = handshake::respond(&mut codec, &params, &mut OsRng)
                    .await
                    .unwrap();
                let mut files = HashMap::new();
                let outcome = transfer::receive_file(&mut codec, &key, |name, bytes| {
                    files.insert(name.to_string(), bytes.to_vec());
                    Ok(())
                })
                .await
                .unwrap();
                (outcome, files)
            });

            let mut codec = WireCodec::new(client_stream);
            let key = handshake::initiate(&mut codec, &mut OsRng).await.unwrap();
            let name = format!("session_{}.bin", session);
            let outcome = transfer::send_file(&mut codec, &key, &name, &contents)
                .await
                .unwrap();

            let (receiver_outcome, files) = server.await.unwrap();
            assert_eq!(outcome, TransferOutcome::Passed);
            assert_eq!(receiver_outcome, TransferOutcome::Passed);
            assert_eq!(files.get(&name), Some(&expected));
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}

// ============================================================================
// RSA Surface Tests
// ============================================================================

fn fast_rsa_config() -> RsaConfig {
    // 257-bit strong primes: 64-byte block, 32-byte messages
    RsaConfig {
        prime_bits: 256,
        certainty: 10,
    }
}

#[test]
fn test_rsa_roundtrip_and_probabilistic_encryption() {
    let rsa = Rsa::generate(&fast_rsa_config(), &mut OsRng).unwrap();

    let message = vec![0xC3u8; rsa.max_message_len()];
    let first = rsa.encrypt(&message, &mut OsRng).unwrap();
    let second = rsa.encrypt(&message, &mut OsRng).unwrap();

    assert_ne!(first, second);
    assert_eq!(rsa.decrypt(&first).unwrap(), message);
    assert_eq!(rsa.decrypt(&second).unwrap(), message);
}

#[test]
fn test_rsa_public_only_interop() {
    let holder = Rsa::generate(&fast_rsa_config(), &mut OsRng).unwrap();
    let encryptor = Rsa::from_public(holder.n().clone(), holder.e().clone()).unwrap();

    let message = vec![0x11u8; encryptor.max_message_len()];
    let ciphertext = encryptor.encrypt(&message, &mut OsRng).unwrap();

    assert_eq!(holder.decrypt(&ciphertext).unwrap(), message);
    assert!(matches!(
        encryptor.decrypt(&ciphertext),
        Err(Error::NoPrivateKey)
    ));
}

#[test]
fn test_rsa_length_validation_before_any_work() {
    // a modulus of the default production size, without running key
    // generation: 2^1025 + 1 has 1026 bits, so the block is 128 bytes
    use num_bigint::BigUint;
    use num_traits::One;

    let n = (BigUint::one() << 1025u32) + 1u8;
    let rsa = Rsa::from_public(n, BigUint::from(3u8)).unwrap();

    assert_eq!(rsa.max_message_len(), 128 - K0 - K1);
    match rsa.encrypt(&vec![0u8; 97], &mut OsRng) {
        Err(Error::MessageTooLong { len: 97, max: 96 }) => {}
        other => panic!("expected length rejection, got {:?}", other.map(|v| v.len())),
    }
}

// Full production-size key generation: two 513-bit safe primes. Expensive,
// so opt in with `cargo test -- --ignored`.
#[test]
#[ignore]
fn test_rsa_default_size_scenario() {
    let rsa = Rsa::generate(&RsaConfig::default(), &mut OsRng).unwrap();

    assert_eq!(rsa.max_message_len(), 96);

    let message = vec![0u8; 96];
    let ciphertext = rsa.encrypt(&message, &mut OsRng).unwrap();
    assert_eq!(rsa.decrypt(&ciphertext).unwrap(), message);

    assert!(matches!(
        rsa.encrypt(&vec![0u8; 97], &mut OsRng),
        Err(Error::MessageTooLong { .. })
    ));
}
