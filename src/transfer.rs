//! Encrypted file transfer protocol.
//!
//! Sender sequence: encrypted destination filename, encrypted decimal size
//! string, encrypted (file bytes || integrity tag), then one encrypted ack
//! frame from the receiver. The ack is the literal string "Passed" on
//! success; anything else counts as failure.
//!
//! The receiver runs an explicit state machine and always terminates in
//! `Closed`, whether or not the transfer succeeded. A tampered frame routes
//! to the "Failed" ack path; a transport error aborts the session with no
//! ack. There is no retry or resume: a failed transfer restarts from the
//! beginning of a fresh session.

use std::io;

use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::channel;
use crate::error::{Error, Result};
use crate::handshake::SessionKey;
use crate::wire::WireCodec;
use crate::TAG_LEN;

pub const ACK_PASSED: &str = "Passed";
pub const ACK_FAILED: &str = "Failed";

/// Final result of one transfer, as observed by either endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Passed,
    Failed,
}

/// Receiver protocol states. Frame data travels inside the variants so a
/// session cannot observe a later state without the earlier ones.
enum ReceiverState {
    AwaitFilename,
    AwaitSize {
        filename: String,
    },
    AwaitPayload {
        filename: String,
        size: u64,
    },
    Verify {
        filename: String,
        size: u64,
        payload: Vec<u8>,
    },
    WriteAndAckPassed {
        filename: String,
        body: Vec<u8>,
    },
    AckFailed,
    Closed,
}

/// One received frame, or the marker that its verification failed.
enum Frame {
    Intact(Vec<u8>),
    Tampered,
}

async fn next_frame<S>(codec: &mut WireCodec<S>, key: &SessionKey) -> Result<Frame>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match channel::receive_and_decrypt(codec, key).await {
        Ok(bytes) => Ok(Frame::Intact(bytes)),
        Err(Error::Verification) => Ok(Frame::Tampered),
        Err(e) => Err(e),
    }
}

/// Send `contents` to the peer under `dest_name` and wait for its verdict.
pub async fn send_file<S>(
    codec: &mut WireCodec<S>,
    key: &SessionKey,
    dest_name: &str,
    contents: &[u8],
) -> Result<TransferOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    debug!("sending destination file name = {}", dest_name);
    channel::encrypt_and_send(codec, key, dest_name.as_bytes()).await?;

    debug!("sending file size = {}", contents.len());
    channel::encrypt_and_send(codec, key, contents.len().to_string().as_bytes()).await?;

    debug!("sending file with integrity tag appended");
    let tag = channel::compute_tag(key, contents);
    let mut payload = Vec::with_capacity(contents.len() + TAG_LEN);
    payload.extend_from_slice(contents);
    payload.extend_from_slice(&tag);
    channel::encrypt_and_send(codec, key, &payload).await?;

    debug!("waiting for receiver acknowledgement");
    let ack = channel::receive_and_decrypt(codec, key).await?;
    if ack == ACK_PASSED.as_bytes() {
        Ok(TransferOutcome::Passed)
    } else {
        Ok(TransferOutcome::Failed)
    }
}

/// Run the receiver state machine for one transfer.
///
/// `store` is called exactly once, and only after the payload tag verified;
/// a store failure is treated like a transport error and aborts the session.
pub async fn receive_file<S, F>(
    codec: &mut WireCodec<S>,
    key: &SessionKey,
    mut store: F,
) -> Result<TransferOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FnMut(&str, &[u8]) -> io::Result<()>,
{
    let mut state = ReceiverState::AwaitFilename;
    let mut outcome = TransferOutcome::Failed;

    loop {
        state = match state {
            ReceiverState::AwaitFilename => match next_frame(codec, key).await? {
                Frame::Intact(bytes) => {
                    let filename = String::from_utf8(bytes)
                        .map_err(|_| Error::Protocol("filename is not valid UTF-8".into()))?;
                    info!("output file: {}", filename);
                    ReceiverState::AwaitSize { filename }
                }
                Frame::Tampered => ReceiverState::AckFailed,
            },

            ReceiverState::AwaitSize { filename } => match next_frame(codec, key).await? {
                Frame::Intact(bytes) => {
                    let size = String::from_utf8(bytes)
                        .ok()
                        .and_then(|s| s.parse::<u64>().ok())
                        .ok_or_else(|| {
                            Error::Protocol("file size is not a decimal string".into())
                        })?;
                    info!("file size = {}", size);
                    ReceiverState::AwaitPayload { filename, size }
                }
                Frame::Tampered => ReceiverState::AckFailed,
            },

            ReceiverState::AwaitPayload { filename, size } => {
                match next_frame(codec, key).await? {
                    Frame::Intact(payload) => ReceiverState::Verify {
                        filename,
                        size,
                        payload,
                    },
                    Frame::Tampered => ReceiverState::AckFailed,
                }
            }

            ReceiverState::Verify {
                filename,
                size,
                payload,
            } => {
                if payload.len() < TAG_LEN {
                    ReceiverState::AckFailed
                } else {
                    let (body, tag) = payload.split_at(payload.len() - TAG_LEN);
                    if body.len() as u64 != size {
                        // announced size is informational only; verdict
                        // comes from the tag
                        warn!(
                            "announced size {} does not match payload of {} bytes",
                            size,
                            body.len()
                        );
                    }
                    if channel::verify_tag(key, body, tag) {
                        ReceiverState::WriteAndAckPassed {
                            filename,
                            body: body.to_vec(),
                        }
                    } else {
                        ReceiverState::AckFailed
                    }
                }
            }

            ReceiverState::WriteAndAckPassed { filename, body } => {
                store(&filename, &body)?;
                debug!("file verified and written, sending ack");
                channel::encrypt_and_send(codec, key, ACK_PASSED.as_bytes()).await?;
                outcome = TransferOutcome::Passed;
                ReceiverState::Closed
            }

            ReceiverState::AckFailed => {
                debug!("verification failed, sending negative ack");
                channel::encrypt_and_send(codec, key, ACK_FAILED.as_bytes()).await?;
                outcome = TransferOutcome::Failed;
                ReceiverState::Closed
            }

            ReceiverState::Closed => break,
        };
    }

    Ok(outcome)
}
