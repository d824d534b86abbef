//! # Commands Module
//!
//! Command handlers for the two roles of the transfer tool:
//!
//! ## `send`
//! The client/sender side:
//! - Connects to the receiver over TCP
//! - Runs the DH handshake as initiator and derives the session key
//! - Prompts the operator for the source and destination filenames
//! - Sends the file through the authenticated channel and reports the verdict
//!
//! ## `serve`
//! The server/receiver side:
//! - Accepts connections, one worker task per client
//! - Generates fresh group parameters and responds to the handshake
//! - Receives, verifies, and writes the transferred file
//! - Shuts workers down through an explicit cancellation signal

pub mod send;
pub mod serve;

use std::io::Write;

use tokio::task;

/// Read one line from the operator, echoing `prompt` first.
///
/// Runs on the blocking pool so a waiting prompt does not stall the runtime.
pub(crate) async fn prompt_line(prompt: &'static str) -> std::io::Result<String> {
    task::spawn_blocking(move || {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    })
    .await
    .expect("prompt task never panics")
}
