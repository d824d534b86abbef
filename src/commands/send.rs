use std::error::Error;

use log::debug;
use rand::rngs::OsRng;
use tokio::fs;
use tokio::net::TcpStream;

use crate::handshake;
use crate::transfer::{self, TransferOutcome};
use crate::wire::WireCodec;

use super::prompt_line;

/// Client role: connect, agree on a key, send one file, report the verdict.
pub async fn run(host: &str, port: u16) -> Result<(), Box<dyn Error>> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| format!("could not connect to {}:{}: {}", host, port, e))?;
    println!("Connected to {} on port {}", host, port);

    let mut codec = WireCodec::new(stream);
    let mut rng = OsRng;

    debug!("starting key agreement");
    let key = handshake::initiate(&mut codec, &mut rng).await?;
    debug!("session key established");

    let source = prompt_line("Please enter the source filename: ").await?;
    let contents = fs::read(&source)
        .await
        .map_err(|e| format!("could not open source file {}: {}", source, e))?;
    debug!("read {} bytes from {}", contents.len(), source);

    let dest = prompt_line("Please enter the destination filename: ").await?;

    match transfer::send_file(&mut codec, &key, &dest, &contents).await? {
        TransferOutcome::Passed => println!("File received and verified"),
        TransferOutcome::Failed => println!("Error verifying file"),
    }

    println!("Shutting down client.");
    Ok(())
}
