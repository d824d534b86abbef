use std::error::Error;
use std::time::Duration;

use indicatif::ProgressBar;
use log::{debug, error};
use rand::rngs::OsRng;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task;

use crate::error::Error as SessionError;
use crate::group::{self, GroupConfig};
use crate::handshake;
use crate::transfer::{self, TransferOutcome};
use crate::wire::WireCodec;

/// Server role: accept clients and run one worker per connection.
///
/// Workers share no cryptographic state; each generates its own group
/// parameters and derives its own session key. The coordinator owns a watch
/// channel carrying the shutdown signal: on ctrl-c every worker's session
/// future is cancelled at its next suspension point and the accept loop
/// exits. A worker that hits a parameter-generation failure reports it back
/// over the fatal channel, which tears the whole server down - that failure
/// means generation is broken, not that one client was unlucky.
pub async fn run(port: u16) -> Result<(), Box<dyn Error>> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    println!("Listening on port {}", port);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (fatal_tx, mut fatal_rx) = mpsc::channel::<SessionError>(1);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let mut worker_id: u64 = 0;
    let mut shutdown = shutdown_rx.clone();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, addr) = accepted?;
                worker_id += 1;
                println!("Client {} connected from {}", worker_id, addr);

                let mut worker_shutdown = shutdown_rx.clone();
                let worker_fatal = fatal_tx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        result = handle_session(stream, worker_id) => match result {
                            Ok(TransferOutcome::Passed) => {
                                println!("Client {}: file received and verified", worker_id);
                            }
                            Ok(TransferOutcome::Failed) => {
                                println!("Client {}: file rejected", worker_id);
                            }
                            Err(e) => {
                                error!("client {}: session failed: {}", worker_id, e);
                                if matches!(e, SessionError::NoGenerator) {
                                    let _ = worker_fatal.send(e).await;
                                }
                            }
                        },
                        _ = worker_shutdown.changed() => {
                            debug!("worker {} cancelled by shutdown signal", worker_id);
                        }
                    }
                });
            }

            fatal = fatal_rx.recv() => {
                if let Some(e) = fatal {
                    return Err(e.into());
                }
            }

            _ = shutdown.changed() => {
                println!("Shutting down server.");
                return Ok(());
            }
        }
    }
}

/// Full handshake-then-transfer sequence for one client.
async fn handle_session(
    stream: TcpStream,
    worker_id: u64,
) -> Result<TransferOutcome, SessionError> {
    debug!("worker {}: generating group parameters", worker_id);
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Generating group parameters");

    let params = task::spawn_blocking(|| group::generate(&GroupConfig::default(), &mut OsRng))
        .await
        .map_err(|e| SessionError::Protocol(format!("parameter generation task failed: {}", e)))??;
    spinner.finish_and_clear();

    let mut codec = WireCodec::new(stream);
    let mut rng = OsRng;

    debug!("worker {}: starting key agreement", worker_id);
    let key = handshake::respond(&mut codec, &params, &mut rng).await?;
    debug!("worker {}: session key established", worker_id);

    transfer::receive_file(&mut codec, &key, |name, bytes| {
        println!("Output file: {}", name);
        println!("File size = {}", bytes.len());
        std::fs::write(name, bytes)
    })
    .await
}
