use clap::{Parser, Subcommand};
use std::error::Error;

#[derive(Parser)]
#[command(name = "sealink")]
#[command(about = "Authenticated encrypted file transfer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a receiver and send a file
    Send {
        /// Hostname of the receiver
        host: String,
        /// Port the receiver listens on
        port: u16,
        /// Pass the literal word "debug" to enable protocol tracing
        #[arg(value_parser = ["debug"])]
        debug: Option<String>,
    },
    /// Listen for senders and receive files
    Serve {
        /// Port to listen on
        port: u16,
        /// Pass the literal word "debug" to enable protocol tracing
        #[arg(value_parser = ["debug"])]
        debug: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Configure logging based on the debug argument
    let debug = matches!(
        &cli.command,
        Commands::Send { debug: Some(_), .. } | Commands::Serve { debug: Some(_), .. }
    );
    if debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
        log::debug!("Debug tracing enabled");
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    match cli.command {
        Commands::Send { host, port, .. } => {
            sealink::commands::send::run(&host, port).await?;
        }
        Commands::Serve { port, .. } => {
            sealink::commands::serve::run(port).await?;
        }
    }

    Ok(())
}
