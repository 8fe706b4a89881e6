#![forbid(unsafe_code)]
//! Follower process: replicates a ledger from a remote holder and prints it.

use clap::Parser;
use mirrorchain::config::load_config;
use mirrorchain::replication::ReplicationClient;
use tracing::info;

#[derive(Parser)]
#[command(name = "mirror-follower", about = "Fetch a ledger from a remote holder")]
struct Args {
    /// Holder address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Holder port (overrides config.toml)
    #[arg(long)]
    port: Option<u16>,
    /// Connection retry bound (overrides config.toml)
    #[arg(long)]
    max_attempts: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let config = load_config()?;

    let port = args.port.unwrap_or(config.network.port);
    let max_attempts = args.max_attempts.unwrap_or(config.network.max_attempts);

    let client = ReplicationClient::new().with_max_attempts(max_attempts);
    let chain = client.replicate_from(&args.host, port).await?;

    info!("replicated {} blocks from {}:{}", chain.len(), args.host, port);
    print!("{}", chain);
    Ok(())
}
