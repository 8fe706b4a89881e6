#![forbid(unsafe_code)]
//! Holder process: builds a ledger and serves it to followers until killed.

use clap::Parser;
use mirrorchain::config::load_config;
use mirrorchain::ledger::{HashChain, Transaction};
use mirrorchain::replication::ReplicationServer;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "mirror-holder", about = "Serve a hash-linked ledger to followers")]
struct Args {
    /// Listening port (overrides config.toml)
    #[arg(long)]
    port: Option<u16>,
    /// Transmit transaction bodies, not just block metadata
    #[arg(long)]
    include_transactions: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let config = load_config()?;

    let port = args.port.unwrap_or(config.network.port);
    let include_transactions =
        args.include_transactions || config.replication.include_transactions;

    let chain = build_demo_chain()?;
    info!("built ledger with {} blocks", chain.len());
    print!("{}", chain);

    let server = ReplicationServer::new(chain).include_transactions(include_transactions);
    let listener = TcpListener::bind((config.network.bind_addr.as_str(), port)).await?;
    server.serve(listener).await?;
    Ok(())
}

fn build_demo_chain() -> Result<HashChain, mirrorchain::error::LedgerError> {
    let mut chain = HashChain::with_genesis(vec![
        Transaction::from_f64("Don", "Pam", 50.0)?,
        Transaction::from_f64("Nikki", "Sauce", 25.0)?,
    ]);
    chain.append_block(vec![Transaction::from_f64("Sauce", "Don", 15.0)?])?;
    Ok(chain)
}
