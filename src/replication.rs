//! Chain replication over TCP.
//!
//! One exchange is a one-shot request/response: the holder accepts a
//! connection, writes the framed chain, and closes. The server handles each
//! connection on its own task; a failing peer never disturbs the accept loop
//! or other handlers. The client retries the connect up to a bounded number
//! of attempts, then reads and decodes until a complete frame arrives.

use crate::codec::{self, ChainDecoder};
use crate::error::{LedgerError, Result};
use crate::ledger::HashChain;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

const READ_BUF_LEN: usize = 4096;

/// Serves an immutable snapshot of a chain to any number of peers.
///
/// The chain is captured in an `Arc` at construction; handlers share it
/// read-only, so every response is internally consistent.
pub struct ReplicationServer {
    chain: Arc<HashChain>,
    include_transactions: bool,
}

impl ReplicationServer {
    pub fn new(chain: HashChain) -> Self {
        ReplicationServer {
            chain: Arc::new(chain),
            include_transactions: false,
        }
    }

    /// Also transmit transaction bodies, letting followers run full hash
    /// verification instead of linkage checks.
    pub fn include_transactions(mut self, include: bool) -> Self {
        self.include_transactions = include;
        self
    }

    /// Bind `0.0.0.0:port` and accept connections until the task is dropped
    /// or the process terminates.
    pub async fn listen(&self, port: u16) -> Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        self.serve(listener).await
    }

    /// Accept loop over an already-bound listener. Each connection gets its
    /// own task; accept and handler failures are logged, never fatal.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr()?;
        info!("replication server listening on {}", local);
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let chain = Arc::clone(&self.chain);
                    let include_transactions = self.include_transactions;
                    tokio::spawn(async move {
                        match Self::serve_one(stream, &chain, include_transactions).await {
                            Ok(()) => info!("served {} blocks to {}", chain.len(), peer),
                            Err(e) => warn!("replication to {} failed: {}", peer, e),
                        }
                    });
                }
                Err(e) => warn!("accept failed: {}", e),
            }
        }
    }

    /// Write the framed chain to one peer and close the connection.
    pub async fn serve_one(
        mut stream: TcpStream,
        chain: &HashChain,
        include_transactions: bool,
    ) -> Result<()> {
        let frame = codec::encode_chain(chain, include_transactions)?;
        stream.write_all(&frame).await?;
        stream.shutdown().await?;
        Ok(())
    }
}

/// Obtains a copy of a remote chain with bounded connect retries.
#[derive(Debug, Clone)]
pub struct ReplicationClient {
    max_attempts: u32,
    retry_delay: Duration,
}

impl ReplicationClient {
    pub fn new() -> Self {
        ReplicationClient {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Connect to the holder, retrying up to the configured attempt bound.
    /// Each failed attempt drops its socket before the next try.
    pub async fn connect(&self, host: &str, port: u16) -> Result<TcpStream> {
        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            match TcpStream::connect((host, port)).await {
                Ok(stream) => {
                    info!("connected to {}:{} on attempt {}", host, port, attempt);
                    return Ok(stream);
                }
                Err(e) => {
                    warn!(
                        "connection attempt {}/{} to {}:{} failed: {}",
                        attempt, self.max_attempts, host, port, e
                    );
                    last_error = e.to_string();
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        Err(LedgerError::ConnectionFailed {
            attempts: self.max_attempts,
            reason: last_error,
        })
    }

    /// Read until a complete frame decodes. A close before that is
    /// `PeerDisconnected`; codec errors propagate unchanged.
    pub async fn fetch_chain(&self, stream: &mut TcpStream) -> Result<HashChain> {
        let mut decoder = ChainDecoder::new();
        let mut buf = [0u8; READ_BUF_LEN];
        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                return Err(LedgerError::PeerDisconnected);
            }
            if let Some(chain) = decoder.feed(&buf[..n])? {
                return Ok(chain);
            }
        }
    }

    /// Connect and fetch in one step. The caller gets either a chain that
    /// passed decode-time verification or a specific error, never a partial
    /// result.
    pub async fn replicate_from(&self, host: &str, port: u16) -> Result<HashChain> {
        let mut stream = self.connect(host, port).await?;
        self.fetch_chain(&mut stream).await
    }
}

impl Default for ReplicationClient {
    fn default() -> Self {
        Self::new()
    }
}
