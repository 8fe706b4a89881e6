//! Error types for MirrorChain

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Caller contract violation, e.g. appending before a genesis block
    /// exists or adding a transaction to an already-sealed block.
    #[error("invalid chain state: {0}")]
    InvalidChainState(String),
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    /// The wire payload does not match the documented schema.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    /// The payload parsed, but the reconstructed chain failed verification.
    /// Kept separate from `MalformedPayload`: this indicates tampering or
    /// corruption, not a protocol bug.
    #[error("chain integrity violation: {0}")]
    ChainIntegrity(String),
    #[error("connection failed after {attempts} attempts: {reason}")]
    ConnectionFailed { attempts: u32, reason: String },
    /// The peer closed the connection before a complete payload arrived.
    /// Distinct from a clean end-of-frame close.
    #[error("peer disconnected mid-payload")]
    PeerDisconnected,
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
