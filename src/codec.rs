//! Wire codec for chain replication.
//!
//! One exchange carries one framed unit: a 4-byte big-endian payload length
//! followed by a JSON array of block records, ascending by index from 0.
//! Transaction bodies are optional on the wire; without them the receiver
//! can still check linkage (contiguity and prev_hash chaining) but cannot
//! recompute block hashes, so full verification only runs when every record
//! carries its transactions.

use crate::error::{LedgerError, Result};
use crate::ledger::{Amount, Block, HashChain, Sha256Hash, Transaction};

/// Upper bound on a declared payload length. Anything larger is treated as
/// a malformed frame rather than an allocation request.
pub const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

const FRAME_HEADER_LEN: usize = 4;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TransactionRecord {
    pub sender: String,
    pub receiver: String,
    pub amount: Amount,
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        TransactionRecord {
            sender: tx.sender.clone(),
            receiver: tx.receiver.clone(),
            amount: tx.amount,
        }
    }
}

/// One block as transmitted. Digests travel as 64-character lowercase hex.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BlockRecord {
    pub index: u64,
    pub timestamp: i64,
    pub prev_hash: String,
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<TransactionRecord>>,
}

impl BlockRecord {
    pub fn from_block(block: &Block, include_transactions: bool) -> Self {
        BlockRecord {
            index: block.index,
            timestamp: block.timestamp,
            prev_hash: block.prev_hash_hex(),
            hash: block.hash_hex(),
            transactions: include_transactions
                .then(|| block.transactions.iter().map(TransactionRecord::from).collect()),
        }
    }

    pub fn into_block(self) -> Result<Block> {
        let prev_hash = parse_digest("prev_hash", &self.prev_hash)?;
        let hash = parse_digest("hash", &self.hash)?;
        let transactions = match self.transactions {
            Some(records) => records
                .into_iter()
                .map(|r| {
                    Transaction::new(r.sender, r.receiver, r.amount)
                        .map_err(|e| LedgerError::MalformedPayload(e.to_string()))
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(Block::from_parts(
            self.index,
            self.timestamp,
            prev_hash,
            hash,
            transactions,
        ))
    }
}

fn parse_digest(field: &str, value: &str) -> Result<Sha256Hash> {
    if value.len() != 64 {
        return Err(LedgerError::MalformedPayload(format!(
            "{} must be 64 hex characters, got {}",
            field,
            value.len()
        )));
    }
    let bytes = hex::decode(value)
        .map_err(|e| LedgerError::MalformedPayload(format!("{} is not hex: {}", field, e)))?;
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&bytes);
    Ok(digest)
}

/// Serialize a chain into one framed wire unit.
pub fn encode_chain(chain: &HashChain, include_transactions: bool) -> Result<Vec<u8>> {
    let records: Vec<BlockRecord> = chain
        .blocks
        .iter()
        .map(|b| BlockRecord::from_block(b, include_transactions))
        .collect();
    let payload = serde_json::to_vec(&records).map_err(|e| LedgerError::Io(e.to_string()))?;
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(LedgerError::Io(format!(
            "encoded chain exceeds {} bytes",
            MAX_PAYLOAD_LEN
        )));
    }
    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Parse an unframed JSON payload back into a verified chain.
///
/// Structural mismatch is `MalformedPayload`; a chain that parses but fails
/// verification is `ChainIntegrity`. Linkage is always checked; on top of
/// that, every block that carries its transaction bodies gets its stored
/// hash recomputed. Metadata-only blocks cannot be recomputed, but a block
/// that does transmit transactions is never accepted unverified.
pub fn decode_chain(payload: &[u8]) -> Result<HashChain> {
    let records: Vec<BlockRecord> = serde_json::from_slice(payload)
        .map_err(|e| LedgerError::MalformedPayload(e.to_string()))?;
    let carries_transactions: Vec<bool> =
        records.iter().map(|r| r.transactions.is_some()).collect();
    let blocks = records
        .into_iter()
        .map(BlockRecord::into_block)
        .collect::<Result<Vec<_>>>()?;
    let chain = HashChain::from_blocks(blocks);
    chain.check_linkage()?;
    for (block, carries) in chain.blocks.iter().zip(carries_transactions) {
        if !carries {
            continue;
        }
        let recomputed = Block::compute_hash(
            block.index,
            block.timestamp,
            &block.prev_hash,
            &block.transactions,
        );
        if recomputed != block.hash {
            return Err(LedgerError::ChainIntegrity(format!(
                "block {} stored hash does not match recomputed hash",
                block.index
            )));
        }
    }
    Ok(chain)
}

/// Incremental frame assembler for transports that deliver the payload in
/// fragments. Feed each received chunk; a complete, well-formed frame yields
/// the decoded chain.
///
/// An exchange carries exactly one frame, so a decoder is single-use: once a
/// chain has been yielded, further input is a protocol violation and fails
/// with `MalformedPayload`.
#[derive(Debug, Default)]
pub struct ChainDecoder {
    buf: Vec<u8>,
    done: bool,
}

impl ChainDecoder {
    pub fn new() -> Self {
        ChainDecoder::default()
    }

    /// Bytes buffered so far without forming a complete frame.
    pub fn bytes_buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<Option<HashChain>> {
        if self.done {
            return Err(LedgerError::MalformedPayload(
                "data received after the frame completed".to_string(),
            ));
        }
        self.buf.extend_from_slice(chunk);
        if self.buf.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }
        let mut header = [0u8; FRAME_HEADER_LEN];
        header.copy_from_slice(&self.buf[..FRAME_HEADER_LEN]);
        let declared = u32::from_be_bytes(header) as usize;
        if declared > MAX_PAYLOAD_LEN {
            return Err(LedgerError::MalformedPayload(format!(
                "declared payload length {} exceeds limit {}",
                declared, MAX_PAYLOAD_LEN
            )));
        }
        let frame_end = FRAME_HEADER_LEN + declared;
        if self.buf.len() < frame_end {
            return Ok(None);
        }
        if self.buf.len() > frame_end {
            return Err(LedgerError::MalformedPayload(format!(
                "{} trailing bytes after frame",
                self.buf.len() - frame_end
            )));
        }
        let chain = decode_chain(&self.buf[FRAME_HEADER_LEN..frame_end])?;
        self.buf.clear();
        self.done = true;
        Ok(Some(chain))
    }
}
