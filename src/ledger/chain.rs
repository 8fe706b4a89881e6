use crate::error::{LedgerError, Result};
use fixed::types::I64F64;
use sha2::{Digest, Sha256};
use std::fmt;

pub type Sha256Hash = [u8; 32];

/// Fixed-point transaction amount. The hash input and the wire form are the
/// bit pattern of this type, so the same logical chain hashes identically on
/// every platform and locale.
pub type Amount = I64F64;

/// Predecessor link of the genesis block.
pub const GENESIS_PREV_HASH: Sha256Hash = [0u8; 32];

/// Maximum byte length of a sender or receiver identifier.
pub const MAX_PARTY_LEN: usize = 50;

/// A value transfer recorded inside exactly one block.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: Amount,
}

impl Transaction {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: Amount,
    ) -> Result<Self> {
        let sender = sender.into();
        let receiver = receiver.into();
        validate_party("sender", &sender)?;
        validate_party("receiver", &receiver)?;
        Ok(Transaction {
            sender,
            receiver,
            amount,
        })
    }

    /// Build a transaction from a float amount, rejecting non-finite values
    /// before they can reach the hash input.
    pub fn from_f64(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
    ) -> Result<Self> {
        if !amount.is_finite() {
            return Err(LedgerError::InvalidTransaction(format!(
                "amount must be finite, got {}",
                amount
            )));
        }
        Self::new(sender, receiver, Amount::from_num(amount))
    }

    /// Feed this transaction's canonical bytes into a block hasher.
    fn absorb(&self, hasher: &mut Sha256) {
        hasher.update(self.sender.as_bytes());
        hasher.update(self.receiver.as_bytes());
        hasher.update(self.amount.to_le_bytes());
    }
}

fn validate_party(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LedgerError::InvalidTransaction(format!(
            "{} must not be empty",
            field
        )));
    }
    if value.len() > MAX_PARTY_LEN {
        return Err(LedgerError::InvalidTransaction(format!(
            "{} exceeds {} bytes: {}",
            field,
            MAX_PARTY_LEN,
            value.len()
        )));
    }
    Ok(())
}

/// One chain position, sealed at construction: the hash is computed once,
/// over the complete transaction set, and the block is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub index: u64,
    /// Seconds since epoch, assigned at construction and never mutated.
    pub timestamp: i64,
    pub prev_hash: Sha256Hash,
    pub transactions: Vec<Transaction>,
    pub hash: Sha256Hash,
}

impl Block {
    pub fn new(index: u64, prev_hash: Sha256Hash, transactions: Vec<Transaction>) -> Self {
        let timestamp = chrono::Utc::now().timestamp();
        let hash = Block::compute_hash(index, timestamp, &prev_hash, &transactions);
        Block {
            index,
            timestamp,
            prev_hash,
            transactions,
            hash,
        }
    }

    /// Reassemble a block from transmitted fields, keeping the stored hash
    /// as received. Verification decides whether to trust it.
    pub(crate) fn from_parts(
        index: u64,
        timestamp: i64,
        prev_hash: Sha256Hash,
        hash: Sha256Hash,
        transactions: Vec<Transaction>,
    ) -> Self {
        Block {
            index,
            timestamp,
            prev_hash,
            transactions,
            hash,
        }
    }

    /// Deterministic digest of (index, timestamp, prev_hash, transactions in
    /// insertion order). Amounts contribute their fixed-point bit pattern,
    /// never a formatted string.
    pub fn compute_hash(
        index: u64,
        timestamp: i64,
        prev_hash: &Sha256Hash,
        transactions: &[Transaction],
    ) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update(index.to_le_bytes());
        hasher.update(timestamp.to_le_bytes());
        hasher.update(prev_hash);
        for tx in transactions {
            tx.absorb(&mut hasher);
        }
        hasher.finalize().into()
    }

    /// Blocks are sealed when constructed; the hash already covers the final
    /// transaction set, so any late addition is rejected.
    pub fn add_transaction(&mut self, _tx: Transaction) -> Result<()> {
        Err(LedgerError::InvalidChainState(format!(
            "block {} is sealed; transactions must be supplied at construction",
            self.index
        )))
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn prev_hash_hex(&self) -> String {
        hex::encode(self.prev_hash)
    }
}

/// An append-only sequence of blocks starting at genesis. Blocks live in a
/// `Vec` arena; each block owns its transactions, so teardown is a drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashChain {
    pub blocks: Vec<Block>,
}

impl HashChain {
    /// An empty chain with no genesis block. Appending to it fails until a
    /// genesis exists; use [`HashChain::with_genesis`] for the normal path.
    pub fn new() -> Self {
        HashChain { blocks: Vec::new() }
    }

    /// Create a chain whose genesis block (index 0, sentinel predecessor)
    /// carries the given transactions.
    pub fn with_genesis(transactions: Vec<Transaction>) -> Self {
        HashChain {
            blocks: vec![Block::new(0, GENESIS_PREV_HASH, transactions)],
        }
    }

    pub(crate) fn from_blocks(blocks: Vec<Block>) -> Self {
        HashChain { blocks }
    }

    /// Seal the given transactions into a new tail block. Returns the new
    /// block's hash.
    pub fn append_block(&mut self, transactions: Vec<Transaction>) -> Result<Sha256Hash> {
        let tail = self.blocks.last().ok_or_else(|| {
            LedgerError::InvalidChainState(
                "cannot append to a chain with no genesis block".to_string(),
            )
        })?;
        let block = Block::new(tail.index + 1, tail.hash, transactions);
        let hash = block.hash;
        self.blocks.push(block);
        Ok(hash)
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Full verification: structural linkage plus recomputation of every
    /// stored hash over the block's own fields and transactions.
    pub fn verify(&self) -> bool {
        self.check_full().is_ok()
    }

    /// Structural checks only: non-empty, genesis invariant, contiguous
    /// indices, every prev_hash equal to the predecessor's stored hash.
    /// This is the strongest check possible for a chain received without
    /// transaction bodies, where hashes cannot be recomputed.
    pub fn check_linkage(&self) -> Result<()> {
        let genesis = self.blocks.first().ok_or_else(|| {
            LedgerError::ChainIntegrity("chain is empty".to_string())
        })?;
        if genesis.index != 0 {
            return Err(LedgerError::ChainIntegrity(format!(
                "genesis block has index {}, expected 0",
                genesis.index
            )));
        }
        if genesis.prev_hash != GENESIS_PREV_HASH {
            return Err(LedgerError::ChainIntegrity(
                "genesis prev_hash is not the sentinel".to_string(),
            ));
        }
        for pair in self.blocks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.index != prev.index + 1 {
                return Err(LedgerError::ChainIntegrity(format!(
                    "non-contiguous index after block {}: got {}",
                    prev.index, next.index
                )));
            }
            if next.prev_hash != prev.hash {
                return Err(LedgerError::ChainIntegrity(format!(
                    "block {} prev_hash does not match block {} hash",
                    next.index, prev.index
                )));
            }
        }
        Ok(())
    }

    /// Linkage checks plus hash recomputation for every block.
    pub fn check_full(&self) -> Result<()> {
        self.check_linkage()?;
        for block in &self.blocks {
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
        Ok(())
    }
}

impl fmt::Display for HashChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            writeln!(f, "Block {}", block.index)?;
            writeln!(f, "Timestamp: {}", block.timestamp)?;
            writeln!(f, "Prev Hash: {}", block.prev_hash_hex())?;
            writeln!(f, "Hash: {}", block.hash_hex())?;
            for tx in &block.transactions {
                writeln!(f, "Transaction: {} -> {} : {}", tx.sender, tx.receiver, tx.amount)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
