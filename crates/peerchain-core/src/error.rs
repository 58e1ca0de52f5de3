use thiserror::Error;

/// A submitted transaction is structurally malformed and was not stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("sender must not be empty")]
    EmptySender,
    #[error("recipient must not be empty")]
    EmptyRecipient,
}

/// Why a chain (or a single announced block) failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("chain has no blocks")]
    Empty,
    #[error("genesis block does not match the genesis template")]
    InvalidGenesis,
    #[error("block index mismatch: expected {expected}, got {got}")]
    IndexMismatch { expected: u64, got: u64 },
    #[error("previous_hash of block {index} does not match the hash of its parent")]
    BrokenLink { index: u64 },
    #[error("proof of block {index} does not satisfy the difficulty predicate")]
    InvalidProof { index: u64 },
}

/// A peer's chain could not be obtained. The peer contributes no candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },
    #[error("peer {peer} answered with status {status}")]
    Status { peer: String, status: u16 },
    #[error("peer {peer} sent a malformed chain: {reason}")]
    Malformed { peer: String, reason: String },
    #[error("peer {peer} did not answer in time")]
    Timeout { peer: String },
}

/// Errors surfaced by [`crate::node::Node`] operations.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid transaction: {0}")]
    InvalidTransaction(#[from] TransactionError),
    #[error("chain changed while mining; no block produced this round")]
    StaleMiningAttempt,
    #[error("no pending transactions to mine")]
    NothingToMine,
    #[error("block rejected: {0}")]
    RejectedBlock(#[from] ChainError),
    #[error("mining worker failed: {0}")]
    Worker(String),
}
