pub mod config;
pub mod consensus;
pub mod constants;
pub mod error;
pub mod mine;
pub mod node;
pub mod peers;
pub mod pool;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub use config::{MiningStrategy, NodeConfig};
pub use consensus::{ChainFetcher, Resolution};
pub use error::{ChainError, FetchError, NodeError, TransactionError};
pub use node::{ChainSnapshot, Node, ResolveOutcome};
pub use peers::PeerRegistry;
pub use pool::TransactionPool;

pub type Hash = [u8; 32];

/// SHA-256 of `bytes`.
pub fn sha256(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// Seconds since the unix epoch; 0 if the clock is before it.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn push_str(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u64).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
}

/// Hashes travel as lowercase hex strings.
mod hex_hash {
    use super::Hash;
    use crate::constants::HASH_HEX_SIZE;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.len() != HASH_HEX_SIZE {
            return Err(D::Error::custom(format!(
                "expected {HASH_HEX_SIZE} hex characters, got {}",
                s.len()
            )));
        }
        let mut out = [0u8; 32];
        hex::decode_to_slice(&s, &mut out).map_err(D::Error::custom)?;
        Ok(out)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
    pub timestamp: u64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            timestamp: unix_now(),
        }
    }

    /// Structural well-formedness only. Amounts are unsigned, so any value is accepted.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.sender.trim().is_empty() {
            return Err(TransactionError::EmptySender);
        }
        if self.recipient.trim().is_empty() {
            return Err(TransactionError::EmptyRecipient);
        }
        Ok(())
    }

    /// Canonical encoding: length-prefixed strings, then little-endian integers.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(8 + self.sender.len() + 8 + self.recipient.len() + 8 + 8);
        push_str(&mut bytes, &self.sender);
        push_str(&mut bytes, &self.recipient);
        bytes.extend_from_slice(&self.amount.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes
    }

    pub fn id(&self) -> Hash {
        sha256(&self.hash_bytes())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    #[serde(with = "hex_hash")]
    pub previous_hash: Hash,
}

impl Block {
    /// Canonical encoding of every field; transactions enter through their merkle root.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + 8 + 8 + 32 + 32);
        bytes.extend_from_slice(&self.index.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&self.proof.to_le_bytes());
        bytes.extend_from_slice(&self.previous_hash);
        bytes.extend_from_slice(&merkle_root(&self.transactions));
        bytes
    }

    pub fn hash(&self) -> Hash {
        sha256(&self.hash_bytes())
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }
}

/// Free-function form of [`Block::hash`].
pub fn hash_block(block: &Block) -> Hash {
    block.hash()
}

pub fn merkle_root(txs: &[Transaction]) -> Hash {
    if txs.is_empty() {
        return [0u8; 32];
    }
    let mut level: Vec<Hash> = txs.iter().map(Transaction::id).collect();

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let (a, b) = if pair.len() == 2 {
                (pair[0], pair[1])
            } else {
                (pair[0], pair[0])
            };
            let mut hasher = Sha256::new();
            hasher.update(a);
            hasher.update(b);
            let digest = hasher.finalize();
            let mut out = [0u8; 32];
            out.copy_from_slice(&digest[..]);
            next.push(out);
        }
        level = next;
    }
    level[0]
}

pub mod pow {
    use super::{sha256, Hash};
    use crate::constants::CANCEL_CHECK_INTERVAL;

    /// Hash of `proof` followed by `previous_proof`, both little-endian.
    pub fn proof_hash(proof: u64, previous_proof: u64) -> Hash {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&proof.to_le_bytes());
        bytes[8..].copy_from_slice(&previous_proof.to_le_bytes());
        sha256(&bytes)
    }

    pub fn is_valid_proof(proof: u64, previous_proof: u64, difficulty: u32) -> bool {
        count_leading_zero_bits(&proof_hash(proof, previous_proof)) >= difficulty
    }

    /// Count up from zero until a proof satisfies the difficulty predicate.
    /// Returns `None` if `cancelled` reports true before a proof is found.
    pub fn find_proof<C>(previous_proof: u64, difficulty: u32, cancelled: C) -> Option<u64>
    where
        C: Fn() -> bool,
    {
        let mut proof = 0u64;
        loop {
            if proof % CANCEL_CHECK_INTERVAL == 0 && cancelled() {
                return None;
            }
            if is_valid_proof(proof, previous_proof, difficulty) {
                return Some(proof);
            }
            proof = proof.checked_add(1)?;
        }
    }

    pub fn count_leading_zero_bits(hash: &Hash) -> u32 {
        let mut total = 0u32;
        for b in hash {
            if *b == 0 {
                total += 8;
            } else {
                total += b.leading_zeros();
                break;
            }
        }
        total
    }
}

pub mod chain {
    use super::*;
    use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF, GENESIS_TIMESTAMP};
    use crate::error::ChainError;

    /// The fixed genesis template shared by every node.
    pub fn genesis_block() -> Block {
        Block {
            index: 0,
            timestamp: GENESIS_TIMESTAMP,
            transactions: vec![],
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH,
        }
    }

    /// Ordered blocks rooted at genesis. Never empty.
    #[derive(Clone, Debug)]
    pub struct Chain {
        blocks: Vec<Block>,
    }

    impl Default for Chain {
        fn default() -> Self {
            Self::new()
        }
    }

    #[allow(clippy::len_without_is_empty)]
    impl Chain {
        pub fn new() -> Self {
            Self {
                blocks: vec![genesis_block()],
            }
        }

        /// Wrap blocks that already passed [`ChainValidator::validate`].
        pub fn from_validated(blocks: Vec<Block>) -> Result<Self, ChainError> {
            if blocks.is_empty() {
                return Err(ChainError::Empty);
            }
            Ok(Self { blocks })
        }

        pub fn blocks(&self) -> &[Block] {
            &self.blocks
        }

        pub fn len(&self) -> usize {
            self.blocks.len()
        }

        pub fn tip(&self) -> &Block {
            // non-empty by construction
            &self.blocks[self.blocks.len() - 1]
        }

        pub(crate) fn push(&mut self, block: Block) {
            self.blocks.push(block);
        }
    }

    /// Checks linkage, hash integrity and proof-of-work of whole chains.
    #[derive(Clone, Copy, Debug)]
    pub struct ChainValidator {
        difficulty: u32,
    }

    impl ChainValidator {
        pub fn new(difficulty: u32) -> Self {
            Self { difficulty }
        }

        pub fn difficulty(&self) -> u32 {
            self.difficulty
        }

        pub fn is_valid(&self, blocks: &[Block]) -> bool {
            self.validate(blocks).is_ok()
        }

        /// Stops at the first offending block.
        pub fn validate(&self, blocks: &[Block]) -> Result<(), ChainError> {
            let genesis = blocks.first().ok_or(ChainError::Empty)?;
            if *genesis != genesis_block() {
                return Err(ChainError::InvalidGenesis);
            }
            for pair in blocks.windows(2) {
                self.validate_successor(&pair[0], &pair[1])?;
            }
            Ok(())
        }

        /// Whether `block` may directly follow `parent`.
        pub fn validate_successor(&self, parent: &Block, block: &Block) -> Result<(), ChainError> {
            let expected = parent.index + 1;
            if block.index != expected {
                return Err(ChainError::IndexMismatch {
                    expected,
                    got: block.index,
                });
            }
            if block.previous_hash != parent.hash() {
                return Err(ChainError::BrokenLink { index: block.index });
            }
            if !pow::is_valid_proof(block.proof, parent.proof, self.difficulty) {
                return Err(ChainError::InvalidProof { index: block.index });
            }
            Ok(())
        }
    }
}
