//! A single node: one chain, one transaction pool, one peer registry.
//!
//! All chain mutations (append on mine, append on announced block, replace on
//! resolution) happen under the chain write lock and bump `epoch`. A mining
//! round remembers the epoch it started from; its proof search is cancelled as
//! soon as the epoch moves, and its block is only appended if the tip it built
//! on is still the tip. Lock order is always chain, then pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{
    chain::{Chain, ChainValidator},
    config::NodeConfig,
    consensus::{self, ChainFetcher, Resolution},
    error::{FetchError, NodeError},
    peers::PeerRegistry,
    pool::TransactionPool,
    unix_now, Block, Transaction,
};

/// Read-only view of a chain, as reported to peers and clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOutcome {
    pub replaced: bool,
    pub length: usize,
}

pub struct Node<F> {
    config: NodeConfig,
    validator: ChainValidator,
    chain: RwLock<Chain>,
    pool: Mutex<TransactionPool>,
    peers: RwLock<PeerRegistry>,
    epoch: Arc<AtomicU64>,
    fetcher: F,
}

impl<F: ChainFetcher> Node<F> {
    pub fn new(config: NodeConfig, fetcher: F) -> Self {
        Self {
            validator: ChainValidator::new(config.difficulty),
            config,
            chain: RwLock::new(Chain::new()),
            pool: Mutex::new(TransactionPool::new()),
            peers: RwLock::new(PeerRegistry::new()),
            epoch: Arc::new(AtomicU64::new(0)),
            fetcher,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn validator(&self) -> &ChainValidator {
        &self.validator
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Queues a transaction for the next block and returns its position there.
    pub async fn submit_transaction(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
    ) -> Result<usize, NodeError> {
        let tx = Transaction::new(sender, recipient, amount);
        let position = self.pool.lock().await.submit(tx)?;
        Ok(position)
    }

    /// Mines one block on top of the current tip.
    ///
    /// Fails with [`NodeError::StaleMiningAttempt`] if the chain changed while
    /// the proof was being searched; the snapshotted transactions then stay
    /// pending for the next round.
    pub async fn mine(&self) -> Result<Block, NodeError> {
        // Snapshot and tip must come from the same chain state.
        let (snapshot, start_epoch, parent_index, parent_proof, parent_hash) = {
            let chain = self.chain.read().await;
            let snapshot = self.pool.lock().await.snapshot();
            let tip = chain.tip();
            (
                snapshot,
                self.epoch.load(Ordering::Acquire),
                tip.index,
                tip.proof,
                tip.hash(),
            )
        };
        if snapshot.is_empty() && !self.config.allow_empty_blocks {
            return Err(NodeError::NothingToMine);
        }

        let epoch = Arc::clone(&self.epoch);
        let strategy = self.config.mining;
        let difficulty = self.config.difficulty;
        debug!(
            index = parent_index + 1,
            txs = snapshot.len(),
            difficulty,
            "mining started"
        );
        let found = tokio::task::spawn_blocking(move || {
            strategy.find_proof(parent_proof, difficulty, || {
                epoch.load(Ordering::Acquire) != start_epoch
            })
        })
        .await
        .map_err(|e| NodeError::Worker(e.to_string()))?;

        let Some(proof) = found else {
            warn!(index = parent_index + 1, "chain changed during proof search, block abandoned");
            return Err(NodeError::StaleMiningAttempt);
        };

        let mut chain = self.chain.write().await;
        if self.epoch.load(Ordering::Acquire) != start_epoch || chain.tip().hash() != parent_hash {
            warn!(index = parent_index + 1, "tip moved before sealing, block abandoned");
            return Err(NodeError::StaleMiningAttempt);
        }
        let mut pool = self.pool.lock().await;
        if !pool.covers(&snapshot) {
            warn!(index = parent_index + 1, "snapshot no longer pending, block abandoned");
            return Err(NodeError::StaleMiningAttempt);
        }

        let block = Block {
            index: parent_index + 1,
            timestamp: unix_now(),
            transactions: snapshot.transactions.clone(),
            proof,
            previous_hash: parent_hash,
        };
        chain.push(block.clone());
        let cleared = pool.clear_snapshot(&snapshot);
        self.epoch.fetch_add(1, Ordering::AcqRel);

        info!(
            index = block.index,
            proof,
            txs = cleared,
            hash = %block.hash_hex(),
            "mined block"
        );
        Ok(block)
    }

    /// Appends a block announced by a peer if it extends the current tip.
    pub async fn accept_block(&self, block: Block) -> Result<(), NodeError> {
        let mut chain = self.chain.write().await;
        if let Err(err) = self.validator.validate_successor(chain.tip(), &block) {
            warn!(index = block.index, error = %err, "announced block rejected");
            return Err(err.into());
        }
        let mut pool = self.pool.lock().await;
        let dropped = pool.discard_included(&block.transactions);
        info!(index = block.index, dropped, "accepted announced block");
        chain.push(block);
        self.epoch.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    pub async fn get_chain(&self) -> ChainSnapshot {
        let chain = self.chain.read().await;
        ChainSnapshot {
            chain: chain.blocks().to_vec(),
            length: chain.len(),
        }
    }

    pub async fn chain_len(&self) -> usize {
        self.chain.read().await.len()
    }

    pub async fn pending_transactions(&self) -> Vec<Transaction> {
        self.pool.lock().await.pending()
    }

    /// Returns how many of `addresses` were new.
    pub async fn register_peers<I, S>(&self, addresses: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut peers = self.peers.write().await;
        let added = peers.register(addresses);
        info!(added, total = peers.len(), "peers registered");
        added
    }

    pub async fn peers(&self) -> Vec<String> {
        self.peers.read().await.list()
    }

    /// Adopts the longest valid peer chain if it is strictly longer than ours.
    ///
    /// Peers that fail, time out or report invalid chains are skipped.
    pub async fn resolve_conflicts(&self) -> ResolveOutcome {
        let baseline = self.chain.read().await.blocks().to_vec();
        let peers = self.peers.read().await.list();
        let timeout = self.config.fetch_timeout;

        let fetches = peers.iter().map(|peer| self.fetch_candidate(peer, timeout));
        let candidates: Vec<Vec<Block>> = join_all(fetches).await.into_iter().flatten().collect();
        debug!(
            peers = peers.len(),
            candidates = candidates.len(),
            local = baseline.len(),
            "resolving"
        );

        let blocks = match consensus::resolve(&baseline, candidates, &self.validator) {
            Resolution::Retained => {
                return ResolveOutcome {
                    replaced: false,
                    length: self.chain_len().await,
                };
            }
            Resolution::Replaced(blocks) => blocks,
        };

        let mut chain = self.chain.write().await;
        if blocks.len() <= chain.len() {
            info!(
                candidate = blocks.len(),
                local = chain.len(),
                "local chain grew during resolution, keeping it"
            );
            return ResolveOutcome {
                replaced: false,
                length: chain.len(),
            };
        }
        let replacement = match Chain::from_validated(blocks) {
            Ok(replacement) => replacement,
            Err(err) => {
                warn!(error = %err, "winning chain unusable");
                return ResolveOutcome {
                    replaced: false,
                    length: chain.len(),
                };
            }
        };
        let mut pool = self.pool.lock().await;
        let dropped = pool.discard_included(
            replacement
                .blocks()
                .iter()
                .flat_map(|b| b.transactions.iter()),
        );
        *chain = replacement;
        self.epoch.fetch_add(1, Ordering::AcqRel);
        info!(length = chain.len(), dropped, "adopted longer peer chain");

        ResolveOutcome {
            replaced: true,
            length: chain.len(),
        }
    }

    async fn fetch_candidate(&self, peer: &str, timeout: Duration) -> Option<Vec<Block>> {
        let result = match tokio::time::timeout(timeout, self.fetcher.fetch_chain(peer)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                peer: peer.to_string(),
            }),
        };
        match result {
            Ok(blocks) => Some(blocks),
            Err(err) => {
                warn!(%peer, error = %err, "skipping peer");
                None
            }
        }
    }
}
