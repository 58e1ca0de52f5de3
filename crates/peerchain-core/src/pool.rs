//! Pending transactions awaiting inclusion in the next block.
//!
//! Every accepted transaction gets a sequence number. A mining round takes a
//! [`PoolSnapshot`] and, once its block is sealed, clears exactly the entries
//! the snapshot covered; anything submitted after the snapshot stays pending.

use std::collections::HashMap;

use tracing::debug;

use crate::{error::TransactionError, Hash, Transaction};

#[derive(Clone, Debug)]
struct PendingEntry {
    seq: u64,
    tx: Transaction,
}

#[derive(Debug, Default)]
pub struct TransactionPool {
    pending: Vec<PendingEntry>,
    next_seq: u64,
}

/// The transactions a mining round embeds, plus the sequence mark that bounds them.
#[derive(Clone, Debug)]
pub struct PoolSnapshot {
    pub transactions: Vec<Transaction>,
    mark: Option<u64>,
}

impl PoolSnapshot {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and appends `tx`, returning its position in the next block.
    pub fn submit(&mut self, tx: Transaction) -> Result<usize, TransactionError> {
        tx.validate()?;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(PendingEntry { seq, tx });
        debug!(seq, pending = self.pending.len(), "transaction queued");
        Ok(self.pending.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> Vec<Transaction> {
        self.pending.iter().map(|e| e.tx.clone()).collect()
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            transactions: self.pending(),
            mark: self.pending.last().map(|e| e.seq),
        }
    }

    /// True while every entry `snapshot` took is still pending.
    pub fn covers(&self, snapshot: &PoolSnapshot) -> bool {
        let Some(mark) = snapshot.mark else {
            return true;
        };
        self.pending.iter().filter(|e| e.seq <= mark).count() == snapshot.len()
    }

    /// Drops the entries covered by `snapshot`. Returns how many were removed.
    pub fn clear_snapshot(&mut self, snapshot: &PoolSnapshot) -> usize {
        let Some(mark) = snapshot.mark else {
            return 0;
        };
        let before = self.pending.len();
        self.pending.retain(|e| e.seq > mark);
        before - self.pending.len()
    }

    /// Drops one pending copy per occurrence in `included`, oldest first.
    /// Identical pending copies beyond that stay queued.
    pub fn discard_included<'a, I>(&mut self, included: I) -> usize
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut owed: HashMap<Hash, usize> = HashMap::new();
        for tx in included {
            *owed.entry(tx.id()).or_default() += 1;
        }
        if owed.is_empty() {
            return 0;
        }
        let before = self.pending.len();
        self.pending.retain(|e| match owed.get_mut(&e.tx.id()) {
            Some(n) if *n > 0 => {
                *n -= 1;
                false
            }
            _ => true,
        });
        before - self.pending.len()
    }
}
