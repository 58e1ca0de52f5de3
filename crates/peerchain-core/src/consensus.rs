//! Longest-valid-chain conflict resolution.
//!
//! A candidate only contends if it is strictly longer than the local chain, so
//! equal lengths never cause churn. Among contenders the longest valid one wins;
//! on a length tie the first one seen (peer registration order) is kept.

use std::future::Future;

use tracing::{debug, warn};

use crate::{chain::ChainValidator, error::FetchError, Block};

/// Outcome of a resolution pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// No candidate beat the local chain.
    Retained,
    /// This longer valid chain should replace the local one.
    Replaced(Vec<Block>),
}

impl Resolution {
    pub fn changed(&self) -> bool {
        matches!(self, Resolution::Replaced(_))
    }
}

/// Fetches the chain a peer currently reports.
pub trait ChainFetcher: Send + Sync {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<Vec<Block>, FetchError>> + Send;
}

pub fn resolve<I>(local: &[Block], candidates: I, validator: &ChainValidator) -> Resolution
where
    I: IntoIterator<Item = Vec<Block>>,
{
    let mut best: Option<Vec<Block>> = None;
    let mut best_len = local.len();

    for (position, candidate) in candidates.into_iter().enumerate() {
        if candidate.len() <= best_len {
            debug!(position, len = candidate.len(), best_len, "candidate not longer, skipped");
            continue;
        }
        match validator.validate(&candidate) {
            Ok(()) => {
                best_len = candidate.len();
                best = Some(candidate);
            }
            Err(err) => {
                warn!(position, len = candidate.len(), error = %err, "discarding invalid chain");
            }
        }
    }

    best.map_or(Resolution::Retained, Resolution::Replaced)
}
