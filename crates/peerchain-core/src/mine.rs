use crate::{config::MiningStrategy, pow};
use rayon::prelude::*;
use tracing::debug;

/// Searches proofs in parallel until one has at least `difficulty` leading zero bits
/// against `previous_proof`. Returns `None` if `cancelled` fires first.
pub fn find_proof_parallel<C>(previous_proof: u64, difficulty: u32, cancelled: C) -> Option<u64>
where
    C: Fn() -> bool + Send + Sync,
{
    // Rayon splits the range across threads; a cancelled search stops on the
    // first candidate any worker looks at.
    let found = (0u64..u64::MAX)
        .into_par_iter()
        .find_any(|proof| cancelled() || pow::is_valid_proof(*proof, previous_proof, difficulty))?;

    if pow::is_valid_proof(found, previous_proof, difficulty) {
        debug!(previous_proof, proof = found, "parallel search found proof");
        Some(found)
    } else {
        None
    }
}

impl MiningStrategy {
    pub fn find_proof<C>(self, previous_proof: u64, difficulty: u32, cancelled: C) -> Option<u64>
    where
        C: Fn() -> bool + Send + Sync,
    {
        match self {
            MiningStrategy::Sequential => pow::find_proof(previous_proof, difficulty, cancelled),
            MiningStrategy::Parallel => find_proof_parallel(previous_proof, difficulty, cancelled),
        }
    }
}
