pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const POW_TARGET_DIFFICULTY: u32 = 16;
/// Highest difficulty a node will search for.
pub const MAX_DIFFICULTY: u32 = 64;
pub const GENESIS_PROOF: u64 = 100;
pub const GENESIS_TIMESTAMP: u64 = 0;
pub const GENESIS_PREVIOUS_HASH: [u8; HASH_SIZE] = [0u8; HASH_SIZE];
pub const FETCH_TIMEOUT_SECS: u64 = 5;
/// Sequential proof search polls its cancellation predicate once per this many attempts.
pub const CANCEL_CHECK_INTERVAL: u64 = 1024;
