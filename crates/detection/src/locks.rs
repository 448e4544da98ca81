use parking_lot::{Mutex, MutexGuard};
use watchtower_types::primitives::ValidatorIndex;

const LOCK_SHARDS: u64 = 64;

/// Arena of per-validator-shard locks.
///
/// A detector holds the validator's lock across its whole read-modify-write,
/// so the live stream and the historical backfill cannot interleave updates
/// to the same validator's records. Different validators land on different
/// shards and proceed in parallel.
pub(crate) struct ValidatorLocks {
    shards: Vec<Mutex<()>>,
}

impl ValidatorLocks {
    pub(crate) fn new() -> Self {
        Self {
            shards: (0..LOCK_SHARDS).map(|_| Mutex::new(())).collect(),
        }
    }

    pub(crate) fn lock(&self, validator_index: ValidatorIndex) -> MutexGuard<'_, ()> {
        self.shards[(validator_index % LOCK_SHARDS) as usize].lock()
    }
}
