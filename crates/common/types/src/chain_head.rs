use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

use crate::primitives::Epoch;

/// Highest epoch historical detection has completed, persisted so backfill
/// can resume where it left off.
#[derive(
    Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Encode, Decode, TreeHash,
)]
pub struct ChainHead {
    pub head_epoch: Epoch,
}
