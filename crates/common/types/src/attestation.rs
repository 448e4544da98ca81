use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash::TreeHash as _;
use tree_hash_derive::TreeHash;

use crate::primitives::{Epoch, ValidatorIndex};

#[derive(
    Debug, Eq, Hash, PartialEq, Clone, Copy, Serialize, Deserialize, Encode, Decode, TreeHash,
)]
pub struct Checkpoint {
    pub epoch: Epoch,
    pub root: B256,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct AttestationData {
    pub slot: u64,
    pub index: u64,

    /// LMD GHOST vote
    pub beacon_block_root: B256,

    /// FFG vote
    pub source: Checkpoint,
    pub target: Checkpoint,
}

/// One validator's attestation reduced to the fields slashing detection reads.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct IndexedVote {
    pub validator_index: ValidatorIndex,
    pub source_epoch: Epoch,
    pub target_epoch: Epoch,
    pub attesting_root: B256,
    pub signing_digest: B256,
}

impl IndexedVote {
    pub fn from_attestation(validator_index: ValidatorIndex, data: &AttestationData) -> Self {
        Self {
            validator_index,
            source_epoch: data.source.epoch,
            target_epoch: data.target.epoch,
            attesting_root: data.beacon_block_root,
            signing_digest: data.tree_hash_root(),
        }
    }

    /// Epoch distance between source and target.
    pub fn distance(&self) -> u64 {
        self.target_epoch.saturating_sub(self.source_epoch)
    }

    /// Same target epoch, different attested data.
    pub fn is_double_vote(&self, other: &IndexedVote) -> bool {
        self.target_epoch == other.target_epoch && self.signing_digest != other.signing_digest
    }

    /// `self`'s source-target range strictly encloses `other`'s.
    pub fn is_surrounding(&self, other: &IndexedVote) -> bool {
        self.source_epoch < other.source_epoch && other.target_epoch < self.target_epoch
    }

    pub fn is_surrounded_by(&self, other: &IndexedVote) -> bool {
        other.is_surrounding(self)
    }
}
