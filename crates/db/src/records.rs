use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use watchtower_types::{
    attestation::IndexedVote,
    primitives::{Epoch, ValidatorIndex},
};

/// Min-max surround distances recorded at one (validator, epoch) cell.
///
/// `min_span` is the smallest `target - epoch` over recorded votes sourced
/// strictly after this epoch; `max_span` is the largest `target - epoch` over
/// votes sourced strictly before it. Zero means no relevant neighboring vote
/// has been recorded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSpans {
    pub min_span: u16,
    pub max_span: u16,
}

/// Stored when a validator casts a vote targeting this epoch. Carries enough
/// of the vote to rebuild it when a later vote conflicts with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub source_epoch: Epoch,
    pub attesting_root: B256,
    pub signing_digest: B256,
}

impl VoteRecord {
    pub fn from_vote(vote: &IndexedVote) -> Self {
        Self {
            source_epoch: vote.source_epoch,
            attesting_root: vote.attesting_root,
            signing_digest: vote.signing_digest,
        }
    }

    /// Rebuilds the vote this record was taken from. The target epoch is the
    /// record's own key and must be supplied by the caller.
    pub fn to_vote(&self, validator_index: ValidatorIndex, target_epoch: Epoch) -> IndexedVote {
        IndexedVote {
            validator_index,
            source_epoch: self.source_epoch,
            target_epoch,
            attesting_root: self.attesting_root,
            signing_digest: self.signing_digest,
        }
    }
}

/// Digest of the last proposal seen for a (proposer, slot). A differing
/// digest arriving at the same key is the slashing signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub signing_digest: B256,
}
