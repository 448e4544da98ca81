use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

use crate::{attestation::IndexedVote, block::BlockHeaderSummary};

/// Two mutually incompatible votes by the same validator.
///
/// For surround slashings `vote_1` is the surrounding vote; for double votes
/// it is the previously recorded one.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct AttesterSlashingPair {
    pub vote_1: IndexedVote,
    pub vote_2: IndexedVote,
}

impl AttesterSlashingPair {
    pub fn is_surround_vote(&self) -> bool {
        self.vote_1.is_surrounding(&self.vote_2) || self.vote_2.is_surrounding(&self.vote_1)
    }

    pub fn is_double_vote(&self) -> bool {
        self.vote_1.is_double_vote(&self.vote_2)
    }
}

/// Two distinct proposals for the same slot by the same proposer.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct ProposerSlashingPair {
    pub header_1: BlockHeaderSummary,
    pub header_2: BlockHeaderSummary,
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{b256, B256};

    use super::*;

    fn vote(source: u64, target: u64, digest: B256) -> IndexedVote {
        IndexedVote {
            validator_index: 5,
            source_epoch: source,
            target_epoch: target,
            attesting_root: B256::ZERO,
            signing_digest: digest,
        }
    }

    #[test]
    fn test_pair_kind() {
        let surround = AttesterSlashingPair {
            vote_1: vote(0, 3, B256::ZERO),
            vote_2: vote(1, 2, B256::ZERO),
        };
        assert!(surround.is_surround_vote());
        assert!(!surround.is_double_vote());

        let double = AttesterSlashingPair {
            vote_1: vote(1, 2, b256!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")),
            vote_2: vote(1, 2, b256!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb")),
        };
        assert!(double.is_double_vote());
        assert!(!double.is_surround_vote());
    }
}
