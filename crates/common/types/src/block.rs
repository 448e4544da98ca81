use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash::TreeHash as _;
use tree_hash_derive::TreeHash;

use crate::{
    primitives::{Slot, ValidatorIndex},
    signature::BlsSignature,
};

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconBlockHeader {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: B256,
    pub state_root: B256,
    pub body_root: B256,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct SignedBeaconBlockHeader {
    pub message: BeaconBlockHeader,
    pub signature: BlsSignature,
}

/// A proposed block reduced to the fields proposal detection reads.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BlockHeaderSummary {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub signing_digest: B256,
}

impl BlockHeaderSummary {
    pub fn from_signed_header(header: &SignedBeaconBlockHeader) -> Self {
        Self {
            slot: header.message.slot,
            proposer_index: header.message.proposer_index,
            signing_digest: header.message.tree_hash_root(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::b256;

    use super::*;

    #[test]
    fn test_summary_digest_distinguishes_blocks() {
        let header = |body_root| SignedBeaconBlockHeader {
            message: BeaconBlockHeader {
                slot: 100,
                proposer_index: 3,
                parent_root: B256::ZERO,
                state_root: B256::ZERO,
                body_root,
            },
            signature: BlsSignature::empty(),
        };

        let first = BlockHeaderSummary::from_signed_header(&header(b256!(
            "1111111111111111111111111111111111111111111111111111111111111111"
        )));
        let second = BlockHeaderSummary::from_signed_header(&header(b256!(
            "2222222222222222222222222222222222222222222222222222222222222222"
        )));

        assert_eq!(first.slot, second.slot);
        assert_eq!(first.proposer_index, second.proposer_index);
        assert_ne!(first.signing_digest, second.signing_digest);
    }
}
