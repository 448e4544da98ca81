use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{typenum, FixedVector};
use tree_hash_derive::TreeHash;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BlsSignature {
    pub signature: FixedVector<u8, typenum::U96>,
}

impl BlsSignature {
    /// All-zero placeholder, used where the signature is not inspected.
    pub fn empty() -> Self {
        Self {
            signature: FixedVector::from(vec![0; 96]),
        }
    }
}
