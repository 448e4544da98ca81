use alloy_primitives::B256;

pub type Epoch = u64;           //epoch number
pub type Root = B256;           //hash tree root
pub type Slot = u64;            //slot number
pub type ValidatorIndex = u64;  //validator registry index
