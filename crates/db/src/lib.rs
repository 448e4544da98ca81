pub mod memory;
pub mod records;

use thiserror::Error;
use watchtower_types::{
    chain_head::ChainHead,
    primitives::{Epoch, Slot, ValidatorIndex},
};

use crate::records::{EpochSpans, ProposalRecord, VoteRecord};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Store boundary for the detection engine.
///
/// Implementations must make each call atomic on its own. Callers that need
/// an atomic read-modify-write across several calls serialize per validator
/// above this trait.
pub trait SlasherDb: Send + Sync {
    fn chain_head(&self) -> Result<Option<ChainHead>, DbError>;
    fn save_chain_head(&self, head: ChainHead) -> Result<(), DbError>;

    fn epoch_spans(
        &self,
        validator_index: ValidatorIndex,
        epoch: Epoch,
    ) -> Result<EpochSpans, DbError>;
    fn save_epoch_spans(
        &self,
        validator_index: ValidatorIndex,
        epoch: Epoch,
        spans: EpochSpans,
    ) -> Result<(), DbError>;

    /// Every vote recorded for the validator targeting the given epoch, in
    /// insertion order.
    fn vote_records(
        &self,
        validator_index: ValidatorIndex,
        target_epoch: Epoch,
    ) -> Result<Vec<VoteRecord>, DbError>;
    /// Appends a vote record. Records are deduplicated by signing digest;
    /// appending an already-present digest is a no-op.
    fn save_vote_record(
        &self,
        validator_index: ValidatorIndex,
        target_epoch: Epoch,
        record: VoteRecord,
    ) -> Result<(), DbError>;

    fn proposal(
        &self,
        proposer_index: ValidatorIndex,
        slot: Slot,
    ) -> Result<Option<ProposalRecord>, DbError>;
    fn save_proposal(
        &self,
        proposer_index: ValidatorIndex,
        slot: Slot,
        record: ProposalRecord,
    ) -> Result<(), DbError>;
}
