use std::collections::HashMap;

use parking_lot::RwLock;
use watchtower_types::{
    chain_head::ChainHead,
    primitives::{Epoch, Slot, ValidatorIndex},
};

use crate::{
    records::{EpochSpans, ProposalRecord, VoteRecord},
    DbError, SlasherDb,
};

const SHARD_COUNT: u64 = 64;

#[derive(Default)]
struct Shard {
    spans: HashMap<(ValidatorIndex, Epoch), EpochSpans>,
    votes: HashMap<(ValidatorIndex, Epoch), Vec<VoteRecord>>,
    proposals: HashMap<(ValidatorIndex, Slot), ProposalRecord>,
}

/// In-memory store sharded by validator index, so concurrent detection on
/// different validators never contends on a single lock.
pub struct MemoryDb {
    shards: Vec<RwLock<Shard>>,
    chain_head: RwLock<Option<ChainHead>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT)
                .map(|_| RwLock::new(Shard::default()))
                .collect(),
            chain_head: RwLock::new(None),
        }
    }

    fn shard(&self, validator_index: ValidatorIndex) -> &RwLock<Shard> {
        &self.shards[(validator_index % SHARD_COUNT) as usize]
    }
}

impl Default for MemoryDb {
    fn default() -> Self {
        Self::new()
    }
}

impl SlasherDb for MemoryDb {
    fn chain_head(&self) -> Result<Option<ChainHead>, DbError> {
        Ok(*self.chain_head.read())
    }

    fn save_chain_head(&self, head: ChainHead) -> Result<(), DbError> {
        *self.chain_head.write() = Some(head);
        Ok(())
    }

    fn epoch_spans(
        &self,
        validator_index: ValidatorIndex,
        epoch: Epoch,
    ) -> Result<EpochSpans, DbError> {
        let shard = self.shard(validator_index).read();
        Ok(shard
            .spans
            .get(&(validator_index, epoch))
            .copied()
            .unwrap_or_default())
    }

    fn save_epoch_spans(
        &self,
        validator_index: ValidatorIndex,
        epoch: Epoch,
        spans: EpochSpans,
    ) -> Result<(), DbError> {
        let mut shard = self.shard(validator_index).write();
        shard.spans.insert((validator_index, epoch), spans);
        Ok(())
    }

    fn vote_records(
        &self,
        validator_index: ValidatorIndex,
        target_epoch: Epoch,
    ) -> Result<Vec<VoteRecord>, DbError> {
        let shard = self.shard(validator_index).read();
        Ok(shard
            .votes
            .get(&(validator_index, target_epoch))
            .cloned()
            .unwrap_or_default())
    }

    fn save_vote_record(
        &self,
        validator_index: ValidatorIndex,
        target_epoch: Epoch,
        record: VoteRecord,
    ) -> Result<(), DbError> {
        let mut shard = self.shard(validator_index).write();
        let records = shard
            .votes
            .entry((validator_index, target_epoch))
            .or_default();
        if !records
            .iter()
            .any(|existing| existing.signing_digest == record.signing_digest)
        {
            records.push(record);
        }
        Ok(())
    }

    fn proposal(
        &self,
        proposer_index: ValidatorIndex,
        slot: Slot,
    ) -> Result<Option<ProposalRecord>, DbError> {
        let shard = self.shard(proposer_index).read();
        Ok(shard.proposals.get(&(proposer_index, slot)).copied())
    }

    fn save_proposal(
        &self,
        proposer_index: ValidatorIndex,
        slot: Slot,
        record: ProposalRecord,
    ) -> Result<(), DbError> {
        let mut shard = self.shard(proposer_index).write();
        shard.proposals.insert((proposer_index, slot), record);
        Ok(())
    }
}
