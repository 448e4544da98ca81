use std::sync::Arc;

use watchtower_db::{records::ProposalRecord, SlasherDb};
use watchtower_types::{block::BlockHeaderSummary, slashing::ProposerSlashingPair};

use crate::{locks::ValidatorLocks, DetectionError};

/// Proposal-side detection capability.
pub trait ProposalsDetector: Send + Sync {
    /// Checks the header against the proposer's recorded proposal for that
    /// slot and returns the confirmed pair, if any.
    fn detect(
        &self,
        header: &BlockHeaderSummary,
    ) -> Result<Option<ProposerSlashingPair>, DetectionError>;
}

/// Production detector over last-proposal records.
pub struct ProposeDetector<D> {
    db: Arc<D>,
    locks: ValidatorLocks,
}

impl<D: SlasherDb> ProposeDetector<D> {
    pub fn new(db: Arc<D>) -> Self {
        Self {
            db,
            locks: ValidatorLocks::new(),
        }
    }
}

impl<D: SlasherDb> ProposalsDetector for ProposeDetector<D> {
    fn detect(
        &self,
        header: &BlockHeaderSummary,
    ) -> Result<Option<ProposerSlashingPair>, DetectionError> {
        let _guard = self.locks.lock(header.proposer_index);

        let existing = self.db.proposal(header.proposer_index, header.slot)?;
        match existing {
            None => {
                self.db.save_proposal(
                    header.proposer_index,
                    header.slot,
                    ProposalRecord {
                        signing_digest: header.signing_digest,
                    },
                )?;
                Ok(None)
            }
            Some(record) if record.signing_digest == header.signing_digest => Ok(None),
            Some(record) => {
                // The new digest replaces the old one, so a third conflicting
                // proposal pairs against this one rather than the first.
                self.db.save_proposal(
                    header.proposer_index,
                    header.slot,
                    ProposalRecord {
                        signing_digest: header.signing_digest,
                    },
                )?;
                Ok(Some(ProposerSlashingPair {
                    header_1: BlockHeaderSummary {
                        slot: header.slot,
                        proposer_index: header.proposer_index,
                        signing_digest: record.signing_digest,
                    },
                    header_2: *header,
                }))
            }
        }
    }
}
