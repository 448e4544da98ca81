use std::sync::Arc;

use tracing::warn;
use watchtower_db::{records::VoteRecord, SlasherDb};
use watchtower_types::{
    attestation::IndexedVote,
    constants::MAX_SPAN,
    primitives::{Epoch, ValidatorIndex},
    slashing::AttesterSlashingPair,
};

use crate::{locks::ValidatorLocks, DetectionError};

/// Attestation-side detection capability.
pub trait SpanDetector: Send + Sync {
    /// Runs the vote through the double-vote and surround checks, folds it
    /// into the validator's span records, and returns every confirmed pair.
    fn detect(&self, vote: &IndexedVote) -> Result<Vec<AttesterSlashingPair>, DetectionError>;
}

/// Production detector over min-max span records.
///
/// The span records form a transitive closure: inserting a vote propagates
/// its target distance to every epoch it tightens, so a conflict with any
/// earlier vote is always visible at the new vote's own source epoch. Cost
/// per vote is proportional to the vote's source-target distance, never to
/// the validator's full history.
pub struct MinMaxSpanDetector<D> {
    db: Arc<D>,
    locks: ValidatorLocks,
}

impl<D: SlasherDb> MinMaxSpanDetector<D> {
    pub fn new(db: Arc<D>) -> Self {
        Self {
            db,
            locks: ValidatorLocks::new(),
        }
    }

    /// Votes targeting `source + min_span` sit strictly inside the new
    /// vote's range; the new vote surrounds them.
    fn detect_surrounded(
        &self,
        vote: &IndexedVote,
        min_span: u64,
        slashings: &mut Vec<AttesterSlashingPair>,
    ) -> Result<(), DetectionError> {
        let slashable_epoch = vote.source_epoch + min_span;
        for record in self.db.vote_records(vote.validator_index, slashable_epoch)? {
            let prior = record.to_vote(vote.validator_index, slashable_epoch);
            if vote.is_surrounding(&prior) {
                slashings.push(AttesterSlashingPair {
                    vote_1: *vote,
                    vote_2: prior,
                });
            }
        }
        Ok(())
    }

    /// Votes targeting `source + max_span` reach past the new vote's target
    /// from an earlier source; they surround the new vote.
    fn detect_surrounding(
        &self,
        vote: &IndexedVote,
        max_span: u64,
        slashings: &mut Vec<AttesterSlashingPair>,
    ) -> Result<(), DetectionError> {
        let slashable_epoch = vote.source_epoch + max_span;
        for record in self.db.vote_records(vote.validator_index, slashable_epoch)? {
            let prior = record.to_vote(vote.validator_index, slashable_epoch);
            if prior.is_surrounding(vote) {
                slashings.push(AttesterSlashingPair {
                    vote_1: prior,
                    vote_2: *vote,
                });
            }
        }
        Ok(())
    }

    fn update_min_spans(
        &self,
        validator_index: ValidatorIndex,
        source: Epoch,
        target: Epoch,
    ) -> Result<(), DetectionError> {
        let lowest = target.saturating_sub(MAX_SPAN);
        let mut epoch = source;
        while epoch > lowest {
            epoch -= 1;
            let new_span = (target - epoch) as u16;
            let mut spans = self.db.epoch_spans(validator_index, epoch)?;
            if spans.min_span == 0 || new_span < spans.min_span {
                spans.min_span = new_span;
                self.db.save_epoch_spans(validator_index, epoch, spans)?;
            } else {
                // Closure invariant: earlier epochs already hold a bound at
                // least this tight.
                break;
            }
        }
        Ok(())
    }

    fn update_max_spans(
        &self,
        validator_index: ValidatorIndex,
        source: Epoch,
        target: Epoch,
    ) -> Result<(), DetectionError> {
        for epoch in source + 1..target {
            let new_span = (target - epoch) as u16;
            let mut spans = self.db.epoch_spans(validator_index, epoch)?;
            if new_span > spans.max_span {
                spans.max_span = new_span;
                self.db.save_epoch_spans(validator_index, epoch, spans)?;
            } else {
                break;
            }
        }
        Ok(())
    }
}

impl<D: SlasherDb> SpanDetector for MinMaxSpanDetector<D> {
    fn detect(&self, vote: &IndexedVote) -> Result<Vec<AttesterSlashingPair>, DetectionError> {
        if vote.source_epoch >= vote.target_epoch {
            return Err(DetectionError::MalformedVote {
                source_epoch: vote.source_epoch,
                target: vote.target_epoch,
            });
        }

        let validator_index = vote.validator_index;
        let source = vote.source_epoch;
        let target = vote.target_epoch;
        let distance = vote.distance();

        let _guard = self.locks.lock(validator_index);

        let targeting_same_epoch = self.db.vote_records(validator_index, target)?;
        if targeting_same_epoch
            .iter()
            .any(|record| record.signing_digest == vote.signing_digest)
        {
            // Redelivery of a vote already folded into the records.
            return Ok(Vec::new());
        }

        let mut slashings = Vec::new();
        for record in &targeting_same_epoch {
            slashings.push(AttesterSlashingPair {
                vote_1: record.to_vote(validator_index, target),
                vote_2: *vote,
            });
        }

        if distance <= MAX_SPAN {
            let spans = self.db.epoch_spans(validator_index, source)?;

            let min_span = spans.min_span as u64;
            if min_span > 0 && min_span < distance {
                self.detect_surrounded(vote, min_span, &mut slashings)?;
            }

            let max_span = spans.max_span as u64;
            if max_span > distance {
                self.detect_surrounding(vote, max_span, &mut slashings)?;
            }

            self.update_min_spans(validator_index, source, target)?;
            self.update_max_spans(validator_index, source, target)?;
        } else {
            warn!(
                validator_index,
                source_epoch = source,
                target_epoch = target,
                "Vote span exceeds the trackable range, surround checks skipped"
            );
        }

        self.db
            .save_vote_record(validator_index, target, VoteRecord::from_vote(vote))?;

        Ok(slashings)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use proptest::prelude::*;
    use rstest::rstest;
    use watchtower_db::memory::MemoryDb;

    use super::*;

    fn detector() -> (Arc<MemoryDb>, MinMaxSpanDetector<MemoryDb>) {
        let db = Arc::new(MemoryDb::new());
        (db.clone(), MinMaxSpanDetector::new(db))
    }

    fn vote(validator_index: u64, source: Epoch, target: Epoch, digest_byte: u8) -> IndexedVote {
        IndexedVote {
            validator_index,
            source_epoch: source,
            target_epoch: target,
            attesting_root: B256::repeat_byte(digest_byte),
            signing_digest: B256::repeat_byte(digest_byte),
        }
    }

    #[rstest]
    #[case(1, 2, 0, 3)] // surrounded vote first
    #[case(0, 3, 1, 2)] // surrounding vote first
    fn test_surround_detected_in_either_order(
        #[case] source_a: Epoch,
        #[case] target_a: Epoch,
        #[case] source_b: Epoch,
        #[case] target_b: Epoch,
    ) {
        let (_, detector) = detector();
        let first = vote(5, source_a, target_a, 0x01);
        let second = vote(5, source_b, target_b, 0x02);

        assert_eq!(detector.detect(&first).unwrap(), Vec::new());
        let slashings = detector.detect(&second).unwrap();

        assert_eq!(slashings.len(), 1);
        let pair = slashings[0];
        assert!(pair.is_surround_vote());
        assert_eq!(pair.vote_1, vote(5, 0, 3, if source_a == 0 { 0x01 } else { 0x02 }));
        assert_eq!(pair.vote_2, vote(5, 1, 2, if source_a == 0 { 0x02 } else { 0x01 }));
    }

    #[test]
    fn test_double_vote_detected() {
        let (_, detector) = detector();
        let first = vote(7, 1, 2, 0xaa);
        let second = vote(7, 1, 2, 0xbb);

        assert_eq!(detector.detect(&first).unwrap(), Vec::new());
        let slashings = detector.detect(&second).unwrap();

        assert_eq!(slashings.len(), 1);
        assert!(slashings[0].is_double_vote());
        assert_eq!(slashings[0].vote_1, first);
        assert_eq!(slashings[0].vote_2, second);
    }

    #[test]
    fn test_third_vote_at_target_pairs_against_each_record() {
        let (_, detector) = detector();
        detector.detect(&vote(7, 1, 2, 0xaa)).unwrap();
        detector.detect(&vote(7, 1, 2, 0xbb)).unwrap();

        let slashings = detector.detect(&vote(7, 1, 2, 0xcc)).unwrap();
        assert_eq!(slashings.len(), 2);
        assert!(slashings.iter().all(|pair| pair.is_double_vote()));
    }

    #[test]
    fn test_non_conflicting_votes_yield_nothing() {
        let (db, detector) = detector();

        for (source, target) in [(0, 1), (1, 2), (2, 3), (3, 5)] {
            let slashings = detector.detect(&vote(1, source, target, target as u8)).unwrap();
            assert_eq!(slashings, Vec::new());
        }

        // Unrelated validators keep untouched spans.
        for epoch in 0..6 {
            assert_eq!(db.epoch_spans(2, epoch).unwrap(), Default::default());
        }
    }

    #[test]
    fn test_reinsertion_is_idempotent() {
        let (db, detector) = detector();
        let observed = vote(3, 4, 8, 0x11);

        detector.detect(&observed).unwrap();
        let spans_before: Vec<_> = (0..12)
            .map(|epoch| db.epoch_spans(3, epoch).unwrap())
            .collect();

        assert_eq!(detector.detect(&observed).unwrap(), Vec::new());
        let spans_after: Vec<_> = (0..12)
            .map(|epoch| db.epoch_spans(3, epoch).unwrap())
            .collect();

        assert_eq!(spans_before, spans_after);
    }

    #[test]
    fn test_malformed_vote_rejected() {
        let (_, detector) = detector();
        let degenerate = vote(1, 2, 2, 0x01);

        let result = detector.detect(&degenerate);
        assert!(matches!(
            result,
            Err(DetectionError::MalformedVote { source_epoch: 2, target: 2 })
        ));
    }

    #[test]
    fn test_overlong_span_is_a_gap_not_an_error() {
        let (_, detector) = detector();
        detector.detect(&vote(9, 5, 10, 0x01)).unwrap();

        // Would surround (5, 10), but the distance is untrackable.
        let wide = vote(9, 0, MAX_SPAN + 5, 0x02);
        assert_eq!(detector.detect(&wide).unwrap(), Vec::new());

        // Double votes at the same target are still caught.
        let conflicting_wide = vote(9, 0, MAX_SPAN + 5, 0x03);
        let slashings = detector.detect(&conflicting_wide).unwrap();
        assert_eq!(slashings.len(), 1);
        assert!(slashings[0].is_double_vote());
    }

    fn arb_vote() -> impl Strategy<Value = IndexedVote> {
        (0u64..12, 1u64..6, 0u8..3).prop_map(|(source, span, salt)| {
            let target = source + span;
            let mut digest = [0u8; 32];
            digest[0] = source as u8;
            digest[1] = target as u8;
            digest[2] = salt;
            digest[3] = 1;
            IndexedVote {
                validator_index: 11,
                source_epoch: source,
                target_epoch: target,
                attesting_root: B256::from(digest),
                signing_digest: B256::from(digest),
            }
        })
    }

    proptest! {
        // Every reported pair is genuinely slashable and refers to a vote
        // that was actually inserted; whenever the history holds a conflict
        // with a fresh vote, at least one pair comes out.
        #[test]
        fn prop_detection_agrees_with_exhaustive_history(
            votes in proptest::collection::vec(arb_vote(), 1..20)
        ) {
            let db = Arc::new(MemoryDb::new());
            let detector = MinMaxSpanDetector::new(db);
            let mut inserted: Vec<IndexedVote> = Vec::new();

            for vote in votes {
                let slashings = detector.detect(&vote).unwrap();

                for pair in &slashings {
                    prop_assert!(pair.is_surround_vote() || pair.is_double_vote());
                    prop_assert!(pair.vote_1 == vote || pair.vote_2 == vote);
                    let prior = if pair.vote_1 == vote { pair.vote_2 } else { pair.vote_1 };
                    prop_assert!(inserted.contains(&prior));
                }

                let duplicate = inserted.iter().any(|prior| {
                    prior.target_epoch == vote.target_epoch
                        && prior.signing_digest == vote.signing_digest
                });
                let conflicting = inserted.iter().any(|prior| {
                    vote.is_surrounding(prior)
                        || prior.is_surrounding(&vote)
                        || vote.is_double_vote(prior)
                });

                if duplicate {
                    prop_assert!(slashings.is_empty());
                } else if conflicting {
                    prop_assert!(!slashings.is_empty());
                }

                inserted.push(vote);
            }
        }

        // A surrounding pair alone is reported whichever vote arrives second.
        #[test]
        fn prop_lone_surround_pair_reported_in_either_order(
            outer_source in 0u64..10,
            inner_offset in 1u64..5,
            inner_span in 1u64..5,
            outer_margin in 1u64..5,
        ) {
            let inner_source = outer_source + inner_offset;
            let inner_target = inner_source + inner_span;
            let outer = vote(11, outer_source, inner_target + outer_margin, 0x01);
            let inner = vote(11, inner_source, inner_target, 0x02);

            for [first, second] in [[outer, inner], [inner, outer]] {
                let db = Arc::new(MemoryDb::new());
                let detector = MinMaxSpanDetector::new(db);

                prop_assert_eq!(detector.detect(&first).unwrap(), Vec::new());
                let slashings = detector.detect(&second).unwrap();
                prop_assert_eq!(
                    slashings,
                    vec![AttesterSlashingPair { vote_1: outer, vote_2: inner }]
                );
            }
        }
    }
}
