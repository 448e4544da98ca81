use std::sync::Arc;

use anyhow::anyhow;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};
use watchtower_db::SlasherDb;
use watchtower_executor::TaskExecutor;
use watchtower_types::{
    attestation::IndexedVote,
    block::BlockHeaderSummary,
    chain_head::ChainHead,
    slashing::{AttesterSlashingPair, ProposerSlashingPair},
};

use crate::{
    attestations::{MinMaxSpanDetector, SpanDetector},
    beacon_client::ChainDataClient,
    proposals::{ProposalsDetector, ProposeDetector},
};

/// Intake buffers are deliberately tiny: a slow detector stalls the feeder
/// instead of dropping data, since every vote and block must be processed.
const INTAKE_CAPACITY: usize = 1;
const FEED_CAPACITY: usize = 32;

/// Options for the detection service.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Skip the one-time detection pass over historical chain data.
    pub disable_historical_detection: bool,
}

/// Orchestrates historical and live slashing detection and publishes every
/// confirmed slashing to the outgoing feeds.
pub struct DetectionService<D, C> {
    config: ServiceConfig,
    db: Arc<D>,
    client: Arc<C>,
    span_detector: Arc<dyn SpanDetector>,
    proposals_detector: Arc<dyn ProposalsDetector>,
    blocks_tx: mpsc::Sender<BlockHeaderSummary>,
    blocks_rx: Mutex<Option<mpsc::Receiver<BlockHeaderSummary>>>,
    votes_tx: mpsc::Sender<IndexedVote>,
    votes_rx: Mutex<Option<mpsc::Receiver<IndexedVote>>>,
    attester_slashings_feed: broadcast::Sender<AttesterSlashingPair>,
    proposer_slashings_feed: broadcast::Sender<ProposerSlashingPair>,
    shutdown: broadcast::Sender<()>,
    fatal: RwLock<Option<String>>,
}

impl<D, C> DetectionService<D, C>
where
    D: SlasherDb + 'static,
    C: ChainDataClient + 'static,
{
    pub fn new(config: ServiceConfig, db: Arc<D>, client: Arc<C>) -> Self {
        let (blocks_tx, blocks_rx) = mpsc::channel(INTAKE_CAPACITY);
        let (votes_tx, votes_rx) = mpsc::channel(INTAKE_CAPACITY);
        let (attester_slashings_feed, _) = broadcast::channel(FEED_CAPACITY);
        let (proposer_slashings_feed, _) = broadcast::channel(FEED_CAPACITY);
        let (shutdown, _) = broadcast::channel(1);

        Self {
            config,
            span_detector: Arc::new(MinMaxSpanDetector::new(db.clone())),
            proposals_detector: Arc::new(ProposeDetector::new(db.clone())),
            db,
            client,
            blocks_tx,
            blocks_rx: Mutex::new(Some(blocks_rx)),
            votes_tx,
            votes_rx: Mutex::new(Some(votes_rx)),
            attester_slashings_feed,
            proposer_slashings_feed,
            shutdown,
            fatal: RwLock::new(None),
        }
    }

    /// Intake handle for live block headers.
    pub fn block_feed(&self) -> mpsc::Sender<BlockHeaderSummary> {
        self.blocks_tx.clone()
    }

    /// Intake handle for live indexed votes.
    pub fn vote_feed(&self) -> mpsc::Sender<IndexedVote> {
        self.votes_tx.clone()
    }

    pub fn subscribe_attester_slashings(&self) -> broadcast::Receiver<AttesterSlashingPair> {
        self.attester_slashings_feed.subscribe()
    }

    pub fn subscribe_proposer_slashings(&self) -> broadcast::Receiver<ProposerSlashingPair> {
        self.proposer_slashings_feed.subscribe()
    }

    /// Blocks until the upstream node reports ready, then spawns the
    /// historical and live detection loops.
    pub async fn start(self: Arc<Self>, executor: &TaskExecutor) {
        // No detection work happens before the upstream node is synced.
        self.client.wait_until_ready().await;

        if !self.config.disable_historical_detection {
            let service = self.clone();
            let shutdown = self.shutdown.subscribe();
            let _ = executor.spawn(async move {
                service.detect_historical_chain_data(shutdown).await;
            });
        }

        let service = self.clone();
        let shutdown = self.shutdown.subscribe();
        let blocks_rx = self
            .blocks_rx
            .lock()
            .take()
            .expect("detection service started twice");
        let _ = executor.spawn(async move {
            service.process_incoming_blocks(blocks_rx, shutdown).await;
        });

        let service = self.clone();
        let shutdown = self.shutdown.subscribe();
        let votes_rx = self
            .votes_rx
            .lock()
            .take()
            .expect("detection service started twice");
        let _ = executor.spawn(async move {
            service.process_incoming_votes(votes_rx, shutdown).await;
        });
    }

    /// Signals every detection loop to stop. Returns without waiting for
    /// in-flight epoch processing to drain.
    pub fn stop(&self) {
        info!("Stopping detection service");
        let _ = self.shutdown.send(());
    }

    /// Reports whether the service has failed fatally. Per-item detection
    /// errors never surface here.
    pub fn status(&self) -> anyhow::Result<()> {
        match &*self.fatal.read() {
            Some(reason) => Err(anyhow!("{reason}")),
            None => Ok(()),
        }
    }

    fn record_fatal(&self, reason: String) {
        error!("{reason}");
        *self.fatal.write() = Some(reason);
        let _ = self.shutdown.send(());
    }

    /// One-time detection pass over every epoch between the persisted
    /// checkpoint and the current chain head.
    async fn detect_historical_chain_data(&self, mut shutdown: broadcast::Receiver<()>) {
        let checkpoint = match self.db.chain_head() {
            Ok(head) => head.unwrap_or_default().head_epoch,
            Err(err) => {
                self.record_fatal(format!("could not load detection checkpoint: {err}"));
                return;
            }
        };
        let current_head = match self.client.chain_head().await {
            Ok(head) => head,
            Err(err) => {
                self.record_fatal(format!("could not fetch chain head from upstream node: {err}"));
                return;
            }
        };

        for epoch in checkpoint..current_head.head_epoch {
            let votes = tokio::select! {
                _ = shutdown.recv() => return,
                fetched = self.client.historical_votes(epoch) => match fetched {
                    Ok(votes) => votes,
                    Err(err) => {
                        // Checkpoint stays put so this epoch is retried on
                        // the next run.
                        error!(epoch, error = %err, "Could not fetch historical votes for epoch");
                        continue;
                    }
                },
            };

            debug!(
                count = votes.len(),
                epoch, "Running slashing detection on historical votes"
            );

            for vote in &votes {
                match self.span_detector.detect(vote) {
                    Ok(slashings) => self.publish_attester_slashings(slashings),
                    Err(err) => {
                        error!(
                            validator_index = vote.validator_index,
                            epoch,
                            error = %err,
                            "Could not detect attester slashings"
                        );
                    }
                }
            }

            if let Err(err) = self.db.save_chain_head(ChainHead { head_epoch: epoch }) {
                error!(epoch, error = %err, "Could not persist detection checkpoint");
            }
        }

        info!(
            head_epoch = current_head.head_epoch,
            "Completed slashing detection on historical chain data"
        );
    }

    async fn process_incoming_blocks(
        &self,
        mut blocks_rx: mpsc::Receiver<BlockHeaderSummary>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.recv() => return,
                received = blocks_rx.recv() => {
                    let Some(header) = received else { return };
                    match self.proposals_detector.detect(&header) {
                        Ok(Some(slashing)) => self.publish_proposer_slashing(slashing),
                        Ok(None) => {}
                        Err(err) => error!(
                            proposer_index = header.proposer_index,
                            slot = header.slot,
                            error = %err,
                            "Could not detect proposer slashing"
                        ),
                    }
                }
            }
        }
    }

    async fn process_incoming_votes(
        &self,
        mut votes_rx: mpsc::Receiver<IndexedVote>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.recv() => return,
                received = votes_rx.recv() => {
                    let Some(vote) = received else { return };
                    match self.span_detector.detect(&vote) {
                        Ok(slashings) => self.publish_attester_slashings(slashings),
                        Err(err) => error!(
                            validator_index = vote.validator_index,
                            target_epoch = vote.target_epoch,
                            error = %err,
                            "Could not detect attester slashings"
                        ),
                    }
                }
            }
        }
    }

    fn publish_attester_slashings(&self, slashings: Vec<AttesterSlashingPair>) {
        for slashing in slashings {
            info!(
                validator_index = slashing.vote_2.validator_index,
                source_epoch = slashing.vote_2.source_epoch,
                target_epoch = slashing.vote_2.target_epoch,
                surround_vote = slashing.is_surround_vote(),
                "Found an attester slashing! Submitting to the feed"
            );
            let _ = self.attester_slashings_feed.send(slashing);
        }
    }

    fn publish_proposer_slashing(&self, slashing: ProposerSlashingPair) {
        info!(
            proposer_index = slashing.header_1.proposer_index,
            slot = slashing.header_1.slot,
            "Found a proposer slashing! Submitting to the feed"
        );
        let _ = self.proposer_slashings_feed.send(slashing);
    }
}
