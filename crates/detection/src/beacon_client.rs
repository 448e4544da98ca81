use async_trait::async_trait;
use watchtower_types::{attestation::IndexedVote, chain_head::ChainHead, primitives::Epoch};

/// Upstream chain-data source: a synced node that streams consensus data
/// and answers historical range queries.
#[async_trait]
pub trait ChainDataClient: Send + Sync {
    /// Resolves once the upstream node is synced and serving data. Observed
    /// exactly once, before any detection work starts.
    async fn wait_until_ready(&self);

    /// Current head of the chain as seen by the upstream node.
    async fn chain_head(&self) -> anyhow::Result<ChainHead>;

    /// Every indexed vote cast in the given epoch.
    async fn historical_votes(&self, epoch: Epoch) -> anyhow::Result<Vec<IndexedVote>>;
}
