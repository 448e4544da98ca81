pub mod attestations;
pub mod beacon_client;
pub mod proposals;
pub mod service;

mod locks;

use thiserror::Error;
use watchtower_db::DbError;
use watchtower_types::primitives::Epoch;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("malformed vote: source epoch {source_epoch} is not below target epoch {target}")]
    MalformedVote { source_epoch: Epoch, target: Epoch },
    #[error(transparent)]
    Db(#[from] DbError),
}
