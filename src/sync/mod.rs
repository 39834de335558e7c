use crate::{
    domain::{ItemId, PipelineSnapshot, Stage},
    error::{RemoteError, Result},
};
use async_trait::async_trait;

#[cfg(feature = "file-sync")]
pub mod file_sync;
pub mod memory;

/// Inbound fetch of the whole pipeline
#[async_trait]
pub trait PipelineSource: Send + Sync {
    /// Loads stages, items by stage, and per-stage counts
    async fn fetch_pipeline(&self) -> Result<PipelineSnapshot>;
}

/// Outbound stage mutation.
///
/// The only write the board performs. Implementations may call the network
/// directly, batch calls, or stand in for a backend in tests.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Moves an item to a new stage on the backend
    async fn commit_transition(
        &self,
        item_id: &ItemId,
        to_stage: &Stage,
    ) -> std::result::Result<(), RemoteError>;
}
