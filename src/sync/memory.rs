use crate::{
    domain::{ItemId, PipelineSnapshot, Stage, StageCollection},
    error::{RemoteError, Result},
    sync::{PipelineSource, RemoteSync},
};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// A commit the backend received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitCall {
    pub item_id: ItemId,
    pub to_stage: Stage,
}

#[derive(Debug)]
struct MemoryState {
    collection: StageCollection,
    scripted_failures: VecDeque<String>,
    calls: Vec<CommitCall>,
}

/// In-process backend for tests and demos.
///
/// Successful commits are applied to the backend's own copy of the pipeline;
/// failures can be scripted ahead of time.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new(collection: StageCollection) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                collection,
                scripted_failures: VecDeque::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Makes the next commit fail with the given reason
    pub async fn fail_next(&self, reason: impl Into<String>) {
        self.state
            .lock()
            .await
            .scripted_failures
            .push_back(reason.into());
    }

    /// Every commit received so far, in order
    pub async fn calls(&self) -> Vec<CommitCall> {
        self.state.lock().await.calls.clone()
    }

    /// The backend's view of the pipeline
    pub async fn collection(&self) -> StageCollection {
        self.state.lock().await.collection.clone()
    }
}

#[async_trait]
impl PipelineSource for MemoryBackend {
    async fn fetch_pipeline(&self) -> Result<PipelineSnapshot> {
        Ok(self.state.lock().await.collection.to_snapshot())
    }
}

#[async_trait]
impl RemoteSync for MemoryBackend {
    async fn commit_transition(
        &self,
        item_id: &ItemId,
        to_stage: &Stage,
    ) -> std::result::Result<(), RemoteError> {
        let mut state = self.state.lock().await;
        state.calls.push(CommitCall {
            item_id: item_id.clone(),
            to_stage: to_stage.clone(),
        });

        if let Some(reason) = state.scripted_failures.pop_front() {
            return Err(RemoteError::new(reason));
        }

        let from_stage = state
            .collection
            .stage_of(item_id)
            .cloned()
            .ok_or_else(|| RemoteError::new(format!("Referral {} not found", item_id)))?;
        let next = state
            .collection
            .with_moved(item_id, &from_stage, to_stage)
            .map_err(|e| RemoteError::new(e.to_string()))?;
        state.collection = next;

        Ok(())
    }
}
