//! Drag-and-drop board controller.
//!
//! The controller owns the current [`StageCollection`] and publishes every
//! new version as a read-only snapshot. A drop is applied optimistically,
//! then committed through [`RemoteSync`]; if the backend rejects it the
//! inverse move is applied and the failure is reported on the error channel.
//!
//! Only one commit may be in flight per board. While a commit is pending,
//! new drags and drops are rejected with [`PipelineError::Busy`] and leave
//! the board untouched.

use crate::{
    domain::{
        transition::apply as apply_transition, ItemId, PipelineConfig, Stage, StageCollection,
        Transition,
    },
    error::{PipelineError, RemoteError, Result},
    sync::{PipelineSource, RemoteSync},
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Gesture state of the board
#[derive(Debug, Clone, PartialEq)]
pub enum BoardState {
    Idle,
    Dragging {
        item_id: ItemId,
        from_stage: Stage,
    },
    Committing {
        transition: Transition,
        inverse: Transition,
        // Shown again if the inverse cannot be applied
        before: Arc<StageCollection>,
    },
}

/// What happened to a drop
#[derive(Debug)]
pub enum DropOutcome {
    /// Applied optimistically; waiting for the backend
    Pending(Transition),
    /// Malformed or stale drag data; nothing was applied
    Ignored(PipelineError),
}

/// Final result of a move
#[derive(Debug)]
pub enum MoveOutcome {
    Committed(Transition),
    RolledBack {
        transition: Transition,
        error: RemoteError,
    },
    Ignored(PipelineError),
}

pub struct BoardController {
    config: PipelineConfig,
    sync: Arc<dyn RemoteSync>,
    state: BoardState,
    published: watch::Sender<Arc<StageCollection>>,
    // Only set while someone holds the receiving end
    errors: Option<mpsc::UnboundedSender<RemoteError>>,
    error_receiver_taken: bool,
}

impl BoardController {
    /// Creates a controller over an already built collection.
    ///
    /// The collection's stage list replaces the configured one.
    pub fn new(
        collection: StageCollection,
        sync: Arc<dyn RemoteSync>,
        config: PipelineConfig,
    ) -> Result<Self> {
        let config = config.with_stages(collection.stages().to_vec());
        config.validate()?;

        let (published, _) = watch::channel(Arc::new(collection));

        Ok(Self {
            config,
            sync,
            state: BoardState::Idle,
            published,
            errors: None,
            error_receiver_taken: false,
        })
    }

    /// Fetches the pipeline once and builds a controller for it
    pub async fn load(
        source: &dyn PipelineSource,
        sync: Arc<dyn RemoteSync>,
        config: PipelineConfig,
    ) -> Result<Self> {
        let snapshot = source.fetch_pipeline().await.map_err(|e| {
            warn!("failed to load pipeline: {}", e.load_message());
            e
        })?;
        let collection = StageCollection::from_snapshot(snapshot)?;
        debug!(
            stages = collection.stages().len(),
            items = collection.total(),
            "pipeline loaded"
        );

        Self::new(collection, sync, config)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, BoardState::Committing { .. })
    }

    /// The move waiting for the backend, if any
    pub fn pending(&self) -> Option<&Transition> {
        match &self.state {
            BoardState::Committing { transition, .. } => Some(transition),
            _ => None,
        }
    }

    /// The currently rendered collection
    pub fn collection(&self) -> Arc<StageCollection> {
        self.published.borrow().clone()
    }

    /// Receives every replaced collection
    pub fn subscribe(&self) -> watch::Receiver<Arc<StageCollection>> {
        self.published.subscribe()
    }

    /// Hands out the channel on which rollback reasons are reported.
    /// Returns `None` once it has been taken.
    pub fn take_error_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<RemoteError>> {
        if self.error_receiver_taken {
            return None;
        }

        let (errors, receiver) = mpsc::unbounded_channel();
        self.errors = Some(errors);
        self.error_receiver_taken = true;
        Some(receiver)
    }

    fn report(&mut self, error: RemoteError) {
        let Some(errors) = &self.errors else {
            return;
        };
        if errors.send(error).is_err() {
            debug!("error receiver dropped");
            self.errors = None;
        }
    }

    fn publish(&self, collection: Arc<StageCollection>) {
        self.published.send_replace(collection);
    }

    /// Starts dragging an item out of a stage
    pub fn drag_start(&mut self, item_id: ItemId, from_stage: Stage) -> Result<()> {
        if self.is_busy() {
            debug!(item = %item_id, "drag rejected while a commit is pending");
            return Err(PipelineError::Busy);
        }

        debug!(item = %item_id, stage = %from_stage, "drag started");
        self.state = BoardState::Dragging {
            item_id,
            from_stage,
        };
        Ok(())
    }

    /// Abandons the current drag without touching the board
    pub fn drag_cancel(&mut self) {
        if let BoardState::Dragging { item_id, .. } = &self.state {
            debug!(item = %item_id, "drag cancelled");
            self.state = BoardState::Idle;
        }
    }

    /// Drops the dragged item on a stage and applies the move optimistically
    pub fn drop(&mut self, to_stage: Stage) -> Result<DropOutcome> {
        let (item_id, from_stage) = match &self.state {
            BoardState::Committing { .. } => return Err(PipelineError::Busy),
            BoardState::Idle => {
                return Err(PipelineError::InvalidGesture(
                    "drop without a drag in progress".to_string(),
                ))
            }
            BoardState::Dragging {
                item_id,
                from_stage,
            } => (item_id.clone(), from_stage.clone()),
        };

        let before = self.collection();
        let transition = Transition::new(item_id, from_stage, to_stage);

        match apply_transition(&before, &transition) {
            Ok(applied) => {
                debug!(transition = %transition, "applied optimistically");
                self.publish(Arc::new(applied.next));
                self.state = BoardState::Committing {
                    transition: transition.clone(),
                    inverse: applied.inverse,
                    before,
                };
                Ok(DropOutcome::Pending(transition))
            }
            Err(e) => {
                match &e {
                    PipelineError::NoOp { .. } => {
                        debug!(transition = %transition, "dropped on its own stage")
                    }
                    _ => warn!(transition = %transition, "ignoring drop: {}", e),
                }
                self.state = BoardState::Idle;
                Ok(DropOutcome::Ignored(e))
            }
        }
    }

    /// Resolves the pending move with the backend's answer.
    ///
    /// On failure the rollback is published before the reason is reported.
    pub fn settle(&mut self, result: std::result::Result<(), RemoteError>) -> Result<MoveOutcome> {
        let state = std::mem::replace(&mut self.state, BoardState::Idle);
        let (transition, inverse, before) = match state {
            BoardState::Committing {
                transition,
                inverse,
                before,
            } => (transition, inverse, before),
            other => {
                self.state = other;
                return Err(PipelineError::InvalidGesture(
                    "no stage change is pending".to_string(),
                ));
            }
        };

        let error = match result {
            Ok(()) => {
                info!(transition = %transition, "stage change saved");
                return Ok(MoveOutcome::Committed(transition));
            }
            Err(error) => error,
        };

        warn!(transition = %transition, "rolling back: {}", error);
        let current = self.collection();
        match apply_transition(&current, &inverse) {
            Ok(undone) => self.publish(Arc::new(undone.next)),
            Err(e) => {
                error!(
                    transition = %inverse,
                    "inverse move failed ({}), restoring previous board", e
                );
                self.publish(before);
            }
        }

        self.report(error.clone());

        Ok(MoveOutcome::RolledBack { transition, error })
    }

    /// Sends the pending move to the backend and settles it
    pub async fn commit_pending(&mut self) -> Result<MoveOutcome> {
        let transition = self.pending().cloned().ok_or_else(|| {
            PipelineError::InvalidGesture("no stage change is pending".to_string())
        })?;

        let result = self
            .sync
            .commit_transition(&transition.item_id, &transition.to_stage)
            .await;
        self.settle(result)
    }

    /// Drops the dragged item and waits for the backend
    pub async fn drop_and_commit(&mut self, to_stage: Stage) -> Result<MoveOutcome> {
        match self.drop(to_stage)? {
            DropOutcome::Pending(_) => self.commit_pending().await,
            DropOutcome::Ignored(e) => Ok(MoveOutcome::Ignored(e)),
        }
    }

    /// Drags and drops in one step
    pub async fn move_item(
        &mut self,
        item_id: ItemId,
        from_stage: Stage,
        to_stage: Stage,
    ) -> Result<MoveOutcome> {
        self.drag_start(item_id, from_stage)?;
        self.drop_and_commit(to_stage).await
    }
}
