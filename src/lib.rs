//! # Referral Pipeline
//!
//! Staged pipeline board for referral coordination.
//!
//! Items are grouped into a fixed, ordered set of stages. Moving an item
//! between stages is shown immediately and then saved through a pluggable
//! backend; if the backend rejects the change the move is undone. The crate
//! has no dependency on a particular UI or transport.

pub mod controller;
pub mod domain;
pub mod error;
pub mod sync;

// Re-export commonly used types
pub use controller::{BoardController, BoardState, DropOutcome, MoveOutcome};
pub use domain::{
    collection::{PipelineSnapshot, StageCollection, StageColumn},
    item::{Item, ItemId, Urgency, UrgencyThresholds},
    stage::{PipelineConfig, Stage},
    transition::Transition,
};
pub use error::{PipelineError, RemoteError, Result};
pub use sync::{PipelineSource, RemoteSync};
