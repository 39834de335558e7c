use crate::domain::collection::StageCollection;
use crate::domain::item::ItemId;
use crate::domain::stage::Stage;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Intent to move one item from one stage to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub item_id: ItemId,
    pub from_stage: Stage,
    pub to_stage: Stage,
}

impl Transition {
    pub fn new(item_id: ItemId, from_stage: Stage, to_stage: Stage) -> Self {
        Self {
            item_id,
            from_stage,
            to_stage,
        }
    }

    /// The move that undoes this one
    pub fn inverse(&self) -> Self {
        Self {
            item_id: self.item_id.clone(),
            from_stage: self.to_stage.clone(),
            to_stage: self.from_stage.clone(),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.item_id, self.from_stage, self.to_stage
        )
    }
}

/// Result of applying a transition: the new collection and its undo
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub next: StageCollection,
    pub inverse: Transition,
}

/// Applies a transition without any I/O.
///
/// Fails with `NoOp` when both stages are the same, and with `NotFound` when
/// the item is not in the claimed source stage.
pub fn apply(collection: &StageCollection, transition: &Transition) -> Result<Applied> {
    let next = collection.with_moved(
        &transition.item_id,
        &transition.from_stage,
        &transition.to_stage,
    )?;

    Ok(Applied {
        next,
        inverse: transition.inverse(),
    })
}
