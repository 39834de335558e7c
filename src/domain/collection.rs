use crate::domain::item::{Item, ItemId};
use crate::domain::sorting::{sort_items, SortField, SortOrder};
use crate::domain::stage::Stage;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Pipeline state as sent by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSnapshot {
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub referrals_by_stage: BTreeMap<Stage, Vec<Item>>,
    #[serde(default)]
    pub stage_counts: BTreeMap<Stage, usize>,
}

/// One column of the rendered board
#[derive(Debug, Clone, PartialEq)]
pub struct StageColumn<'a> {
    pub name: &'a Stage,
    pub count: usize,
    pub items: Vec<&'a Item>,
    pub is_empty: bool,
}

/// Items grouped by stage, in stage order.
///
/// A collection is never mutated in place: every move produces a new value.
/// Each item id appears in at most one stage, and a stage's count is always
/// the length of its sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct StageCollection {
    stages: Vec<Stage>,
    // Indexed like `stages`
    items: Vec<Vec<Item>>,
}

impl StageCollection {
    /// Creates an empty collection over a fixed stage list
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        let mut seen = HashSet::new();
        for stage in &stages {
            if !seen.insert(stage) {
                return Err(PipelineError::InvalidSnapshot(format!("duplicate stage: {}", stage)));
            }
        }

        let items = vec![Vec::new(); stages.len()];
        Ok(Self { stages, items })
    }

    /// Builds a collection by grouping items on their stage label
    pub fn with_items(stages: Vec<Stage>, items: impl IntoIterator<Item = Item>) -> Result<Self> {
        let mut collection = Self::new(stages)?;
        let mut ids = HashSet::new();

        for item in items {
            let index = collection.index_of(&item.stage).ok_or_else(|| {
                PipelineError::InvalidSnapshot(format!(
                    "item {} is in unknown stage {}",
                    item.id, item.stage
                ))
            })?;
            if !ids.insert(item.id.clone()) {
                return Err(PipelineError::InvalidSnapshot(format!(
                    "item {} appears more than once",
                    item.id
                )));
            }
            collection.items[index].push(item);
        }

        Ok(collection)
    }

    /// Validates a backend snapshot and builds the initial collection
    pub fn from_snapshot(snapshot: PipelineSnapshot) -> Result<Self> {
        let PipelineSnapshot {
            stages,
            mut referrals_by_stage,
            stage_counts,
        } = snapshot;

        let known: HashSet<&Stage> = stages.iter().collect();
        if let Some(stage) = referrals_by_stage.keys().find(|s| !known.contains(s)) {
            return Err(PipelineError::InvalidSnapshot(format!(
                "items listed under unknown stage {}",
                stage
            )));
        }
        if let Some(stage) = stage_counts.keys().find(|s| !known.contains(s)) {
            return Err(PipelineError::InvalidSnapshot(format!(
                "count reported for unknown stage {}",
                stage
            )));
        }

        let mut ordered = Vec::new();
        for stage in &stages {
            let items = referrals_by_stage.remove(stage).unwrap_or_default();
            let count = stage_counts.get(stage).copied().unwrap_or(0);
            if count != items.len() {
                return Err(PipelineError::InvalidSnapshot(format!(
                    "stage {} reports {} items but lists {}",
                    stage,
                    count,
                    items.len()
                )));
            }
            if let Some(item) = items.iter().find(|item| &item.stage != stage) {
                return Err(PipelineError::InvalidSnapshot(format!(
                    "item {} is labelled {} but listed under {}",
                    item.id, item.stage, stage
                )));
            }
            ordered.extend(items);
        }

        Self::with_items(stages, ordered)
    }

    /// Converts back to the wire shape
    pub fn to_snapshot(&self) -> PipelineSnapshot {
        let mut snapshot = PipelineSnapshot {
            stages: self.stages.clone(),
            ..PipelineSnapshot::default()
        };
        for (stage, items) in self.stages.iter().zip(&self.items) {
            snapshot.stage_counts.insert(stage.clone(), items.len());
            snapshot.referrals_by_stage.insert(stage.clone(), items.clone());
        }
        snapshot
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    fn index_of(&self, stage: &Stage) -> Option<usize> {
        self.stages.iter().position(|s| s == stage)
    }

    /// Items in a stage; empty for a stage with no items or an unknown stage
    pub fn get(&self, stage: &Stage) -> &[Item] {
        self.index_of(stage)
            .map(|index| self.items[index].as_slice())
            .unwrap_or(&[])
    }

    pub fn count(&self, stage: &Stage) -> usize {
        self.get(stage).len()
    }

    /// Number of items across all stages
    pub fn total(&self) -> usize {
        self.items.iter().map(Vec::len).sum()
    }

    /// Stage currently holding the item
    pub fn stage_of(&self, id: &ItemId) -> Option<&Stage> {
        self.stages
            .iter()
            .zip(&self.items)
            .find(|(_, items)| items.iter().any(|item| &item.id == id))
            .map(|(stage, _)| stage)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.stage_of(id).is_some()
    }

    /// Returns a new collection with the item removed from `from` and
    /// appended to the end of `to`. The receiver is left untouched.
    pub fn with_moved(&self, id: &ItemId, from: &Stage, to: &Stage) -> Result<Self> {
        if from == to {
            return Err(PipelineError::NoOp {
                stage: from.to_string(),
            });
        }

        let from_index = self
            .index_of(from)
            .ok_or_else(|| PipelineError::UnknownStage(from.to_string()))?;
        let to_index = self
            .index_of(to)
            .ok_or_else(|| PipelineError::UnknownStage(to.to_string()))?;
        let position = self.items[from_index]
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| PipelineError::NotFound {
                item: id.to_string(),
                stage: from.to_string(),
            })?;

        let mut next = self.clone();
        let mut item = next.items[from_index].remove(position);
        item.stage = to.clone();
        next.items[to_index].push(item);

        Ok(next)
    }

    /// Board columns in stage order
    pub fn columns(&self) -> Vec<StageColumn<'_>> {
        self.stages
            .iter()
            .zip(&self.items)
            .map(|(stage, items)| StageColumn {
                name: stage,
                count: items.len(),
                items: items.iter().collect(),
                is_empty: items.is_empty(),
            })
            .collect()
    }

    /// Board columns with each column's cards reordered for display
    pub fn columns_sorted(&self, field: SortField, order: SortOrder) -> Vec<StageColumn<'_>> {
        let mut columns = self.columns();
        for column in &mut columns {
            sort_items(&mut column.items, field, order);
        }
        columns
    }

    /// Compares stage membership and counts, ignoring order within a stage
    pub fn same_membership(&self, other: &StageCollection) -> bool {
        if self.stages != other.stages {
            return false;
        }

        self.items.iter().zip(&other.items).all(|(ours, theirs)| {
            let ours: HashSet<&ItemId> = ours.iter().map(|item| &item.id).collect();
            let theirs: HashSet<&ItemId> = theirs.iter().map(|item| &item.id).collect();
            ours == theirs
        })
    }
}
