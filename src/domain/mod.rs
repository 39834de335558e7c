pub mod collection;
pub mod item;
pub mod sorting;
pub mod stage;
pub mod transition;

pub use collection::{PipelineSnapshot, StageCollection, StageColumn};
pub use item::{Item, ItemId, Urgency, UrgencyThresholds};
pub use sorting::{sort_items, SortField, SortOrder};
pub use stage::{PipelineConfig, Stage};
pub use transition::{apply, Applied, Transition};
