use crate::domain::stage::Stage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stable identifier for a pipeline item, as issued by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Returns the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual urgency of an item based on how long it has been open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Success,
    Warning,
    Error,
}

impl Urgency {
    pub fn classify(days_open: u64, thresholds: &UrgencyThresholds) -> Self {
        if days_open > thresholds.error_after_days {
            Self::Error
        } else if days_open > thresholds.warning_after_days {
            Self::Warning
        } else {
            Self::Success
        }
    }

    /// CSS class used by the board's cards
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "urgency-success",
            Self::Warning => "urgency-warning",
            Self::Error => "urgency-error",
        }
    }
}

/// Day counts after which an open item escalates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencyThresholds {
    pub warning_after_days: u64,
    pub error_after_days: u64,
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self {
            warning_after_days: 7,
            error_after_days: 14,
        }
    }
}

/// A card on the board.
///
/// Only `id` and `stage` are interpreted; every other attribute the backend
/// sends is kept in `payload` and carried through moves unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub stage: Stage,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Item {
    const NAME_KEY: &'static str = "name";
    const DAYS_OPEN_KEY: &'static str = "daysOpen";

    pub fn new(id: impl Into<ItemId>, stage: impl Into<Stage>) -> Self {
        Self {
            id: id.into(),
            stage: stage.into(),
            payload: Map::new(),
        }
    }

    /// Adds an opaque attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.payload.get(Self::NAME_KEY).and_then(Value::as_str)
    }

    pub fn days_open(&self) -> Option<u64> {
        self.payload.get(Self::DAYS_OPEN_KEY).and_then(Value::as_u64)
    }

    /// Urgency of the item, if the backend reported how long it has been open
    pub fn urgency(&self, thresholds: &UrgencyThresholds) -> Option<Urgency> {
        self.days_open().map(|days| Urgency::classify(days, thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_boundaries() {
        let thresholds = UrgencyThresholds::default();

        assert_eq!(Urgency::classify(0, &thresholds), Urgency::Success);
        assert_eq!(Urgency::classify(7, &thresholds), Urgency::Success);
        assert_eq!(Urgency::classify(8, &thresholds), Urgency::Warning);
        assert_eq!(Urgency::classify(14, &thresholds), Urgency::Warning);
        assert_eq!(Urgency::classify(15, &thresholds), Urgency::Error);
    }

    #[test]
    fn test_urgency_css_class() {
        assert_eq!(Urgency::Success.css_class(), "urgency-success");
        assert_eq!(Urgency::Warning.css_class(), "urgency-warning");
        assert_eq!(Urgency::Error.css_class(), "urgency-error");
    }

    #[test]
    fn test_item_attributes() {
        let item = Item::new("R1", "New Referral")
            .with_attribute("name", "Jane Doe")
            .with_attribute("daysOpen", 9);

        assert_eq!(item.name(), Some("Jane Doe"));
        assert_eq!(item.days_open(), Some(9));
        assert_eq!(
            item.urgency(&UrgencyThresholds::default()),
            Some(Urgency::Warning)
        );

        let bare = Item::new("R2", "New Referral");
        assert!(bare.name().is_none());
        assert!(bare.urgency(&UrgencyThresholds::default()).is_none());
    }

    #[test]
    fn test_item_payload_round_trips_through_json() {
        let json = r#"{
            "id": "R1",
            "stage": "Eligibility Check",
            "name": "Jane Doe",
            "owner": "Intake Team",
            "daysOpen": 3
        }"#;

        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.id.as_str(), "R1");
        assert_eq!(item.stage.as_str(), "Eligibility Check");
        assert_eq!(item.payload.len(), 3);
        assert_eq!(item.payload["owner"], "Intake Team");

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["owner"], "Intake Team");
        assert_eq!(value["stage"], "Eligibility Check");
    }
}
