use crate::domain::item::UrgencyThresholds;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Name of a pipeline stage (a board column)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stage(String);

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Stage {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Stage {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline board configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub urgency: UrgencyThresholds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "Referral Pipeline".to_string(),
            stages: [
                "New Referral",
                "Eligibility Check",
                "Authorization Pending",
                "IRP Scheduling",
                "IRP Completed",
                "Admission",
            ]
            .into_iter()
            .map(Stage::from)
            .collect(),
            urgency: UrgencyThresholds::default(),
        }
    }
}

impl PipelineConfig {
    /// Replaces the stage list, keeping the other settings
    pub fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = stages;
        self
    }

    /// Checks the stage list and urgency thresholds
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(PipelineError::Config(
                "pipeline must have at least one stage".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if stage.as_str().trim().is_empty() {
                return Err(PipelineError::Config("stage names cannot be blank".to_string()));
            }
            if !seen.insert(stage) {
                return Err(PipelineError::Config(format!("duplicate stage: {}", stage)));
            }
        }

        if self.urgency.warning_after_days > self.urgency.error_after_days {
            return Err(PipelineError::Config(format!(
                "warning threshold ({} days) exceeds error threshold ({} days)",
                self.urgency.warning_after_days, self.urgency.error_after_days
            )));
        }

        Ok(())
    }
}
