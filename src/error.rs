use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Fallback shown when the backend rejects a stage change without a message
pub const DEFAULT_UPDATE_ERROR: &str = "Error updating referral stage";

/// Fallback shown when the pipeline cannot be fetched
pub const DEFAULT_LOAD_ERROR: &str = "Error loading referral pipeline";

/// A failed backend mutation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.reason())]
pub struct RemoteError {
    reason: String,
}

impl RemoteError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The message to surface to the user
    pub fn reason(&self) -> &str {
        if self.is_blank() {
            DEFAULT_UPDATE_ERROR
        } else {
            &self.reason
        }
    }

    fn is_blank(&self) -> bool {
        self.reason.trim().is_empty()
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Item {item} not found in stage {stage}")]
    NotFound { item: String, stage: String },

    #[error("Item is already in stage {stage}")]
    NoOp { stage: String },

    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("Invalid pipeline snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("A stage change is still being saved")]
    Busy,

    #[error("Invalid gesture: {0}")]
    InvalidGesture(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline not initialized")]
    NotInitialized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Remote failures are rolled back and reported; everything else is a
    /// malformed request or an environment problem.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Message for a failed pipeline fetch, falling back to a generic one
    pub fn load_message(&self) -> String {
        match self {
            Self::Remote(err) if err.is_blank() => DEFAULT_LOAD_ERROR.to_string(),
            other => other.to_string(),
        }
    }
}
