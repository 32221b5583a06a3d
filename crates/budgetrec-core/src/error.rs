use thiserror::Error;

use crate::id::{ItemId, UserId};

#[derive(Debug, Error)]
pub enum RecError {
    #[error("Invalid value for {field}: {value} (expected a finite, non-negative number)")]
    InvalidValue { field: &'static str, value: f64 },
    #[error("Model is not trained; train the system before requesting recommendations")]
    UntrainedModel,
    #[error("Oracle returned a non-finite score {score} for ({user}, {item})")]
    InvalidScore {
        user: UserId,
        item: ItemId,
        score: f64,
    },
    #[error("Training failed: {0}")]
    Training(String),
    #[error("Snapshot deserialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecError>;
