use budgetrec_core::RecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FactorError {
    #[error("Training set is empty; record interactions first")]
    EmptyTrainingSet,
    #[error("Training diverged (train rmse {rmse}); lower the learning rate")]
    Diverged { rmse: f32 },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Snapshot deserialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FactorError>;

impl From<FactorError> for RecError {
    fn from(err: FactorError) -> Self {
        match err {
            FactorError::Snapshot(e) => RecError::Snapshot(e),
            other => RecError::Training(other.to_string()),
        }
    }
}
