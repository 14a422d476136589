//! Request-level errors.
//!
//! Only bad input and unknown ids are errors. A search that runs out of
//! budget or is cancelled is a normal outcome and is reported through
//! [`crate::job::JobState`] instead.

use crate::job::JobId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid prefix: {0}")]
    InvalidPrefix(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Job not found: {0}")]
    NotFound(JobId),
}

impl EngineError {
    /// True for every rejection of client input, prefix included.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidPrefix(_) | EngineError::InvalidArgument(_)
        )
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Failures while bringing the engine up.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}
