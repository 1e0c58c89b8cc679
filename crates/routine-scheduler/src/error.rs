use thiserror::Error;

/// Errors that can occur within the routine scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Malformed request parameters (non-positive count, empty field).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The serialized config could not be deserialized by the job type.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// No live routine is registered under the given key.
    #[error("Routine {key} not found")]
    NotFound { key: String },

    /// A routine with the generated key is already live.
    #[error("Routine {key} already exists")]
    DuplicateKey { key: String },

    /// The execution loop could not be launched.
    #[error("Failed to launch routine: {0}")]
    Launch(String),

    /// The job function itself failed; fatal to that one routine.
    #[error("Job failed: {0}")]
    JobFailure(String),
}

impl SchedulerError {
    /// Short error code string, e.g. for HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::InvalidInput(_) => "INVALID_INPUT",
            SchedulerError::InvalidConfig(_) => "INVALID_CONFIG",
            SchedulerError::NotFound { .. } => "NOT_FOUND",
            SchedulerError::DuplicateKey { .. } => "DUPLICATE_KEY",
            SchedulerError::Launch(_) => "LAUNCH_FAILED",
            SchedulerError::JobFailure(_) => "JOB_FAILURE",
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
