use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl CoreError {
    /// Short error code string, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::Invalid { .. } => "INVALID_CONFIG_VALUE",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
