//! Error types.
//!
//! - `EstimateError` is the estimator's own taxonomy (bad input vs. bad tables).
//! - `AppError` is what the binary reports: a message plus a process exit code.

/// Failures raised by the ensemble estimator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimateError {
    /// An attribute is outside its documented domain.
    #[error("Invalid input: {field}={value} ({reason})")]
    InvalidInput {
        field: &'static str,
        value: i64,
        reason: String,
    },

    /// The injected tier/model tables or options are unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl EstimateError {
    pub fn invalid_input(field: &'static str, value: i64, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            value,
            reason: reason.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<EstimateError> for AppError {
    fn from(err: EstimateError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
