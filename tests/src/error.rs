//! Test support errors.

use thiserror::Error;

/// Failures reported by fixtures and assertions.
#[derive(Debug, Error)]
pub enum TestError {
    #[error("fixture schema is invalid: {0}")]
    Schema(#[from] quiver_registry::RegistryError),

    #[error("assertion failed in step '{step}': {message}")]
    AssertionFailed { step: String, message: String },
}

impl TestError {
    pub fn assertion_failed(step: &str, message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            step: step.to_string(),
            message: message.into(),
        }
    }
}

pub type TestResult<T> = Result<T, TestError>;
