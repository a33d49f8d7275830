// vanik-saga/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Failures raised by the saga engine itself.
///
/// Errors produced by step handlers travel through the saga's own error type
/// untouched; `SagaError` only covers configuration and dispatch problems, plus
/// a `HandlerError` bucket for handlers that choose to report through `anyhow`.
#[derive(Debug, Error)]
pub enum SagaError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Type mismatch during context downcast (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("Step handler failed. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error for '{step_name}': {message}")]
  ConfigurationError { step_name: String, message: String },

  #[error("Internal saga error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for SagaError {
  fn from(source: AnyhowError) -> Self {
    match source.downcast::<SagaError>() {
      Ok(inner) => inner,
      Err(source) => SagaError::HandlerError { source },
    }
  }
}

pub type SagaResult<T, E = SagaError> = std::result::Result<T, E>;
