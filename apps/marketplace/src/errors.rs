// apps/marketplace/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use vanik_saga::SagaError;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
  /// Malformed request input (bad JSON, unparsable query values).
  #[error("Validation Error: {0}")]
  Validation(String),

  /// The request is well formed but violates a lifecycle or schema rule.
  #[error("Invalid State: {0}")]
  InvalidState(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Upstream Failure: {0}")]
  Upstream(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Saga Error: {source}")]
  Workflow {
    #[from]
    source: SagaError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Stable machine-readable code carried in every error body.
  pub fn code(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "validation_error",
      AppError::InvalidState(_) => "invalid_state",
      AppError::NotFound(_) => "not_found",
      AppError::Unauthorized(_) => "unauthorized",
      AppError::Conflict(_) => "conflict",
      AppError::Upstream(_) => "upstream_failure",
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => "internal_error",
    }
  }

  /// Message safe to show a client. Internal details stay in the logs.
  pub fn public_message(&self) -> String {
    match self {
      AppError::Validation(m)
      | AppError::InvalidState(m)
      | AppError::NotFound(m)
      | AppError::Unauthorized(m)
      | AppError::Conflict(m) => m.clone(),
      AppError::Upstream(_) => "A backing service failed to complete the request.".to_string(),
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        "An internal error occurred.".to_string()
      }
    }
  }
}

impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::Conflict { .. } => AppError::Conflict(err.to_string()),
      StoreError::Unavailable(_) | StoreError::Corrupt { .. } => AppError::Upstream(err.to_string()),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => match err.downcast::<StoreError>() {
        Ok(store_err) => store_err.into(),
        Err(err) => AppError::Internal(err.to_string()),
      },
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, code = self.code(), "Responding with error");
    } else {
      tracing::info!(application_error = %self, code = self.code(), "Responding with client error");
    }
    HttpResponse::build(status).json(json!({
      "code": self.code(),
      "message": self.public_message(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
