//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use survey_core::Error as CoreError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthenticated")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("precondition failed")]
  PreconditionFailed,

  #[error("server error: {0}")]
  Internal(#[source] CoreError),
}

impl ApiError {
  /// Map a service error for endpoints that report every client-side
  /// failure, missing entities included, as a bad request.
  pub fn client_fault(err: CoreError) -> Self {
    match err {
      CoreError::AccessDenied => Self::Forbidden(err.to_string()),
      CoreError::StaleResponse(_) => Self::PreconditionFailed,
      e if e.is_server_fault() => Self::Internal(e),
      e => Self::BadRequest(e.to_string()),
    }
  }
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self {
    match err {
      CoreError::NotFound { .. } => Self::NotFound(err.to_string()),
      CoreError::AccessDenied => Self::Forbidden(err.to_string()),
      CoreError::StaleResponse(_) => Self::PreconditionFailed,
      e if e.is_server_fault() => Self::Internal(e),
      e => Self::BadRequest(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::PreconditionFailed => (StatusCode::PRECONDITION_FAILED, self.to_string()),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
