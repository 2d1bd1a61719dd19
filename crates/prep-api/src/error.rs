//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The submission was understood but rejected (missing consent, unknown
  /// option, missing answer). Nothing was written.
  #[error("rejected: {0}")]
  Rejected(#[from] prep_core::Error),

  #[error("analysis unavailable: {0}")]
  Analysis(#[from] prep_analysis::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Analysis(prep_analysis::Error::NotEnoughData { .. }) => {
        StatusCode::CONFLICT
      }
      ApiError::Analysis(_) | ApiError::Store(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "api request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
