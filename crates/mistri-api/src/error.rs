//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Handlers return [`mistri_core::Error`] wrapped in [`ApiError`]; the
//! variant decides the status code, so the engine's taxonomy reaches HTTP
//! clients intact.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use mistri_core::Error;
use serde_json::json;

/// An engine error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
  fn from(e: Error) -> Self { Self(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self.0 {
      Error::Validation(_) => StatusCode::BAD_REQUEST,
      Error::PostingNotFound(_) | Error::SubmissionNotFound(_) => {
        StatusCode::NOT_FOUND
      }
      Error::Permission(_) => StatusCode::FORBIDDEN,
      Error::ClosedPosting(_)
      | Error::InvalidState { .. }
      | Error::DuplicateSubmission { .. } => StatusCode::CONFLICT,
      Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      Error::Serialization(_) | Error::Malformed(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    (status, Json(json!({ "error": self.0.to_string() }))).into_response()
  }
}
