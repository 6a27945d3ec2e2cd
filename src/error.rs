use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub const UNAVAILABLE_MESSAGE: &str =
  "HealthCone AI is temporarily unavailable. Please try again in a moment.";

#[derive(Error, Debug)]
pub enum RelayError {
  #[error("{0}")]
  Validation(String),

  /// Every candidate was tried without success.
  #[error("all candidate models failed (last status {status})")]
  Exhausted {
    status: u16,
    detail: Option<serde_json::Value>,
  },

  #[error("Server error: {0}")]
  Internal(String),
}

impl RelayError {
  pub fn validation(msg: impl Into<String>) -> Self {
    RelayError::Validation(msg.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      RelayError::Validation(_) => StatusCode::BAD_REQUEST,
      RelayError::Exhausted { status, .. } => {
        StatusCode::from_u16(*status).unwrap_or(StatusCode::SERVICE_UNAVAILABLE)
      }
      RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for RelayError {
  fn into_response(self) -> Response {
    let status = self.status();
    match self {
      RelayError::Exhausted { detail, .. } => {
        let body = serde_json::json!({ "error": UNAVAILABLE_MESSAGE, "detail": detail });
        (status, Json(body)).into_response()
      }
      other => error_response(status, &other.to_string()),
    }
  }
}

/// Raised by an [`Upstream`](crate::upstream::Upstream) when no response
/// came back at all.
#[derive(Error, Debug)]
pub enum UpstreamError {
  #[error("transport error: {0}")]
  Transport(String),
}

impl From<reqwest::Error> for UpstreamError {
  fn from(err: reqwest::Error) -> Self {
    UpstreamError::Transport(err.to_string())
  }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AlertError {
  #[error("userId and bpm are required")]
  MissingField,

  #[error("bpm must be a number")]
  NotANumber,
}

impl IntoResponse for AlertError {
  fn into_response(self) -> Response {
    error_response(StatusCode::BAD_REQUEST, &self.to_string())
  }
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
  let body = Json(serde_json::json!({ "error": message }));
  (status, body).into_response()
}
