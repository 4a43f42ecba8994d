//! Error types for the challenge code engine and its collaborators.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Why a challenge code could not be read. Line numbers are 1-based.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
  #[error("line {line}: expected {expected}, found {found:?}")]
  Structural {
    line: usize,
    expected: &'static str,
    found: String,
  },

  #[error("line {line}: no {kind}requirement numbered {number}", kind = bonus_prefix(.bonus))]
  UnknownRequirement { line: usize, number: u32, bonus: bool },
}

impl ParseError {
  pub fn structural(line: usize, expected: &'static str, found: &str) -> Self {
    ParseError::Structural { line, expected, found: found.to_string() }
  }
}

fn bonus_prefix(bonus: &bool) -> &'static str {
  if *bonus { "bonus " } else { "" }
}

/// A failed decode: the diagnostic plus the comment exactly as it was given.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to parse challenge code: {error}")]
pub struct ParseFailure {
  pub error: ParseError,
  pub comment: String,
}

/// The only fatal import condition; everything else degrades to raw-edit rows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
  #[error("challenge title not found on the first line")]
  MissingTitle,
}

/// Failures talking to the forum API.
#[derive(Debug, Error)]
pub enum ForumError {
  #[error("forum request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("forum returned HTTP {status}: {body}")]
  Status { status: u16, body: String },

  #[error("forum response missing {0}")]
  MissingField(&'static str),

  #[error("forum API error: {0}")]
  Api(String),
}

/// Errors surfaced by the HTTP layer. Rendered as `(status, Json(message))`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  Unauthorized(String),
  #[error("{0}")]
  Forbidden(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  ServiceUnavailable(String),
  #[error("{0}")]
  BadGateway(String),
}

impl ApiError {
  pub fn bad_request(message: impl Into<String>) -> Self {
    ApiError::BadRequest(message.into())
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    ApiError::NotFound(message.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
    }
  }
}

impl From<ForumError> for ApiError {
  fn from(err: ForumError) -> Self {
    ApiError::BadGateway(err.to_string())
  }
}

impl From<ImportError> for ApiError {
  fn from(err: ImportError) -> Self {
    ApiError::BadRequest(err.to_string())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    (status, Json(self.to_string())).into_response()
  }
}
