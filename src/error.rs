//! Request-level error taxonomy and its HTTP mapping.
//!
//! Four classes exist in the system:
//!   - `Validation`: bad survey fields or malformed custom-plan structure.
//!     Rejected with field-level detail; nothing is persisted.
//!   - `NotFound`: no catalog match, or no stored plan / profile on read.
//!     Carries a machine-readable remedial action for the client.
//!   - `Persistence`: a store write failed; the request fails whole.
//!   - Generative-text failures live in `genai::GenAiError` and are NEVER
//!     mapped to a response; every AI stage absorbs them via its fallback.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use thiserror::Error;

/// What the client should do about a `NotFound`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionRequired {
  CompleteSurvey,
  GeneratePath,
}

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{field}: {message}")]
  Validation { field: String, message: String },

  #[error("{resource} not found")]
  NotFound {
    resource: &'static str,
    action_required: ActionRequired,
  },

  #[error("storage write failed: {0}")]
  Persistence(String),
}

impl AppError {
  pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
    AppError::Validation { field: field.into(), message: message.into() }
  }
}

#[derive(Serialize)]
struct ErrorBody {
  error: &'static str,
  message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  field: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  action_required: Option<ActionRequired>,
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let (status, body) = match self {
      AppError::Validation { field, message } => (
        StatusCode::UNPROCESSABLE_ENTITY,
        ErrorBody { error: "validation", message, field: Some(field), action_required: None },
      ),
      AppError::NotFound { resource, action_required } => (
        StatusCode::NOT_FOUND,
        ErrorBody {
          error: "not_found",
          message: format!("{} not found", resource),
          field: None,
          action_required: Some(action_required),
        },
      ),
      AppError::Persistence(msg) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorBody { error: "persistence", message: msg, field: None, action_required: None },
      ),
    };
    (status, Json(body)).into_response()
  }
}
