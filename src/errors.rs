//! Error taxonomy for the quiz pipeline and the interactive session.
//!
//! Pipeline failures (`QuizError`) abort a whole generation attempt; nothing
//! partial is ever handed to a client. Session misuse (`SessionError`) is
//! reported back to the caller and leaves the session untouched.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizError {
  /// Bad caller input: empty content, zero questions, no usable types.
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  /// The model reply contained no `[ ... ]` span.
  #[error("no valid JSON array found in response")]
  NoArrayFound,

  /// The `[ ... ]` span did not parse, or parsed to something other than an array.
  #[error("failed to parse quiz JSON: {0}")]
  MalformedJson(String),

  /// Every record was rejected by validation.
  #[error("no valid questions generated")]
  EmptyResult,

  /// Upstream model call failed; the message is passed through untouched.
  #[error("{0}")]
  Transport(String),
}

impl QuizError {
  /// Which pipeline stage produced the failure.
  pub fn stage(&self) -> &'static str {
    match self {
      QuizError::InvalidRequest(_) => "request",
      QuizError::Transport(_) => "generation",
      QuizError::NoArrayFound | QuizError::MalformedJson(_) => "parsing",
      QuizError::EmptyResult => "validation",
    }
  }

  /// Single human-readable line naming the stage and the cause.
  pub fn user_message(&self) -> String {
    format!("Quiz {} failed: {}", self.stage(), self)
  }

  fn status(&self) -> StatusCode {
    match self {
      QuizError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

/// Body returned for every failed API call.
#[derive(Debug, Serialize)]
pub struct ErrorOut {
  pub error: String,
  pub details: String,
}

impl IntoResponse for QuizError {
  fn into_response(self) -> axum::response::Response {
    let body = ErrorOut {
      error: format!("Failed at {} stage", self.stage()),
      details: self.to_string(),
    };
    (self.status(), Json(body)).into_response()
  }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
  #[error("no quiz loaded")]
  NoQuiz,
  #[error("action not allowed while {0}")]
  WrongPhase(&'static str),
  #[error("question index {index} out of range (quiz has {len})")]
  IndexOutOfRange { index: usize, len: usize },
}
