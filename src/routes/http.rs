//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs basic request/result info.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::errors::QuizError;
use crate::protocol::*;
use crate::state::AppState;
use crate::logic::*;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, llm: state.llm.is_some(), model: state.model_name().map(str::to_string) })
}

#[instrument(level = "info", skip(state, body), fields(content_len = body.content.len()))]
pub async fn http_post_quiz(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuizIn>,
) -> Result<Json<QuizOut>, QuizError> {
  let req = body.into_request();
  let set = quiz_for(&state, &req).await?;
  info!(target: "quiz", requested = req.count, delivered = set.len(), "HTTP quiz served");
  Ok(Json(QuizOut { questions: set_to_out(&set) }))
}

#[instrument(level = "info", skip(state, body), fields(content_len = body.content.len()))]
pub async fn http_post_summarize(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SummaryIn>,
) -> Result<Json<SummaryOut>, QuizError> {
  let summary = summary_for(&state, &body.into_request()).await?;
  info!(target: "quiz", summary_len = summary.len(), "HTTP summary served");
  Ok(Json(SummaryOut { summary }))
}
