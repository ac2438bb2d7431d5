//! Study Tutor · quiz generation and grading backend
//!
//! - Axum HTTP + WebSocket API
//! - Quiz/summary generation through an OpenRouter (OpenAI-compatible) model
//! - Interactive quiz sessions (incl. timed quickfire) over WebSocket
//! - Static frontend fallback ($STATIC_DIR/index.html)
//!
//! Important env variables (a `.env` file is honored):
//!   PORT                : u16 (default 3000)
//!   OPENROUTER_API_KEY  : enables quiz/summary generation
//!   OPENROUTER_BASE_URL : default "https://openrouter.ai/api/v1"
//!   OPENROUTER_MODEL    : default "google/gemma-2-9b-it"
//!   TUTOR_CONFIG_PATH   : path to TOML config (prompts + limits)
//!   STATIC_DIR          : frontend directory (default "./public")
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod config;
mod distribution;
mod domain;
mod errors;
mod grading;
mod logic;
mod openrouter;
mod parser;
mod protocol;
mod ratelimit;
mod routes;
mod session;
mod state;
mod telemetry;
mod timer;
mod util;
mod validator;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // A missing .env is fine; real deployments set the environment directly.
  let dotenv_loaded = dotenv::dotenv().is_ok();
  telemetry::init_tracing();
  if !dotenv_loaded {
    warn!(target: "studytutor_backend", "No .env file loaded; using process environment only");
  }

  let state = Arc::new(AppState::new());

  let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "./public".into());
  let app = build_router(state.clone(), &static_dir);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "studytutor_backend", %addr, %static_dir, llm = state.llm.is_some(), "HTTP server listening");
  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "studytutor_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "studytutor_backend", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "studytutor_backend", "Shutdown signal received");
}
