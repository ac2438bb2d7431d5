//! Application state: prompts, limits, the optional model client and the rate limiter.
//!
//! Nothing quiz-specific lives here. Each websocket connection owns its own
//! `QuizSession`; the shared state is read-only apart from the limiter.

use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::config::{load_tutor_config_from_env, Limits, Prompts};
use crate::openrouter::OpenRouter;
use crate::ratelimit::RateLimiter;

pub struct AppState {
    pub llm: Option<OpenRouter>,
    pub prompts: Prompts,
    pub limits: Limits,
    pub limiter: RateLimiter,
}

impl AppState {
    /// Build state from env: load config, init the model client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_tutor_config_from_env().unwrap_or_default();
        let llm = OpenRouter::from_env(Duration::from_secs(cfg.limits.request_timeout_secs));
        if let Some(client) = &llm {
            info!(target: "studytutor_backend", base_url = %client.base_url, model = %client.model, "Model provider enabled.");
        } else {
            warn!(target: "studytutor_backend", "OPENROUTER_API_KEY not set; quiz and summary requests will fail until it is configured.");
        }
        Self::with_parts(llm, cfg.prompts, cfg.limits)
    }

    pub fn with_parts(llm: Option<OpenRouter>, prompts: Prompts, limits: Limits) -> Self {
        let limiter = RateLimiter::new(
            Duration::from_secs(limits.rate_limit_window_secs),
            limits.rate_limit_max_requests,
        );
        info!(
            target: "studytutor_backend",
            max_content_chars = limits.max_content_chars,
            max_question_count = limits.max_question_count,
            quickfire_count = limits.quickfire_count,
            quickfire_seconds = limits.quickfire_seconds,
            "Limits configured"
        );
        Self { llm, prompts, limits, limiter }
    }

    pub fn model_name(&self) -> Option<&str> {
        self.llm.as_ref().map(|c| c.model.as_str())
    }
}
