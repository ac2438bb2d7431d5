//! Loading tutor configuration (prompts + limits) from TOML.
//!
//! See `TutorConfig`, `Prompts` and `Limits` for the expected schema. Every key
//! is optional; anything missing falls back to the defaults below.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TutorConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub limits: Limits,
}

/// Prompt templates sent to the model. `{placeholder}`s are filled by `util::fill_template`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  /// Placeholders: {count}, {difficulty}, {distribution}, {content}
  pub quiz_template: String,
  /// Placeholders: {length}, {format}, {content}
  pub summary_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      quiz_template: r#"Create {count} quiz questions ({difficulty}) from this content.

Question type distribution:
{distribution}

Return ONLY this JSON format with NO extra text:
[
  {
    "type": "mcq" | "fillblank" | "truefalse",
    "question": "Question text?",
    "options": ["A", "B", "C", "D"] (for mcq/truefalse only),
    "correctIndex": 0 (for mcq/truefalse),
    "correctAnswer": "answer text" (for fillblank only),
    "hint": "Brief hint",
    "explanation": "Why this is correct"
  }
]

For TRUE/FALSE questions: options should be ["True", "False"]
For FILL IN THE BLANK: omit "options" and "correctIndex", provide "correctAnswer" instead

Content:
{content}"#
        .into(),
      summary_template: "Summarize this text in {length} or less. {format} Use simple, clear language suitable for students:\n\n{content}\n\nProvide ONLY the summary, no preamble or extra text.".into(),
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Limits {
  /// Study content beyond this many characters is cut before prompting.
  pub max_content_chars: usize,
  pub max_question_count: usize,
  pub quickfire_count: usize,
  pub quickfire_seconds: u32,
  pub quickfire_warning_seconds: u32,
  pub rate_limit_window_secs: u64,
  pub rate_limit_max_requests: u32,
  pub request_timeout_secs: u64,
}

impl Default for Limits {
  fn default() -> Self {
    Self {
      max_content_chars: 2500,
      max_question_count: 50,
      quickfire_count: 5,
      quickfire_seconds: 60,
      quickfire_warning_seconds: 10,
      rate_limit_window_secs: 60,
      rate_limit_max_requests: 15,
      request_timeout_secs: 60,
    }
  }
}

/// Attempt to load `TutorConfig` from TUTOR_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_tutor_config_from_env() -> Option<TutorConfig> {
  let path = std::env::var("TUTOR_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<TutorConfig>(&s) {
      Ok(cfg) => {
        info!(target: "studytutor_backend", %path, "Loaded tutor config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "studytutor_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "studytutor_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
