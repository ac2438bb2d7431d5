//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Quiz generation: distribute → prompt → complete → extract → validate
//!   - Summaries of study content
//!
//! Every step either yields a value or aborts the whole call; callers never see
//! a half-built question set.

use tracing::{error, info, instrument, warn};

use crate::config::{Limits, Prompts};
use crate::distribution::{distribute, Distribution};
use crate::domain::{Difficulty, QuestionSet, QuestionType, SummaryFormat, SummaryLength};
use crate::errors::QuizError;
use crate::openrouter::Completion;
use crate::parser::extract_array;
use crate::state::AppState;
use crate::util::{fill_template, strip_summary_preamble, trunc_for_log, truncate_chars};
use crate::validator::validate_questions;

const TOKENS_PER_QUESTION: u32 = 150;
const QUIZ_BASE_TOKENS: u32 = 300;
const QUIZ_MAX_TOKENS: u32 = 4000;
const SUMMARY_MAX_TOKENS: u32 = 500;

#[derive(Clone, Debug)]
pub struct QuizRequest {
  pub content: String,
  pub count: usize,
  pub difficulty: Difficulty,
  pub types: Vec<QuestionType>,
}

#[derive(Clone, Debug)]
pub struct SummaryRequest {
  pub content: String,
  pub length: SummaryLength,
  pub format: SummaryFormat,
}

/// Output budget for a quiz of `count` questions.
pub fn quiz_token_budget(count: usize) -> u32 {
  let count = u32::try_from(count).unwrap_or(u32::MAX);
  QUIZ_BASE_TOKENS.saturating_add(count.saturating_mul(TOKENS_PER_QUESTION)).min(QUIZ_MAX_TOKENS)
}

fn distribution_lines(dist: &Distribution) -> String {
  dist
    .entries()
    .iter()
    .filter(|(_, n)| *n > 0)
    .map(|(t, n)| format!("- {} {} questions", n, t.as_str().to_uppercase()))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn build_quiz_prompt(prompts: &Prompts, content: &str, count: usize, difficulty: Difficulty, dist: &Distribution) -> String {
  fill_template(
    &prompts.quiz_template,
    &[
      ("count", &count.to_string()),
      ("difficulty", difficulty.describe()),
      ("distribution", &distribution_lines(dist)),
      ("content", content),
    ],
  )
}

fn require_content(content: &str) -> Result<&str, QuizError> {
  let content = content.trim();
  if content.is_empty() {
    return Err(QuizError::InvalidRequest("No content provided".into()));
  }
  Ok(content)
}

fn transport_unavailable() -> QuizError {
  QuizError::Transport("API key not configured".into())
}

#[instrument(level = "info", target = "quiz", skip(llm, prompts, limits, req), fields(content_len = req.content.len(), count = req.count, difficulty = ?req.difficulty))]
pub async fn generate_quiz<C: Completion>(
  llm: Option<&C>,
  prompts: &Prompts,
  limits: &Limits,
  req: &QuizRequest,
) -> Result<QuestionSet, QuizError> {
  let content = require_content(&req.content)?;
  let count = req.count.min(limits.max_question_count);
  let dist = distribute(count, &req.types)?;

  let content = truncate_chars(content, limits.max_content_chars);
  let prompt = build_quiz_prompt(prompts, &content, count, req.difficulty, &dist);
  let llm = llm.ok_or_else(transport_unavailable)?;

  let raw = llm.complete(&prompt, quiz_token_budget(count)).await.map_err(|e| {
    error!(target: "quiz", error = %e, "Quiz generation call failed");
    QuizError::Transport(e)
  })?;

  let records = extract_array(&raw).map_err(|e| {
    warn!(target: "quiz", error = %e, reply = %trunc_for_log(&raw, 120), "Could not extract question array");
    e
  })?;
  let set = validate_questions(records, count)?;
  info!(target: "quiz", requested = dist.total(), delivered = set.len(), "Quiz generated");
  Ok(set)
}

#[instrument(level = "info", target = "quiz", skip(llm, prompts, limits, req), fields(content_len = req.content.len(), length = ?req.length, format = ?req.format))]
pub async fn summarize<C: Completion>(
  llm: Option<&C>,
  prompts: &Prompts,
  limits: &Limits,
  req: &SummaryRequest,
) -> Result<String, QuizError> {
  let content = truncate_chars(require_content(&req.content)?, limits.max_content_chars);
  let prompt = fill_template(
    &prompts.summary_template,
    &[
      ("length", req.length.word_budget()),
      ("format", req.format.instructions()),
      ("content", &content),
    ],
  );
  let llm = llm.ok_or_else(transport_unavailable)?;
  let raw = llm.complete(&prompt, SUMMARY_MAX_TOKENS).await.map_err(|e| {
    error!(target: "quiz", error = %e, "Summary call failed");
    QuizError::Transport(e)
  })?;
  let summary = strip_summary_preamble(&raw);
  info!(target: "quiz", summary_len = summary.len(), "Summary generated");
  Ok(summary)
}

/// Quiz generation against the configured model provider.
pub async fn quiz_for(state: &AppState, req: &QuizRequest) -> Result<QuestionSet, QuizError> {
  generate_quiz(state.llm.as_ref(), &state.prompts, &state.limits, req).await
}

/// The fixed quickfire variant: medium difficulty, every type, configured size.
pub async fn quickfire_for(state: &AppState, content: String) -> Result<QuestionSet, QuizError> {
  let req = QuizRequest {
    content,
    count: state.limits.quickfire_count,
    difficulty: Difficulty::Medium,
    types: QuestionType::ALL.to_vec(),
  };
  quiz_for(state, &req).await
}

pub async fn summary_for(state: &AppState, req: &SummaryRequest) -> Result<String, QuizError> {
  summarize(state.llm.as_ref(), &state.prompts, &state.limits, req).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  /// Canned completion that records the prompts it was given.
  struct Canned {
    pub reply: Result<String, String>,
    pub seen: Mutex<Vec<(String, u32)>>,
  }

  impl Canned {
    pub fn ok(reply: &str) -> Self {
      Self { reply: Ok(reply.into()), seen: Mutex::new(Vec::new()) }
    }
    pub fn err(msg: &str) -> Self {
      Self { reply: Err(msg.into()), seen: Mutex::new(Vec::new()) }
    }
  }

  impl Completion for Canned {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, String> {
      self.seen.lock().unwrap().push((prompt.to_string(), max_tokens));
      self.reply.clone()
    }
  }

  const REPLY: &str = r#"Here you go!
```json
[
  {"type": "mcq", "question": "What do plants absorb?", "options": ["CO2", "O2"], "correctIndex": 0, "hint": "Gas", "explanation": "Photosynthesis uses CO2."},
  {"type": "fillblank", "question": "Plants make ___.", "correctAnswer": "glucose"},
  {"type": "truefalse", "question": "Chlorophyll is green.", "options": ["True", "False"], "correctIndex": 0},
  {"type": "mcq", "options": ["x"], "correctIndex": 0}
]
```"#;

  fn request(count: usize) -> QuizRequest {
    QuizRequest {
      content: "Photosynthesis converts light into chemical energy.".into(),
      count,
      difficulty: Difficulty::Hard,
      types: QuestionType::ALL.to_vec(),
    }
  }

  #[test]
  fn token_budget_is_capped() {
    assert_eq!(quiz_token_budget(10), 1800);
    assert_eq!(quiz_token_budget(50), 4000);
  }

  #[tokio::test]
  async fn pipeline_builds_validated_set() {
    let llm = Canned::ok(REPLY);
    let set = generate_quiz(Some(&llm), &Prompts::default(), &Limits::default(), &request(10)).await.unwrap();
    assert_eq!(set.len(), 3);

    let seen = llm.seen.lock().unwrap();
    let (prompt, budget) = &seen[0];
    assert_eq!(*budget, 1800);
    assert!(prompt.starts_with("Create 10 quiz questions (complex concepts requiring deep understanding)"));
    assert!(prompt.contains("- 4 MCQ questions\n- 3 FILLBLANK questions\n- 3 TRUEFALSE questions"));
    assert!(prompt.ends_with("Photosynthesis converts light into chemical energy."));
  }

  #[tokio::test]
  async fn result_is_cut_to_requested_count() {
    let llm = Canned::ok(REPLY);
    let set = generate_quiz(Some(&llm), &Prompts::default(), &Limits::default(), &request(2)).await.unwrap();
    assert_eq!(set.len(), 2);
  }

  #[tokio::test]
  async fn long_content_and_count_are_clamped() {
    let llm = Canned::ok(REPLY);
    let limits = Limits { max_content_chars: 10, max_question_count: 3, ..Limits::default() };
    let mut req = request(40);
    req.content = "abcdefghijklmnopqrstuvwxyz".into();
    generate_quiz(Some(&llm), &Prompts::default(), &limits, &req).await.unwrap();
    let seen = llm.seen.lock().unwrap();
    assert!(seen[0].0.contains("Create 3 quiz questions"));
    assert!(seen[0].0.ends_with("abcdefghij..."));
  }

  #[tokio::test]
  async fn failures_abort_with_the_right_stage() {
    let p = Prompts::default();
    let l = Limits::default();

    let mut empty = request(5);
    empty.content = "   ".into();
    let e = generate_quiz(Some(&Canned::ok(REPLY)), &p, &l, &empty).await.unwrap_err();
    assert_eq!(e, QuizError::InvalidRequest("No content provided".into()));

    let mut no_types = request(5);
    no_types.types.clear();
    assert!(matches!(generate_quiz(Some(&Canned::ok(REPLY)), &p, &l, &no_types).await, Err(QuizError::InvalidRequest(_))));

    let e = generate_quiz(Some(&Canned::err("API Error (402): insufficient credits")), &p, &l, &request(5)).await.unwrap_err();
    assert_eq!(e, QuizError::Transport("API Error (402): insufficient credits".into()));

    let e = generate_quiz(None::<&Canned>, &p, &l, &request(5)).await.unwrap_err();
    assert_eq!(e, QuizError::Transport("API key not configured".into()));

    let e = generate_quiz(Some(&Canned::ok("I'm sorry, I can't do that.")), &p, &l, &request(5)).await.unwrap_err();
    assert_eq!(e, QuizError::NoArrayFound);

    let e = generate_quiz(Some(&Canned::ok(r#"[{"type":"mcq"}]"#)), &p, &l, &request(5)).await.unwrap_err();
    assert_eq!(e, QuizError::EmptyResult);
  }

  #[tokio::test]
  async fn summary_strips_preamble() {
    let llm = Canned::ok("Here's a summary of the text:\n\nPlants turn light into sugar.");
    let req = SummaryRequest {
      content: "Long chapter on photosynthesis".into(),
      length: SummaryLength::Short,
      format: SummaryFormat::Points,
    };
    let out = summarize(Some(&llm), &Prompts::default(), &Limits::default(), &req).await.unwrap();
    assert_eq!(out, "Plants turn light into sugar.");
    let seen = llm.seen.lock().unwrap();
    assert_eq!(seen[0].1, 500);
    assert!(seen[0].0.starts_with("Summarize this text in 150 words or less. Write as bullet points with key information."));
  }
}
