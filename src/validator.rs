//! Turns the untyped records extracted from a model reply into a `QuestionSet`.
//!
//! Bad records are dropped one by one; only a result with zero survivors is an
//! error. Survivors are trimmed, defaulted and cut to the requested count.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::domain::{AnswerKey, Question, QuestionSet, QuestionType};
use crate::errors::QuizError;

pub const DEFAULT_HINT: &str = "Think about the key concepts from the material.";
pub const DEFAULT_EXPLANATION: &str = "Review this topic for better understanding.";

pub fn validate_questions(records: Vec<Value>, max_count: usize) -> Result<QuestionSet, QuizError> {
  let total = records.len();
  let mut kept = Vec::new();

  for (idx, record) in records.iter().enumerate() {
    if kept.len() == max_count {
      break;
    }
    match normalize(record) {
      Ok(q) => kept.push(q),
      Err(reason) => debug!(target: "quiz", index = idx, reason, "Dropped malformed question record"),
    }
  }

  info!(target: "quiz", received = total, kept = kept.len(), max_count, "Validated question records");
  QuestionSet::new(kept).ok_or(QuizError::EmptyResult)
}

fn normalize(record: &Value) -> Result<Question, &'static str> {
  let obj = record.as_object().ok_or("record is not an object")?;

  // Prompts ask for "question"; "text" is accepted as well.
  let text = non_empty_str(obj, "text")
    .or_else(|| non_empty_str(obj, "question"))
    .ok_or("missing question text")?;

  let kind = match obj.get("type") {
    None | Some(Value::Null) => QuestionType::Mcq,
    Some(Value::String(s)) => s.parse::<QuestionType>().map_err(|_| "unrecognized question type")?,
    Some(_) => return Err("unrecognized question type"),
  };

  let key = match kind {
    QuestionType::Fillblank => {
      let correct_answer = obj
        .get("correctAnswer")
        .and_then(scalar_to_string)
        .filter(|s| !s.is_empty())
        .ok_or("fillblank without correctAnswer")?;
      AnswerKey::Text { correct_answer }
    }
    QuestionType::Mcq | QuestionType::Truefalse => {
      let options = match obj.get("options") {
        Some(Value::Array(items)) if !items.is_empty() => items.iter().map(option_text).collect::<Option<Vec<_>>>(),
        _ => return Err("missing or empty options"),
      };
      let options = options.ok_or("null or blank option")?;
      let correct_index = obj
        .get("correctIndex")
        .and_then(Value::as_u64)
        .ok_or("correctIndex is not a non-negative integer")? as usize;
      if correct_index >= options.len() {
        return Err("correctIndex out of range");
      }
      AnswerKey::Choice { options, correct_index }
    }
  };

  Ok(Question {
    kind,
    text,
    key,
    hint: non_empty_str(obj, "hint").unwrap_or_else(|| DEFAULT_HINT.to_string()),
    explanation: non_empty_str(obj, "explanation").unwrap_or_else(|| DEFAULT_EXPLANATION.to_string()),
  })
}

fn non_empty_str(obj: &Map<String, Value>, field: &str) -> Option<String> {
  obj
    .get(field)
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}

/// Strings, numbers and booleans all count as an answer string.
fn scalar_to_string(v: &Value) -> Option<String> {
  match v {
    Value::String(s) => Some(s.trim().to_string()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

/// `None` for options nobody could pick: null or blank.
fn option_text(v: &Value) -> Option<String> {
  let text = match v {
    Value::String(s) => s.trim().to_string(),
    Value::Null => return None,
    other => other.to_string().trim().to_string(),
  };
  (!text.is_empty()).then_some(text)
}
