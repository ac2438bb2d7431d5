//! Pulls the JSON question array out of a free-text model reply.
//!
//! Models like to wrap JSON in markdown fences and chatty prose. We drop the
//! fence markers, take everything from the first `[` to the last `]` and hand
//! that to serde_json. No checks on the array contents happen here.

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::QuizError;

/// Remove "```json" / "```" fence markers wherever they appear.
fn strip_fences(raw: &str) -> String {
  let trimmed = raw.trim();
  if !trimmed.contains("```") {
    return trimmed.to_string();
  }
  trimmed.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn extract_array(raw: &str) -> Result<Vec<Value>, QuizError> {
  let cleaned = strip_fences(raw);

  let start = cleaned.find('[').ok_or(QuizError::NoArrayFound)?;
  // A reply cut off before its closing bracket is still an attempted array:
  // let the JSON parser report where it broke.
  let candidate = match cleaned.rfind(']') {
    Some(end) if end > start => &cleaned[start..=end],
    Some(_) => return Err(QuizError::NoArrayFound),
    None => &cleaned[start..],
  };

  match serde_json::from_str::<Value>(candidate) {
    Ok(Value::Array(items)) => {
      debug!(target: "quiz", items = items.len(), payload_len = candidate.len(), "Extracted JSON array");
      Ok(items)
    }
    Ok(other) => Err(QuizError::MalformedJson(format!("response is not an array (got {})", json_kind(&other)))),
    Err(e) => {
      warn!(target: "quiz", error = %e, payload_len = candidate.len(), "Model reply is not valid JSON");
      Err(QuizError::MalformedJson(e.to_string()))
    }
  }
}

fn json_kind(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn fenced_array_with_prose_comes_back_intact() {
    let arr = json!([
      {"type": "mcq", "question": "2+2?", "options": ["3", "4"], "correctIndex": 1},
      {"type": "fillblank", "question": "Capital of France is ___", "correctAnswer": "Paris"}
    ]);
    let raw = format!(
      "Sure! Here are your questions:\n```json\n{}\n```\nLet me know if you need more.",
      serde_json::to_string_pretty(&arr).unwrap()
    );
    let out = extract_array(&raw).unwrap();
    assert_eq!(Value::Array(out), arr);
  }

  #[test]
  fn bare_fence_without_language_tag() {
    let out = extract_array("```\n[1, 2, 3]\n```").unwrap();
    assert_eq!(out, vec![json!(1), json!(2), json!(3)]);
  }

  #[test]
  fn no_bracket_is_no_array() {
    assert_eq!(extract_array("I could not generate a quiz, sorry."), Err(QuizError::NoArrayFound));
    assert_eq!(extract_array(""), Err(QuizError::NoArrayFound));
  }

  #[test]
  fn closing_before_opening_is_no_array() {
    assert_eq!(extract_array("oops ] then [ nothing"), Err(QuizError::NoArrayFound));
  }

  #[test]
  fn truncated_array_is_malformed_with_detail() {
    match extract_array("[1, 2,") {
      Err(QuizError::MalformedJson(detail)) => assert!(detail.contains("EOF"), "{detail}"),
      other => panic!("expected MalformedJson, got {other:?}"),
    }
    match extract_array("[1, 2,]") {
      Err(QuizError::MalformedJson(detail)) => assert!(!detail.is_empty()),
      other => panic!("expected MalformedJson, got {other:?}"),
    }
  }

  #[test]
  fn prose_between_two_arrays_is_malformed() {
    assert!(matches!(extract_array("[1] and also [2]"), Err(QuizError::MalformedJson(_))));
  }
}
