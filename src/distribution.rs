//! Splits a requested question count across the requested question types.
//!
//! Every type gets `n / k`; the `n % k` leftover questions go one each to the
//! first types in request order. The result is deterministic for a given input.

use tracing::debug;

use crate::domain::QuestionType;
use crate::errors::QuizError;

/// Per-type counts in request order. Counts always sum to the requested total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Distribution(Vec<(QuestionType, usize)>);

impl Distribution {
  pub fn entries(&self) -> &[(QuestionType, usize)] { &self.0 }

  #[cfg(test)]
  pub fn count_for(&self, t: QuestionType) -> usize {
    self.0.iter().find(|(k, _)| *k == t).map(|(_, n)| *n).unwrap_or(0)
  }

  pub fn total(&self) -> usize { self.0.iter().map(|(_, n)| n).sum() }
}

pub fn distribute(total: usize, types: &[QuestionType]) -> Result<Distribution, QuizError> {
  if total < 1 {
    return Err(QuizError::InvalidRequest("question count must be at least 1".into()));
  }
  if types.is_empty() {
    return Err(QuizError::InvalidRequest("no valid question types requested".into()));
  }
  for (i, t) in types.iter().enumerate() {
    if types[..i].contains(t) {
      return Err(QuizError::InvalidRequest(format!("question type '{t}' requested twice")));
    }
  }

  let k = types.len();
  let per_type = total / k;
  let remainder = total % k;
  let entries = types
    .iter()
    .enumerate()
    .map(|(idx, t)| (*t, per_type + usize::from(idx < remainder)))
    .collect::<Vec<_>>();

  debug!(target: "quiz", total, types = k, ?entries, "Computed type distribution");
  Ok(Distribution(entries))
}
