//! Scoring of a finished attempt.
//!
//! Grading never fails: unanswered or mistyped answers simply score as wrong.
//! Fill-in-the-blank answers use the tolerant "fuzzy" rule: case-insensitive,
//! trimmed, equal or either side containing the other. Empty submissions are
//! always wrong, otherwise they would be "contained" in every reference.

use serde::{Deserialize, Serialize};

use crate::domain::{AnswerKey, Question, QuestionSet};

/// The user's current answer to one question.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
  #[default]
  Unanswered,
  Choice(usize),
  Text(String),
}

impl Answer {
  pub fn is_answered(&self) -> bool {
    !matches!(self, Answer::Unanswered)
  }
}

/// Per-session answer sheet: one slot per question, all unanswered at creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attempt(Vec<Answer>);

impl Attempt {
  pub fn new(len: usize) -> Self {
    Self(vec![Answer::Unanswered; len])
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn get(&self, index: usize) -> &Answer {
    self.0.get(index).unwrap_or(&Answer::Unanswered)
  }

  /// Replace the answer at `index`; text answers are stored trimmed and an
  /// empty string clears the slot.
  pub fn set(&mut self, index: usize, answer: Answer) -> bool {
    let Some(slot) = self.0.get_mut(index) else { return false };
    *slot = match answer {
      Answer::Text(s) if s.trim().is_empty() => Answer::Unanswered,
      Answer::Text(s) => Answer::Text(s.trim().to_string()),
      other => other,
    };
    true
  }

  pub fn unanswered(&self) -> usize {
    self.0.iter().filter(|a| !a.is_answered()).count()
  }

  pub fn is_complete(&self) -> bool { self.unanswered() == 0 }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionVerdict {
  pub index: usize,
  pub correct: bool,
  pub submitted: Answer,
  pub expected: String,
  pub explanation: String,
}

/// Read-only result of grading one attempt.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
  pub correct: usize,
  pub total: usize,
  /// `correct / total` in `0.0..=1.0`.
  pub score: f32,
  pub percent: u32,
  pub verdicts: Vec<QuestionVerdict>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub elapsed_secs: Option<u32>,
}

impl GradeReport {
  pub fn fraction(&self) -> String {
    format!("{}/{}", self.correct, self.total)
  }

  /// Thresholds compare exact counts, not the rounded `percent`.
  pub fn verdict(&self) -> &'static str {
    let scaled = self.correct * 100;
    if self.total > 0 && scaled >= 80 * self.total {
      "Excellent!"
    } else if self.total > 0 && scaled >= 60 * self.total {
      "Good job!"
    } else {
      "Keep practicing!"
    }
  }

  /// Plain-text summary for clipboard/export consumers.
  pub fn summary_text(&self) -> String {
    let mut out = format!("Score: {} ({}%)\n", self.fraction(), self.percent);
    if let Some(secs) = self.elapsed_secs {
      out.push_str(&format!("Time: {secs}s\n"));
    }
    out.push_str(self.verdict());
    out
  }
}

/// Case-insensitive, trimmed, bidirectional containment.
pub fn fuzzy_match(reference: &str, submission: &str) -> bool {
  let reference = reference.trim().to_lowercase();
  let submission = submission.trim().to_lowercase();
  if submission.is_empty() {
    return false;
  }
  reference == submission || reference.contains(&submission) || submission.contains(&reference)
}

pub fn is_correct(question: &Question, answer: &Answer) -> bool {
  match (&question.key, answer) {
    (AnswerKey::Choice { correct_index, .. }, Answer::Choice(picked)) => picked == correct_index,
    (AnswerKey::Text { correct_answer }, Answer::Text(typed)) => fuzzy_match(correct_answer, typed),
    _ => false,
  }
}

pub fn grade(questions: &QuestionSet, attempt: &Attempt, elapsed_secs: Option<u32>) -> GradeReport {
  let verdicts = questions
    .iter()
    .enumerate()
    .map(|(index, q)| {
      let submitted = attempt.get(index).clone();
      QuestionVerdict {
        index,
        correct: is_correct(q, &submitted),
        submitted,
        expected: q.expected_display(),
        explanation: q.explanation.clone(),
      }
    })
    .collect::<Vec<_>>();

  let total = questions.len();
  let correct = verdicts.iter().filter(|v| v.correct).count();
  let score = if total == 0 { 0.0 } else { correct as f32 / total as f32 };
  GradeReport {
    correct,
    total,
    score,
    percent: (score * 100.0).round() as u32,
    verdicts,
    elapsed_secs,
  }
}
