//! Domain models: question types, validated questions, question sets and request knobs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of question types the generator may be asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
  Mcq,
  Fillblank,
  Truefalse,
}

impl QuestionType {
  pub const ALL: [QuestionType; 3] = [QuestionType::Mcq, QuestionType::Fillblank, QuestionType::Truefalse];

  pub fn as_str(&self) -> &'static str {
    match self {
      QuestionType::Mcq => "mcq",
      QuestionType::Fillblank => "fillblank",
      QuestionType::Truefalse => "truefalse",
    }
  }
}

impl fmt::Display for QuestionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for QuestionType {
  type Err = ();
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "mcq" => Ok(QuestionType::Mcq),
      "fillblank" => Ok(QuestionType::Fillblank),
      "truefalse" => Ok(QuestionType::Truefalse),
      _ => Err(()),
    }
  }
}

/// Parse a comma-separated type list. Unknown names are skipped and repeats
/// collapse onto their first occurrence, so request order is preserved.
pub fn parse_type_list(raw: &str) -> Vec<QuestionType> {
  let mut out = Vec::new();
  for t in raw.split(',').filter_map(|s| s.parse::<QuestionType>().ok()) {
    if !out.contains(&t) {
      out.push(t);
    }
  }
  out
}

/// Answer key of a question. Choice questions carry options + index,
/// fill-in-the-blank carries a reference string; never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerKey {
  Choice { options: Vec<String>, correct_index: usize },
  Text { correct_answer: String },
}

/// One validated quiz item. Immutable once built by the validator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
  pub kind: QuestionType,
  pub text: String,
  pub key: AnswerKey,
  pub hint: String,
  pub explanation: String,
}

impl Question {
  pub fn options(&self) -> Option<&[String]> {
    match &self.key {
      AnswerKey::Choice { options, .. } => Some(options),
      AnswerKey::Text { .. } => None,
    }
  }

  pub fn correct_index(&self) -> Option<usize> {
    match &self.key {
      AnswerKey::Choice { correct_index, .. } => Some(*correct_index),
      AnswerKey::Text { .. } => None,
    }
  }

  pub fn correct_answer(&self) -> Option<&str> {
    match &self.key {
      AnswerKey::Text { correct_answer } => Some(correct_answer),
      AnswerKey::Choice { .. } => None,
    }
  }

  /// Human-readable expected answer, used in grade reports.
  pub fn expected_display(&self) -> String {
    match &self.key {
      AnswerKey::Choice { options, correct_index } => {
        options.get(*correct_index).cloned().unwrap_or_default()
      }
      AnswerKey::Text { correct_answer } => correct_answer.clone(),
    }
  }
}

/// Ordered, non-empty sequence of validated questions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionSet(Vec<Question>);

impl QuestionSet {
  /// Returns `None` for an empty vector: an empty quiz is never a valid set.
  pub fn new(questions: Vec<Question>) -> Option<Self> {
    if questions.is_empty() { None } else { Some(Self(questions)) }
  }

  pub fn len(&self) -> usize { self.0.len() }

  #[cfg(test)]
  pub fn get(&self, index: usize) -> Option<&Question> { self.0.get(index) }

  pub fn iter(&self) -> std::slice::Iter<'_, Question> { self.0.iter() }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

impl Difficulty {
  /// Phrase inserted into the generation prompt.
  pub fn describe(&self) -> &'static str {
    match self {
      Difficulty::Easy => "simple, straightforward concepts",
      Difficulty::Medium => "standard difficulty with moderate depth",
      Difficulty::Hard => "complex concepts requiring deep understanding",
    }
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
  Short,
  #[default]
  Medium,
  Long,
}

impl SummaryLength {
  pub fn word_budget(&self) -> &'static str {
    match self {
      SummaryLength::Short => "150 words",
      SummaryLength::Medium => "500 words",
      SummaryLength::Long => "800 words",
    }
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
  #[default]
  Paragraph,
  Points,
  Headings,
  Mixed,
}

impl SummaryFormat {
  pub fn instructions(&self) -> &'static str {
    match self {
      SummaryFormat::Paragraph => "Write as flowing paragraphs.",
      SummaryFormat::Points => "Write as bullet points with key information.",
      SummaryFormat::Headings => "Organize with headings and subheadings.",
      SummaryFormat::Mixed => "Use a mix of paragraphs, headings, and bullet points for best clarity.",
    }
  }
}
