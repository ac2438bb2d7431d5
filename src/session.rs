//! Quiz session state machine.
//!
//! `Idle → Rendering → Collecting → Grading → Graded`
//!
//! A session exclusively owns the loaded question set, the current attempt and
//! (in quickfire mode) the countdown task. Every mutation goes through a method
//! here; the websocket layer only translates messages into these calls.
//! Grading runs at most once per attempt: whichever of manual submit and
//! countdown expiry gets there first wins, the other becomes a no-op.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::QuestionSet;
use crate::errors::SessionError;
use crate::grading::{grade, Answer, Attempt, GradeReport};
use crate::timer::Countdown;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Idle,
  Rendering,
  Collecting,
  Grading,
  Graded,
}

impl Phase {
  fn name(&self) -> &'static str {
    match self {
      Phase::Idle => "idle",
      Phase::Rendering => "rendering",
      Phase::Collecting => "collecting",
      Phase::Grading => "grading",
      Phase::Graded => "graded",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuizMode {
  Standard,
  /// Single countdown shared by all questions.
  Quickfire { seconds: u32, warning_at: u32 },
}

impl QuizMode {
  pub fn time_limit(&self) -> Option<u32> {
    match self {
      QuizMode::Standard => None,
      QuizMode::Quickfire { seconds, .. } => Some(*seconds),
    }
  }
}

#[derive(Debug, PartialEq)]
pub enum TickOutcome {
  /// No countdown is running for the current phase.
  Inactive,
  Running { remaining: u32, warning: bool },
  /// Time ran out and this tick performed the forced grading.
  Expired(GradeReport),
}

#[derive(Debug)]
pub struct QuizSession {
  id: String,
  phase: Phase,
  mode: QuizMode,
  questions: Option<QuestionSet>,
  attempt: Attempt,
  remaining: u32,
  report: Option<GradeReport>,
  countdown: Option<Countdown>,
}

impl Default for QuizSession {
  fn default() -> Self { Self::new() }
}

impl QuizSession {
  pub fn new() -> Self {
    Self {
      id: String::new(),
      phase: Phase::Idle,
      mode: QuizMode::Standard,
      questions: None,
      attempt: Attempt::new(0),
      remaining: 0,
      report: None,
      countdown: None,
    }
  }

  pub fn id(&self) -> &str { &self.id }
  pub fn phase(&self) -> Phase { self.phase }
  pub fn mode(&self) -> QuizMode { self.mode }
  pub fn questions(&self) -> Option<&QuestionSet> { self.questions.as_ref() }
  pub fn attempt(&self) -> &Attempt { &self.attempt }
  pub fn report(&self) -> Option<&GradeReport> { self.report.as_ref() }
  pub fn remaining(&self) -> Option<u32> { self.mode.time_limit().map(|_| self.remaining) }

  /// Load a fresh question set, replacing whatever was there (timer included).
  pub fn load(&mut self, questions: QuestionSet, mode: QuizMode) -> &str {
    self.cancel_countdown();
    self.id = Uuid::new_v4().to_string();
    self.attempt = Attempt::new(questions.len());
    self.questions = Some(questions);
    self.mode = mode;
    self.remaining = mode.time_limit().unwrap_or(0);
    self.report = None;
    self.phase = Phase::Rendering;
    info!(target: "quiz", session = %self.id, questions = self.attempt.len(), ?mode, "Quiz loaded");
    &self.id
  }

  /// The renderer finished building the quiz; answers are accepted from now on.
  pub fn begin_collecting(&mut self) -> Result<(), SessionError> {
    self.expect_phase(Phase::Rendering)?;
    self.phase = Phase::Collecting;
    Ok(())
  }

  /// Start the quickfire countdown. Returns false outside a quickfire quiz in
  /// `Collecting`. Any previous countdown is cancelled first.
  pub fn arm_countdown(&mut self, period: Duration) -> bool {
    self.cancel_countdown();
    if self.phase != Phase::Collecting || self.mode.time_limit().is_none() {
      return false;
    }
    self.countdown = Some(Countdown::start(period));
    debug!(target: "quiz", session = %self.id, remaining = self.remaining, "Countdown armed");
    true
  }

  /// Resolves on the next countdown tick; never resolves without a countdown.
  pub async fn next_tick(&mut self) -> Option<()> {
    match self.countdown.as_mut() {
      Some(cd) => cd.tick().await,
      None => std::future::pending().await,
    }
  }

  /// Advance the quickfire clock by one unit.
  pub fn tick(&mut self) -> TickOutcome {
    let QuizMode::Quickfire { warning_at, .. } = self.mode else {
      return TickOutcome::Inactive;
    };
    if self.phase != Phase::Collecting || self.remaining == 0 {
      return TickOutcome::Inactive;
    }
    self.remaining -= 1;
    if self.remaining > 0 {
      return TickOutcome::Running { remaining: self.remaining, warning: self.remaining <= warning_at };
    }
    info!(target: "quiz", session = %self.id, "Quickfire time expired; forcing submission");
    match self.submit() {
      Ok(report) => TickOutcome::Expired(report),
      Err(_) => TickOutcome::Inactive,
    }
  }

  pub fn apply_answer(&mut self, index: usize, answer: Answer) -> Result<&Attempt, SessionError> {
    self.expect_phase(Phase::Collecting)?;
    let len = self.attempt.len();
    if !self.attempt.set(index, answer) {
      return Err(SessionError::IndexOutOfRange { index, len });
    }
    Ok(&self.attempt)
  }

  /// Whether every question has an answer. Submitting an incomplete attempt is
  /// allowed; callers use this to decide whether to ask for confirmation first.
  pub fn is_complete(&self) -> bool { self.attempt.is_complete() }

  /// Grade the current attempt. Only valid while `Collecting`, so a second
  /// submit (manual or timed) is rejected instead of grading twice.
  pub fn submit(&mut self) -> Result<GradeReport, SessionError> {
    self.expect_phase(Phase::Collecting)?;
    self.cancel_countdown();
    self.phase = Phase::Grading;

    let questions = self.questions.as_ref().ok_or(SessionError::NoQuiz)?;
    let elapsed = self.mode.time_limit().map(|limit| limit - self.remaining);
    let report = grade(questions, &self.attempt, elapsed);

    info!(target: "quiz", session = %self.id, correct = report.correct, total = report.total, elapsed = ?elapsed, "Attempt graded");
    self.report = Some(report.clone());
    self.phase = Phase::Graded;
    Ok(report)
  }

  /// Fresh attempt over the same question set; back to `Rendering`.
  pub fn retry(&mut self) -> Result<(), SessionError> {
    self.expect_phase(Phase::Graded)?;
    self.cancel_countdown();
    self.attempt = Attempt::new(self.attempt.len());
    self.remaining = self.mode.time_limit().unwrap_or(0);
    self.report = None;
    self.phase = Phase::Rendering;
    debug!(target: "quiz", session = %self.id, "Retrying quiz");
    Ok(())
  }

  /// Discard the quiz entirely and return to `Idle`.
  pub fn new_quiz(&mut self) {
    if self.phase != Phase::Idle {
      debug!(target: "quiz", session = %self.id, phase = self.phase.name(), "Session discarded");
    }
    *self = Self::new();
  }

  fn cancel_countdown(&mut self) {
    if let Some(mut cd) = self.countdown.take() {
      cd.cancel();
    }
  }

  fn expect_phase(&self, want: Phase) -> Result<(), SessionError> {
    if self.questions.is_none() {
      return Err(SessionError::NoQuiz);
    }
    if self.phase != want {
      return Err(SessionError::WrongPhase(self.phase.name()));
    }
    Ok(())
  }
}
