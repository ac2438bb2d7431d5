//! WebSocket upgrade + message loop. One connection owns one `QuizSession`.
//!
//! The loop waits on two sources at once: client frames and the session's
//! quickfire countdown, so an expiring timer grades the attempt without any
//! client input. Dropping the connection drops the session and its timer.

use std::{sync::Arc, time::Duration};
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument, warn};

use crate::grading::GradeReport;
use crate::logic::{quickfire_for, quiz_for};
use crate::protocol::{quiz_request, set_to_out, ClientWsMessage, ServerWsMessage};
use crate::session::{QuizMode, QuizSession, TickOutcome};
use crate::state::AppState;
use crate::timer::format_clock;

const TICK_PERIOD: Duration = Duration::from_secs(1);

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "studytutor_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Text frames in, server messages out. Implemented by the real socket and
/// by in-memory channels in tests.
trait Frames {
  /// Next client text frame; `None` once the peer is gone.
  async fn next_text(&mut self) -> Option<String>;
  async fn send_msg(&mut self, msg: &ServerWsMessage) -> Result<(), String>;
}

impl Frames for WebSocket {
  async fn next_text(&mut self) -> Option<String> {
    loop {
      match self.recv().await {
        Some(Ok(Message::Text(txt))) => return Some(txt),
        Some(Ok(Message::Ping(payload))) => { let _ = self.send(Message::Pong(payload)).await; }
        Some(Ok(Message::Close(_))) | None => return None,
        Some(Err(e)) => {
          warn!(target: "studytutor_backend", error = %e, "WS receive error");
          return None;
        }
        Some(Ok(_)) => {}
      }
    }
  }

  async fn send_msg(&mut self, msg: &ServerWsMessage) -> Result<(), String> {
    let out = serde_json::to_string(msg).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });
    self.send(Message::Text(out)).await.map_err(|e| e.to_string())
  }
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "studytutor_backend", "WebSocket connected");
  let mut session = QuizSession::new();

  drive(&mut socket, &state, &mut session).await;

  if let Some(report) = session.report() {
    info!(target: "quiz", session = %session.id(), score = %report.fraction(), "Closing session with a graded attempt");
  }
  session.new_quiz();
  info!(target: "studytutor_backend", "WebSocket disconnected");
}

/// Serve one connection until the peer leaves or a send fails. Client frames
/// and countdown ticks are handled in arrival order.
async fn drive<F: Frames>(conn: &mut F, state: &AppState, session: &mut QuizSession) {
  'conn: loop {
    tokio::select! {
      incoming = conn.next_text() => {
        let Some(txt) = incoming else { break 'conn };
        let replies = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "studytutor_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, state, session).await
          }
          Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
        };
        for reply in &replies {
          if let Err(e) = conn.send_msg(reply).await {
            error!(target: "studytutor_backend", error = %e, "WS send error");
            break 'conn;
          }
        }
      }
      Some(()) = session.next_tick() => {
        let reply = match session.tick() {
          TickOutcome::Running { remaining, warning } => {
            ServerWsMessage::Tick { remaining, clock: format_clock(remaining), warning }
          }
          TickOutcome::Expired(report) => graded(report, true),
          TickOutcome::Inactive => continue 'conn,
        };
        if let Err(e) = conn.send_msg(&reply).await {
          error!(target: "studytutor_backend", error = %e, "WS send error");
          break 'conn;
        }
      }
    }
  }
}

fn graded(report: GradeReport, timed_out: bool) -> ServerWsMessage {
  let summary = report.summary_text();
  ServerWsMessage::Graded { report, summary, timed_out }
}

/// Hand the loaded quiz to the client and open it for answers. Quickfire
/// quizzes start their countdown here.
fn present(session: &mut QuizSession) -> ServerWsMessage {
  let mode = session.mode();
  let msg = ServerWsMessage::Quiz {
    session_id: session.id().to_string(),
    mode,
    time_limit: session.remaining(),
    questions: session.questions().map(set_to_out).unwrap_or_default(),
  };
  if session.begin_collecting().is_ok() {
    session.arm_countdown(TICK_PERIOD);
  }
  msg
}

fn session_error(e: impl std::fmt::Display) -> Vec<ServerWsMessage> {
  vec![ServerWsMessage::Error { message: e.to_string() }]
}

#[instrument(level = "info", skip_all)]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session: &mut QuizSession) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],

    ClientWsMessage::GenerateQuiz { content, count, difficulty, types } => {
      session.new_quiz();
      let req = quiz_request(content, count, difficulty, types);
      match quiz_for(state, &req).await {
        Ok(set) => {
          session.load(set, QuizMode::Standard);
          vec![present(session)]
        }
        Err(e) => {
          warn!(target: "quiz", error = %e, stage = e.stage(), "WS quiz generation failed");
          session_error(e.user_message())
        }
      }
    }

    ClientWsMessage::StartQuickfire { content } => {
      session.new_quiz();
      match quickfire_for(state, content).await {
        Ok(set) => {
          let mode = QuizMode::Quickfire {
            seconds: state.limits.quickfire_seconds,
            warning_at: state.limits.quickfire_warning_seconds,
          };
          session.load(set, mode);
          vec![present(session)]
        }
        Err(e) => {
          warn!(target: "quiz", error = %e, stage = e.stage(), "WS quickfire generation failed");
          session_error(e.user_message())
        }
      }
    }

    ClientWsMessage::Answer { index, value } => match session.apply_answer(index, value) {
      Ok(attempt) => vec![ServerWsMessage::AnswerAck {
        index,
        complete: attempt.is_complete(),
        unanswered: attempt.unanswered(),
      }],
      Err(e) => session_error(e),
    },

    ClientWsMessage::Submit => match session.submit() {
      Ok(report) => {
        info!(target: "quiz", session = %session.id(), correct = report.correct, total = report.total, "WS attempt submitted");
        vec![graded(report, false)]
      }
      Err(e) => session_error(e),
    },

    ClientWsMessage::Retry => match session.retry() {
      Ok(()) => vec![present(session)],
      Err(e) => session_error(e),
    },

    ClientWsMessage::NewQuiz => {
      session.new_quiz();
      vec![ServerWsMessage::Reset]
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{Limits, Prompts};
  use crate::domain::{AnswerKey, Question, QuestionSet, QuestionType};
  use crate::grading::Answer;
  use crate::session::Phase;
  use tokio::sync::mpsc;

  /// In-memory connection: frames queued up front, replies collected.
  struct Channel {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: Vec<ServerWsMessage>,
  }

  impl Frames for Channel {
    async fn next_text(&mut self) -> Option<String> {
      self.inbound.recv().await
    }

    async fn send_msg(&mut self, msg: &ServerWsMessage) -> Result<(), String> {
      self.outbound.push(msg.clone());
      Ok(())
    }
  }

  fn state() -> AppState {
    AppState::with_parts(None, Prompts::default(), Limits::default())
  }

  fn loaded_session() -> QuizSession {
    let set = QuestionSet::new(vec![Question {
      kind: QuestionType::Fillblank,
      text: "Powerhouse of the cell?".into(),
      key: AnswerKey::Text { correct_answer: "mitochondria".into() },
      hint: "h".into(),
      explanation: "It produces ATP.".into(),
    }])
    .unwrap();
    let mut s = QuizSession::new();
    s.load(set, QuizMode::Standard);
    s
  }

  #[tokio::test]
  async fn generation_failure_reports_stage_and_stays_idle() {
    let st = state();
    let mut s = loaded_session();
    let msg = ClientWsMessage::GenerateQuiz { content: "cells".into(), count: None, difficulty: None, types: None };
    let out = handle_client_ws(msg, &st, &mut s).await;
    match &out[..] {
      [ServerWsMessage::Error { message }] => assert_eq!(message, "Quiz generation failed: API key not configured"),
      other => panic!("unexpected {other:?}"),
    }
    assert_eq!(s.phase(), Phase::Idle);
  }

  #[tokio::test]
  async fn negative_count_fails_at_request_stage() {
    let st = state();
    let mut s = loaded_session();
    let msg: ClientWsMessage = serde_json::from_str(r#"{"type":"generate_quiz","content":"cells","count":-3}"#).unwrap();
    let out = handle_client_ws(msg, &st, &mut s).await;
    match &out[..] {
      [ServerWsMessage::Error { message }] => {
        assert_eq!(message, "Quiz request failed: invalid request: question count must be at least 1")
      }
      other => panic!("unexpected {other:?}"),
    }
    assert_eq!(s.phase(), Phase::Idle);
  }

  #[tokio::test]
  async fn answer_submit_retry_round() {
    let st = state();
    let mut s = loaded_session();
    assert!(matches!(present(&mut s), ServerWsMessage::Quiz { time_limit: None, ref questions, .. } if questions.len() == 1));
    assert_eq!(s.phase(), Phase::Collecting);

    let out = handle_client_ws(ClientWsMessage::Answer { index: 0, value: Answer::Text("Mitochondria!".into()) }, &st, &mut s).await;
    assert!(matches!(out[..], [ServerWsMessage::AnswerAck { index: 0, complete: true, unanswered: 0 }]));

    let out = handle_client_ws(ClientWsMessage::Submit, &st, &mut s).await;
    match &out[..] {
      [ServerWsMessage::Graded { report, timed_out: false, summary }] => {
        assert_eq!(report.correct, 1);
        assert!(summary.starts_with("Score: 1/1 (100%)"));
      }
      other => panic!("unexpected {other:?}"),
    }

    let out = handle_client_ws(ClientWsMessage::Submit, &st, &mut s).await;
    assert!(matches!(out[..], [ServerWsMessage::Error { .. }]));

    let out = handle_client_ws(ClientWsMessage::Retry, &st, &mut s).await;
    assert!(matches!(out[..], [ServerWsMessage::Quiz { .. }]));
    assert_eq!(s.attempt().unanswered(), 1);

    let out = handle_client_ws(ClientWsMessage::NewQuiz, &st, &mut s).await;
    assert!(matches!(out[..], [ServerWsMessage::Reset]));
    assert_eq!(s.phase(), Phase::Idle);
  }

  #[tokio::test(start_paused = true)]
  async fn countdown_expiry_reaches_the_client_as_timed_out_grade() {
    let st = state();
    let mut s = QuizSession::new();
    s.load(loaded_session().questions().cloned().unwrap(), QuizMode::Quickfire { seconds: 60, warning_at: 10 });
    assert!(matches!(present(&mut s), ServerWsMessage::Quiz { time_limit: Some(60), .. }));

    let (tx, inbound) = mpsc::unbounded_channel();
    tx.send(r#"{"type":"answer","index":0,"value":"mitochondria"}"#.to_string()).unwrap();
    let mut conn = Channel { inbound, outbound: Vec::new() };

    // The sender stays alive, so only the timeout ends the loop.
    let ended = tokio::time::timeout(Duration::from_secs(90), drive(&mut conn, &st, &mut s)).await;
    assert!(ended.is_err());
    drop(tx);

    let out = &conn.outbound;
    assert!(matches!(out[0], ServerWsMessage::AnswerAck { index: 0, complete: true, .. }));
    let ticks: Vec<u32> = out
      .iter()
      .filter_map(|m| match m {
        ServerWsMessage::Tick { remaining, .. } => Some(*remaining),
        _ => None,
      })
      .collect();
    assert_eq!(ticks, (1..=59).rev().collect::<Vec<_>>());
    assert!(matches!(out[50], ServerWsMessage::Tick { remaining: 10, warning: true, .. }));

    let graded: Vec<_> = out.iter().filter(|m| matches!(m, ServerWsMessage::Graded { .. })).collect();
    assert_eq!(graded.len(), 1);
    match graded[0] {
      ServerWsMessage::Graded { report, timed_out, summary } => {
        assert!(*timed_out);
        assert_eq!(report.correct, 1);
        assert_eq!(report.elapsed_secs, Some(60));
        assert!(summary.contains("Time: 60s"));
      }
      other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(out.last(), Some(ServerWsMessage::Graded { .. })));
    assert_eq!(s.phase(), Phase::Graded);
  }
}
