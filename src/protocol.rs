//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{parse_type_list, Difficulty, Question, QuestionSet, QuestionType, SummaryFormat, SummaryLength};
use crate::grading::{Answer, GradeReport};
use crate::logic::{QuizRequest, SummaryRequest};
use crate::session::QuizMode;

const DEFAULT_COUNT: usize = 10;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    GenerateQuiz {
        content: String,
        #[serde(default)]
        count: Option<CountIn>,
        #[serde(default)]
        difficulty: Option<Difficulty>,
        #[serde(default)]
        types: Option<TypesIn>,
    },
    StartQuickfire {
        content: String,
    },
    Answer {
        index: usize,
        #[serde(default)]
        value: Answer,
    },
    Submit,
    Retry,
    NewQuiz,
}

/// Messages the server sends back over WebSocket.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Quiz {
        #[serde(rename = "sessionId")]
        session_id: String,
        mode: QuizMode,
        #[serde(rename = "timeLimit", skip_serializing_if = "Option::is_none")]
        time_limit: Option<u32>,
        questions: Vec<QuestionOut>,
    },
    AnswerAck {
        index: usize,
        complete: bool,
        unanswered: usize,
    },
    Tick {
        remaining: u32,
        clock: String,
        warning: bool,
    },
    Graded {
        report: GradeReport,
        summary: String,
        #[serde(rename = "timedOut")]
        timed_out: bool,
    },
    Reset,
    Error {
        message: String,
    },
}

/// Wire shape of one question, as the browser renders it.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub hint: String,
    pub explanation: String,
}

/// Convert a validated `Question` (internal) to the public DTO.
pub fn to_out(q: &Question) -> QuestionOut {
    QuestionOut {
        kind: q.kind,
        question: q.text.clone(),
        options: q.options().map(<[String]>::to_vec),
        correct_index: q.correct_index(),
        correct_answer: q.correct_answer().map(str::to_string),
        hint: q.hint.clone(),
        explanation: q.explanation.clone(),
    }
}

pub fn set_to_out(set: &QuestionSet) -> Vec<QuestionOut> {
    set.iter().map(to_out).collect()
}

//
// Request knobs accepted in more than one shape
//

/// Question count as any JSON number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CountIn {
    Num(serde_json::Number),
    Text(String),
}

impl CountIn {
    /// Fractions are cut toward zero; negative or unparsable counts become 0,
    /// which the distributor rejects.
    pub fn value(&self) -> usize {
        match self {
            CountIn::Num(n) => match (n.as_u64(), n.as_f64()) {
                (Some(u), _) => usize::try_from(u).unwrap_or(usize::MAX),
                (None, Some(f)) if f >= 1.0 => f as usize,
                _ => 0,
            },
            CountIn::Text(s) => {
                let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
                digits.parse().unwrap_or(0)
            }
        }
    }
}

/// Question types as "mcq,fillblank" or ["mcq", "fillblank"].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TypesIn {
    Csv(String),
    List(Vec<String>),
}

impl TypesIn {
    pub fn parse(&self) -> Vec<QuestionType> {
        match self {
            TypesIn::Csv(s) => parse_type_list(s),
            TypesIn::List(items) => parse_type_list(&items.join(",")),
        }
    }
}

pub fn quiz_request(content: String, count: Option<CountIn>, difficulty: Option<Difficulty>, types: Option<TypesIn>) -> QuizRequest {
    QuizRequest {
        content,
        count: count.map(|c| c.value()).unwrap_or(DEFAULT_COUNT),
        difficulty: difficulty.unwrap_or_default(),
        types: types.map(|t| t.parse()).unwrap_or_else(|| QuestionType::ALL.to_vec()),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct QuizIn {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub count: Option<CountIn>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub types: Option<TypesIn>,
}

impl QuizIn {
    pub fn into_request(self) -> QuizRequest {
        quiz_request(self.content, self.count, self.difficulty, self.types)
    }
}

#[derive(Serialize)]
pub struct QuizOut {
    pub questions: Vec<QuestionOut>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryIn {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub length: SummaryLength,
    #[serde(default)]
    pub format: SummaryFormat,
}

impl SummaryIn {
    pub fn into_request(self) -> SummaryRequest {
        SummaryRequest { content: self.content, length: self.length, format: self.format }
    }
}

#[derive(Serialize)]
pub struct SummaryOut {
    pub summary: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub llm: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnswerKey;
    use serde_json::json;

    #[test]
    fn question_wire_shape_omits_unused_key_fields() {
        let fill = Question {
            kind: QuestionType::Fillblank,
            text: "H2O is ___".into(),
            key: AnswerKey::Text { correct_answer: "water".into() },
            hint: "drink".into(),
            explanation: "chemistry".into(),
        };
        assert_eq!(
            serde_json::to_value(to_out(&fill)).unwrap(),
            json!({"type": "fillblank", "question": "H2O is ___", "correctAnswer": "water", "hint": "drink", "explanation": "chemistry"})
        );
    }

    #[test]
    fn quiz_in_defaults_and_shapes() {
        let req: QuizIn = serde_json::from_value(json!({"content": "notes"})).unwrap();
        let req = req.into_request();
        assert_eq!(req.count, 10);
        assert_eq!(req.difficulty, Difficulty::Medium);
        assert_eq!(req.types, QuestionType::ALL.to_vec());

        let req: QuizIn = serde_json::from_value(json!({"content": "n", "count": "7", "difficulty": "hard", "types": ["truefalse", "mcq"]})).unwrap();
        let req = req.into_request();
        assert_eq!(req.count, 7);
        assert_eq!(req.difficulty, Difficulty::Hard);
        assert_eq!(req.types, vec![QuestionType::Truefalse, QuestionType::Mcq]);

        let req: QuizIn = serde_json::from_value(json!({"content": "n", "count": 3, "types": "fillblank,bogus"})).unwrap();
        let req = req.into_request();
        assert_eq!(req.count, 3);
        assert_eq!(req.types, vec![QuestionType::Fillblank]);
    }

    #[test]
    fn odd_numeric_counts_still_parse() {
        let count = |v: serde_json::Value| {
            let req: QuizIn = serde_json::from_value(json!({"content": "n", "count": v})).unwrap();
            req.into_request().count
        };
        assert_eq!(count(json!(-3)), 0);
        assert_eq!(count(json!(7.5)), 7);
        assert_eq!(count(json!(0.4)), 0);
        assert_eq!(count(json!("-3")), 0);

        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"generate_quiz","content":"x","count":-3}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::GenerateQuiz { count: Some(ref c), .. } if c.value() == 0));
    }

    #[test]
    fn client_messages_parse() {
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"answer","index":2,"value":"Paris"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Answer { index: 2, value: Answer::Text(ref s) } if s == "Paris"));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"answer","index":0,"value":3}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Answer { index: 0, value: Answer::Choice(3) }));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"answer","index":0,"value":null}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Answer { value: Answer::Unanswered, .. }));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"start_quickfire","content":"notes"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::StartQuickfire { .. }));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"new_quiz"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::NewQuiz));
    }

    #[test]
    fn server_messages_are_tagged() {
        let v = serde_json::to_value(ServerWsMessage::Tick { remaining: 9, clock: "00:09".into(), warning: true }).unwrap();
        assert_eq!(v, json!({"type": "tick", "remaining": 9, "clock": "00:09", "warning": true}));
        let v = serde_json::to_value(ServerWsMessage::AnswerAck { index: 1, complete: false, unanswered: 2 }).unwrap();
        assert_eq!(v["type"], "answer_ack");
    }
}
