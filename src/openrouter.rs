//! Minimal OpenRouter (OpenAI-compatible) chat client.
//!
//! We only call chat.completions with a single user message and get plain text
//! back; pulling structure out of that text is the parser's job.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "google/gemma-2-9b-it";

/// Anything that turns a prompt into raw model text.
/// Errors are opaque transport/quota messages passed through to the caller.
pub trait Completion {
  async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, String>;
}

#[derive(Clone)]
pub struct OpenRouter {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl OpenRouter {
  /// Construct the client if we find OPENROUTER_API_KEY; otherwise return None.
  pub fn from_env(timeout: Duration) -> Option<Self> {
    let api_key = std::env::var("OPENROUTER_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("OPENROUTER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }
}

impl Completion for OpenRouter {
  #[instrument(level = "info", target = "llm", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
  async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![ChatMessageReq { role: "user".into(), content: prompt.into() }],
      max_tokens,
      temperature: 0.7,
      top_p: 0.9,
      stream: false,
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "studytutor-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| {
        error!(target: "llm", error = %e, "Request to model provider failed");
        e.to_string()
      })?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "Unknown API error".into());
      error!(target: "llm", %status, elapsed = ?start.elapsed(), "Model provider returned an error");
      return Err(format!("API Error ({}): {}", status.as_u16(), msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(target: "llm", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Model usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .filter(|t| !t.is_empty())
      .ok_or_else(|| "No response from AI".to_string())?;

    info!(target: "llm", elapsed = ?start.elapsed(), reply_len = text.len(), "Model reply received");
    Ok(text)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  max_tokens: u32,
  temperature: f32,
  top_p: f32,
  stream: bool,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  #[serde(default)] choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { #[serde(default)] content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Pull a readable message out of an error body. Providers send either
/// `{"error": {"message": ...}}` or `{"error": "..."}`.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EBody }
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum EBody { Obj { message: String }, Text(String) }
  match serde_json::from_str::<EWrap>(body) {
    Ok(EWrap { error: EBody::Obj { message } }) => Some(message),
    Ok(EWrap { error: EBody::Text(message) }) => Some(message),
    Err(_) => None,
  }
}
