//! Generative-text collaborator: port trait, OpenAI-compatible client, retry
//! policy, and the response parser.
//!
//! We only call chat.completions and always request a strict JSON array
//! (one object per input item). Calls are instrumented and log model names,
//! latencies, and response sizes (not contents).
//!
//! Every failure class here (timeout, non-success status, content filter,
//! malformed/short array, retries exhausted) is absorbed by the calling
//! stage's deterministic fallback. Nothing in this module reaches a client
//! response.
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::util::trunc_for_log;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 250;
const JITTER_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum GenAiError {
  #[error("request timed out")]
  Timeout,
  #[error("HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("content blocked by safety filter")]
  ContentFiltered,
  #[error("parse error: {0}")]
  Parse(String),
}

/// One batched structured-array request.
#[derive(Clone, Debug)]
pub struct GenRequest {
  pub instructions: String, // system message
  pub prompt: String,       // user message
  pub temperature: f32,
  pub max_tokens: Option<u32>,
  /// How many array elements the caller expects back.
  pub expected_len: usize,
}

/// Injected seam for the generative collaborator, so pipeline stages can be
/// exercised against deterministic doubles.
#[async_trait]
pub trait TextGenerationPort: Send + Sync {
  /// Submit one request; return a well-formed array of exactly
  /// `req.expected_len` objects, or an error.
  async fn generate_array(&self, req: &GenRequest) -> Result<Vec<Value>, GenAiError>;
}

/// Bounded retry around a port call: up to `MAX_ATTEMPTS` tries with
/// exponential backoff plus a little jitter. Exhaustion surfaces the last
/// error; callers fall back, they never fail the request.
#[instrument(level = "info", skip(port, req), fields(expected_len = req.expected_len))]
pub async fn generate_with_retry(
  port: &dyn TextGenerationPort,
  req: &GenRequest,
) -> Result<Vec<Value>, GenAiError> {
  let mut last_err = GenAiError::Parse("no attempts made".into());
  for attempt in 1..=MAX_ATTEMPTS {
    let start = std::time::Instant::now();
    match port.generate_array(req).await {
      Ok(items) => {
        info!(target: "pathgen", attempt, elapsed = ?start.elapsed(), "generative call succeeded");
        return Ok(items);
      }
      Err(e) => {
        warn!(target: "pathgen", attempt, error = %e, "generative call failed");
        last_err = e;
      }
    }
    if attempt < MAX_ATTEMPTS {
      let jitter = rand::thread_rng().gen_range(0..JITTER_MS);
      let delay = BACKOFF_BASE_MS * 2u64.pow(attempt - 1) + jitter;
      tokio::time::sleep(Duration::from_millis(delay)).await;
    }
  }
  Err(last_err)
}

#[derive(Clone)]
pub struct OpenAi {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
}

impl OpenAi {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model })
  }
}

#[async_trait]
impl TextGenerationPort for OpenAi {
  #[instrument(level = "info", skip(self, req), fields(model = %self.strong_model, expected_len = req.expected_len))]
  async fn generate_array(&self, req: &GenRequest) -> Result<Vec<Value>, GenAiError> {
    let url = format!("{}/chat/completions", self.base_url);
    let body = ChatCompletionRequest {
      model: self.strong_model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: req.instructions.clone() },
        ChatMessageReq { role: "user".into(), content: req.prompt.clone() },
      ],
      temperature: req.temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
      max_tokens: req.max_tokens,
    };

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "lotrinh-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&body)
      .send()
      .await
      .map_err(|e| {
        if e.is_timeout() {
          GenAiError::Timeout
        } else {
          GenAiError::Status { status: 0, message: e.to_string() }
        }
      })?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let text = res.text().await.unwrap_or_default();
      let message = extract_api_error(&text).unwrap_or_else(|| trunc_for_log(&text, 200));
      return Err(GenAiError::Status { status, message });
    }

    let parsed: ChatCompletionResponse =
      res.json().await.map_err(|e| GenAiError::Parse(e.to_string()))?;
    if let Some(usage) = &parsed.usage {
      info!(
        prompt_tokens = ?usage.prompt_tokens,
        completion_tokens = ?usage.completion_tokens,
        total_tokens = ?usage.total_tokens,
        "OpenAI usage"
      );
    }

    let choice = parsed
      .choices
      .into_iter()
      .next()
      .ok_or_else(|| GenAiError::Parse("empty choices".into()))?;
    if choice.finish_reason.as_deref() == Some("content_filter") {
      return Err(GenAiError::ContentFiltered);
    }
    let content = choice.message.content.unwrap_or_default();

    parse_array(&content, req.expected_len)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessageResp,
  #[serde(default)] finish_reason: Option<String>,
}
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an API error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

// --- Response parser ---
//
// The ONLY place raw model text is repaired. Models wrap arrays in fences or
// objects and occasionally truncate mid-element; stages never see any of it.

/// Return a well-formed array of exactly `expected_len` objects, or a
/// `GenAiError::Parse`. Surplus elements are dropped from the tail.
pub fn parse_array(raw: &str, expected_len: usize) -> Result<Vec<Value>, GenAiError> {
  let text = strip_code_fences(raw.trim());

  let items = match serde_json::from_str::<Value>(text) {
    Ok(v) => array_from_value(v),
    Err(_) => repair_array_text(text),
  }
  .ok_or_else(|| {
    GenAiError::Parse(format!("no JSON array found in: {}", trunc_for_log(raw, 120)))
  })?;

  if items.len() < expected_len {
    return Err(GenAiError::Parse(format!(
      "array too short: got {}, expected {}",
      items.len(),
      expected_len
    )));
  }
  Ok(items.into_iter().take(expected_len).collect())
}

fn strip_code_fences(s: &str) -> &str {
  let s = s.trim();
  let Some(rest) = s.strip_prefix("```") else { return s };
  // Drop an optional language tag after the opening fence.
  let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
  rest.trim().trim_end_matches("```").trim()
}

/// A parsed value is usable if it is an array, or an object wrapping one
/// (e.g. `{"items": [...]}` from json_object response mode).
fn array_from_value(v: Value) -> Option<Vec<Value>> {
  match v {
    Value::Array(items) => Some(items),
    Value::Object(map) => map.into_iter().find_map(|(_, v)| match v {
      Value::Array(items) => Some(items),
      _ => None,
    }),
    _ => None,
  }
}

/// Last resort for malformed/truncated text: slice out the outermost array
/// and, if the tail is cut mid-element, drop the partial element.
fn repair_array_text(text: &str) -> Option<Vec<Value>> {
  let start = text.find('[')?;
  let candidate = &text[start..];

  if let Some(end) = candidate.rfind(']') {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&candidate[..=end]) {
      return Some(items);
    }
  }

  // Truncated stream: cut back to the last complete object and close the array.
  let mut cut = candidate.len();
  while let Some(pos) = candidate[..cut].rfind('}') {
    let attempt = format!("{}]", &candidate[..=pos]);
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&attempt) {
      return Some(items);
    }
    cut = pos;
  }
  None
}
