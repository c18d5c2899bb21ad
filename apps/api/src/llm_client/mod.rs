/// LLM client: the single point of entry for chat-completion calls.
///
/// Every attempt is classified into an `AttemptOutcome`. Transient outcomes
/// (rate limiting, cold model, non-2xx, transport failure) are retried with a
/// linear backoff; fatal outcomes (explicit `error` field, unexpected shape)
/// end the call immediately.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

pub const DEFAULT_API_URL: &str = "https://router.huggingface.co/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.3";
const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 900;
pub const MAX_ATTEMPTS: u32 = 6;
const BACKOFF_STEP_MS: u64 = 1500;
const BACKOFF_CAP_MS: u64 = 9000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Lower-cased body fragments that mark a response as temporary.
const TRANSIENT_MARKERS: &[&str] = &[
    "rate limit",
    "too many requests",
    "overloaded",
    "currently loading",
    "estimated_time",
];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("fatal response: {0}")]
    Fatal(String),

    #[error("no usable response after {attempts} attempts (last: {last})")]
    Exhausted { attempts: u32, last: String },
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Transport(e.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Classification of a single attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(String),
    Retryable(String),
    Fatal(String),
}

/// Sends one chat-completion request. Implemented over HTTP in production
/// and scripted in tests.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest<'_>) -> Result<RawResponse, LlmError>;
}

/// reqwest-backed transport. Holds one pooled client for the process lifetime.
pub struct HttpTransport {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(api_url: String, api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(8)
            .build()?;
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest<'_>) -> Result<RawResponse, LlmError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}

/// The chat-completion client shared by all requests.
#[derive(Clone)]
pub struct LlmClient {
    transport: Arc<dyn ChatTransport>,
    model: String,
}

impl LlmClient {
    pub fn new(transport: Arc<dyn ChatTransport>, model: String) -> Self {
        Self { transport, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `prompt` as the user turn and returns the assistant's message content.
    /// Retries transient failures up to `MAX_ATTEMPTS` times.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let mut last = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            let outcome = match self.transport.send(&request).await {
                Ok(raw) => classify_response(raw.status, &raw.body),
                Err(e) => AttemptOutcome::Retryable(e.to_string()),
            };

            match outcome {
                AttemptOutcome::Success(content) => {
                    debug!("Chat completion succeeded on attempt {attempt}");
                    return Ok(content);
                }
                AttemptOutcome::Fatal(reason) => {
                    warn!("Chat completion failed fatally on attempt {attempt}: {reason}");
                    return Err(LlmError::Fatal(reason));
                }
                AttemptOutcome::Retryable(reason) => {
                    last = reason;
                    if attempt == MAX_ATTEMPTS {
                        break;
                    }
                    let delay = backoff_delay(attempt);
                    warn!(
                        "Chat completion attempt {}/{} was transient ({}), retrying after {}ms",
                        attempt,
                        MAX_ATTEMPTS,
                        preview(&last, 120),
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(LlmError::Exhausted {
            attempts: MAX_ATTEMPTS,
            last,
        })
    }
}

/// Delay taken after a transient failure on `attempt` (1-based).
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis((BACKOFF_STEP_MS * u64::from(attempt)).min(BACKOFF_CAP_MS))
}

/// Classifies one HTTP exchange with the chat-completion endpoint.
pub fn classify_response(status: u16, body: &str) -> AttemptOutcome {
    if !(200..300).contains(&status) {
        return AttemptOutcome::Retryable(format!("status {status}"));
    }

    if is_transient_body(body) {
        return AttemptOutcome::Retryable(preview(body, 200));
    }

    let root: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => return AttemptOutcome::Fatal(format!("unparseable response: {e}")),
    };

    // the key's presence is fatal, whatever its value (null included)
    if let Some(error) = root.as_object().and_then(|o| o.get("error")) {
        return AttemptOutcome::Fatal(format!("router error: {error}"));
    }

    let parsed: ChatCompletionResponse = match serde_json::from_value(root) {
        Ok(p) => p,
        Err(e) => return AttemptOutcome::Fatal(format!("unexpected response shape: {e}")),
    };

    match parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
    {
        Some(content) => AttemptOutcome::Success(content),
        None => AttemptOutcome::Fatal(format!("unexpected response shape: {}", preview(body, 200))),
    }
}

fn is_transient_body(body: &str) -> bool {
    let lower = body.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|m| lower.contains(m))
}

/// First `max` characters of `text`, for logs.
pub fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
