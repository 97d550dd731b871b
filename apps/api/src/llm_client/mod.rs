//! LLM client — the single point of entry for completion calls.
//!
//! No other module may call the Groq API directly; handlers talk to the
//! `Narrator` trait so tests can swap the backend for a stub.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
/// The model used for all narrative calls.
pub const MODEL: &str = "llama-3.1-8b-instant";
/// Low temperature keeps narratives consistent across identical queries.
const TEMPERATURE: f32 = 0.2;
/// A slow upstream degrades to the sentinel message instead of hanging the request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no GROQ_API_KEY configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqError {
    error: GroqErrorBody,
}

#[derive(Debug, Deserialize)]
struct GroqErrorBody {
    message: String,
}

/// Produces the narrative text for an assembled prompt.
/// Carried in `AppState` as `Arc<dyn Narrator>`.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Groq-backed narrator. A missing API key fails per request, not at startup.
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: Option<String>,
}

impl GroqClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl Narrator for GroqClient {
    async fn narrate(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let request_body = ChatRequest {
            model: MODEL,
            temperature: TEMPERATURE,
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
        };

        let response = self
            .client
            .post(GROQ_API_URL)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body).unwrap_or(body),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;

        debug!(chars = text.len(), "narrative call succeeded");
        Ok(text)
    }
}

/// Pulls the human-readable message out of an OpenAI-style error body.
fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GroqError>(body)
        .ok()
        .map(|e| e.error.message)
}
