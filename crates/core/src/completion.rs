//! Text completion against a hosted language model.

use crate::config::CompletionConfig;
use crate::constants::COMPLETION_ERROR_PLACEHOLDER;
use crate::{SynopsisError, SynopsisResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str =
    "You are a research assistant skilled in academic writing and analysis.";
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1024;
const TOP_P: f32 = 1.0;

/// Produces text for a prompt.
///
/// Implementations never fail: transport or decoding problems are logged and answered with
/// [`COMPLETION_ERROR_PLACEHOLDER`].
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> String;
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for an OpenAI-compatible chat-completions endpoint (Groq by default).
#[derive(Clone, Debug)]
pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GroqClient {
    /// Create a client from the completion settings.
    ///
    /// # Errors
    ///
    /// Returns `SynopsisError::InvalidInput` if no API key is configured.
    pub fn new(config: &CompletionConfig) -> SynopsisResult<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            SynopsisError::InvalidInput("GROQ_API_KEY must be set to generate synopses".into())
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }

    fn request<'a>(&'a self, prompt: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: prompt.into(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
            stream: false,
        }
    }

    async fn try_complete(&self, prompt: &str) -> SynopsisResult<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request(prompt))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SynopsisError::Upstream(e.to_string()))?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| SynopsisError::Upstream(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| SynopsisError::Upstream("completion returned no choices".into()))
    }
}

#[async_trait]
impl CompletionService for GroqClient {
    async fn complete(&self, prompt: &str) -> String {
        match self.try_complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("completion request failed: {}", e);
                COMPLETION_ERROR_PLACEHOLDER.to_string()
            }
        }
    }
}
