//! OpenAI-compatible chat completions client (OpenRouter by default).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerateError, Prompt, TextGenerator};
use crate::config::TextGenConfig;

pub struct ChatCompletionsClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerateError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt.text,
            }],
            temperature: prompt.temperature,
            max_tokens: prompt.max_tokens,
        };

        debug!(model = %self.model, max_tokens = prompt.max_tokens, "Requesting completion");
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerateError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        first_content(parsed).ok_or(GenerateError::EmptyResponse)
    }
}

fn first_content(resp: ChatResponse) -> Option<String> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Generator used when no API key is available. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &Prompt) -> Result<String, GenerateError> {
        Err(GenerateError::Disabled)
    }
}

/// Build the configured generator. Falls back to [`DisabledGenerator`] when
/// the API key variable is unset or empty.
pub fn from_config(config: &TextGenConfig) -> std::sync::Arc<dyn TextGenerator> {
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => std::sync::Arc::new(ChatCompletionsClient::new(
            &config.base_url,
            key,
            &config.model,
        )),
        _ => {
            tracing::warn!(
                env = %config.api_key_env,
                "No text generation API key set; root cause and explanations will use fallback text"
            );
            std::sync::Arc::new(DisabledGenerator)
        }
    }
}
