//! Text generation clients.

use super::profile::ProviderConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Black-box text generator: system prompt + user prompt in, free text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any server speaking the OpenAI chat-completions API (Ollama,
/// OpenAI, local gateways). Tool calling is never requested.
pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    config: ProviderConfig,
    endpoint: String,
}

impl OpenAiCompatibleClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        config.validate().map_err(ProviderError::Config)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.normalized_endpoint(),
            config,
        })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    fn request_body<'a>(&'a self, system: &'a str, prompt: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.config.model,
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
            stream: false,
            temperature: self.config.temperature,
        }
    }
}

fn extract_content(response: ChatCompletionResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| ProviderError::InvalidResponse("response contained no choices".to_string()))
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = self.completions_url();
        debug!(url = %url, model = %self.config.model, "Requesting completion");

        let mut request = self.client.post(&url).json(&self.request_body(system, prompt));
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        extract_content(parsed)
    }
}
