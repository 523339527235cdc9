use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use storefront_core::config::{LlmConfig, LlmProvider};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Client for any endpoint speaking the OpenAI chat-completions protocol.
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    max_retries: u32,
}

impl ChatCompletionsClient {
    /// Returns `None` when the provider is disabled.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        let base_url = match (config.provider, config.base_url.as_deref()) {
            (LlmProvider::Disabled, _) => return Ok(None),
            (_, Some(base_url)) if !base_url.trim().is_empty() => base_url.trim().to_string(),
            (LlmProvider::Groq, _) => GROQ_BASE_URL.to_string(),
            (LlmProvider::OpenAi, _) => OPENAI_BASE_URL.to_string(),
            (LlmProvider::Ollama, _) => bail!("llm.base_url is required for ollama provider"),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("failed to build llm http client")?;

        Ok(Some(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        }))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<String, AttemptError> {
        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| {
            AttemptError::Retryable(anyhow!(error).context("llm request failed"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error = anyhow!("llm endpoint returned {status}");
            return Err(if is_retryable(status) {
                AttemptError::Retryable(error)
            } else {
                AttemptError::Fatal(error)
            });
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|error| AttemptError::Fatal(anyhow!("failed to decode llm response: {error}")))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AttemptError::Fatal(anyhow!("llm response contained no answer")))
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            temperature: 0.2,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(&body).await {
                Ok(answer) => {
                    debug!(event_name = "llm.completion.succeeded", attempt, "llm answered");
                    return Ok(answer);
                }
                Err(AttemptError::Retryable(error)) if attempt <= self.max_retries => {
                    warn!(
                        event_name = "llm.completion.retry",
                        attempt,
                        error = %error,
                        "retrying llm completion"
                    );
                    tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                }
                Err(AttemptError::Retryable(error)) | Err(AttemptError::Fatal(error)) => {
                    return Err(error)
                }
            }
        }
    }
}

enum AttemptError {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}
