/// OpenAI-compatible `/chat/completions` client (Groq by default).
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AnswerGenerator, GenerationError, system_prompt, user_message};
use crate::config::GenerationConfig;

pub struct ChatCompletionsGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ChatCompletionsGenerator {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            timeout,
        })
    }

    /// Build from config, reading the API key from the configured variable.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            warn!(
                "${} is not set; /ask will fail until it is",
                config.api_key_env
            );
        }
        Self::new(
            &config.base_url,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn complete(&self, api_key: &str, body: &ChatRequest<'_>) -> Result<String, GenerationError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key.trim())
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyResponse)
    }
}

#[async_trait]
impl AnswerGenerator for ChatCompletionsGenerator {
    async fn generate_answer(
        &self,
        question: &str,
        snippets: &[String],
    ) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?;

        let system = system_prompt();
        let user = user_message(question, snippets);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
        };

        for attempt in 1..=2 {
            match tokio::time::timeout(self.timeout, self.complete(api_key, &body)).await {
                Ok(result) => {
                    debug!("Chat completion finished on attempt {attempt}");
                    return result;
                }
                Err(_) => warn!("Chat completion timed out after {:?} (attempt {attempt})", self.timeout),
            }
        }
        Err(GenerationError::Timeout(self.timeout))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
