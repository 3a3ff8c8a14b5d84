//! Text generation client.
//!
//! Title and summary generation go through [`TextGenerator`]; the production
//! implementation talks to any OpenAI-compatible chat completions endpoint.

use async_trait::async_trait;
use engage_common::{AppError, AppResult, config::AiConfig};
use serde::Deserialize;
use std::time::Duration;

/// Something that turns an instruction plus input text into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run `instruction` over `input` and return the trimmed answer.
    async fn generate(&self, instruction: &str, input: &str) -> AppResult<String>;
}

/// Keep at most `max_chars` characters of `text`, cutting on a char boundary.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct OpenAiTextGenerator {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_input_chars: usize,
}

impl OpenAiTextGenerator {
    /// Build a client from configuration.
    pub fn new(config: &AiConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_input_chars: config.max_input_chars,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn generate(&self, instruction: &str, input: &str) -> AppResult<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": instruction},
                {"role": "user", "content": truncate_chars(input, self.max_input_chars)}
            ],
            "temperature": 0.7,
        });

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Completion request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Completion API error: {status} - {body}"
            )));
        }

        #[derive(Deserialize)]
        struct CompletionResponse {
            choices: Vec<CompletionChoice>,
        }

        #[derive(Deserialize)]
        struct CompletionChoice {
            message: CompletionMessage,
        }

        #[derive(Deserialize)]
        struct CompletionMessage {
            content: String,
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse completion response: {e}"))
        })?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ExternalService("No completion returned".to_string()))?
            .message
            .content;

        Ok(text.trim().to_string())
    }
}
