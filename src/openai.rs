use crate::config::{ServiceConfig, TranslationConfig};
use crate::error::TranslationError;
use crate::i18n::Language;
use crate::tokenizer::{TiktokenCounter, TokenCounter};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A translated text and the tokens attributed to producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub tokens: usize,
}

/// One translation call into one target language.
///
/// Implementations must report every failure as a `TranslationError` and
/// must not start a new request once `stop` is cancelled.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        target_language: Language,
        config: &TranslationConfig,
        stop: &CancellationToken,
    ) -> Result<Translation, TranslationError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Translator backed by an OpenAI-compatible chat completion endpoint.
pub struct OpenAiTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    timeout: Duration,
    counter: Arc<dyn TokenCounter>,
}

impl OpenAiTranslator {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: format!(
                "{}/chat/completions",
                config.openai_api_base.trim_end_matches('/')
            ),
            api_key: config.openai_api_key.clone(),
            timeout: config.request_timeout,
            counter: Arc::new(TiktokenCounter::new()),
        }
    }

    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, TranslationError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(TranslationError::Api { status, body });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let chat_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| TranslationError::MalformedResponse(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                TranslationError::MalformedResponse("response contained no choices".to_string())
            })?
            .message
            .content
            .ok_or_else(|| {
                TranslationError::MalformedResponse("response message had no content".to_string())
            })
    }

    fn classify(&self, err: reqwest::Error) -> TranslationError {
        if err.is_timeout() {
            TranslationError::Timeout(self.timeout)
        } else {
            TranslationError::from(err)
        }
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: Language,
        config: &TranslationConfig,
        stop: &CancellationToken,
    ) -> Result<Translation, TranslationError> {
        if stop.is_cancelled() {
            return Err(TranslationError::Stopped);
        }

        let system_prompt = config.render_prompt(target_language.name());
        let input_tokens = self.counter.count_tokens(&system_prompt, &config.model)
            + self.counter.count_tokens(text, &config.model);

        let request = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: Some(system_prompt),
                },
                Message {
                    role: "user".to_string(),
                    content: Some(text.to_string()),
                },
            ],
            temperature: config.temperature,
        };

        debug!(
            "Requesting {} translation from {} ({} input tokens)",
            target_language, self.api_url, input_tokens
        );

        let translated = self.send(&request).await?;
        let output_tokens = self.counter.count_tokens(&translated, &config.model);

        debug!(
            "Received {} translation ({} output tokens)",
            target_language, output_tokens
        );

        Ok(Translation {
            text: translated,
            tokens: input_tokens + output_tokens,
        })
    }
}
