use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },
    #[error("provider timed out")]
    Timeout,
    #[error("provider error: {0}")]
    Provider(String),
}

impl ChatError {
    /// Transient errors are worth another attempt; the rest fail fast.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChatError::RateLimited { .. } | ChatError::Timeout)
    }
}

/// Text-generation capability behind the extraction pipeline and the chat
/// analyst.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}

/// Chat client for the Groq OpenAI-compatible endpoint.
pub struct GroqClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GroqClient {
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(GROQ_API_BASE);

        GroqClient {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl ChatClient for GroqClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let mut request_messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(messages.len());
        for message in messages {
            let request_message = match message.role {
                ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map(Into::into),
                ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map(Into::into),
                ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map(Into::into),
            };
            request_messages.push(request_message.map_err(classify_error)?);
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(request_messages)
            .temperature(0.3)
            .max_tokens(4000_u32)
            .build()
            .map_err(classify_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(classify_error)?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(ChatError::Provider(
                "No content in model response".to_string(),
            ))
    }
}

fn classify_error(error: OpenAIError) -> ChatError {
    match error {
        OpenAIError::Reqwest(e) if e.is_timeout() => ChatError::Timeout,
        OpenAIError::ApiError(api_error) => {
            match api_error.message.to_lowercase().contains("rate limit") {
                true => ChatError::RateLimited {
                    retry_after: parse_retry_hint(&api_error.message),
                },
                false => ChatError::Provider(api_error.message),
            }
        }
        other => ChatError::Provider(other.to_string()),
    }
}

/// Groq rate-limit messages embed the wait, like "Please try again in
/// 7.066s" or "in 2m59.56s" or "in 114.688ms".
fn parse_retry_hint(message: &str) -> Option<Duration> {
    let (_, rest) = message.split_once("try again in ")?;
    let token = rest.split_whitespace().next()?.trim_end_matches(['.', ',']);

    if let Some(millis) = token.strip_suffix("ms") {
        return millis
            .parse::<f64>()
            .ok()
            .map(|v| Duration::from_secs_f64(v / 1000.0));
    }

    let value = token.strip_suffix('s')?;
    match value.split_once('m') {
        Some((minutes, seconds)) => {
            let minutes: f64 = minutes.parse().ok()?;
            let seconds: f64 = match seconds.is_empty() {
                true => 0.0,
                false => seconds.parse().ok()?,
            };
            Some(Duration::from_secs_f64(minutes * 60.0 + seconds))
        }
        None => value
            .parse::<f64>()
            .ok()
            .map(Duration::from_secs_f64),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::parse_retry_hint;

    #[test]
    fn parses_fractional_seconds() {
        let hint = parse_retry_hint("Rate limit reached. Please try again in 7.066s.");

        assert_eq!(hint, Some(Duration::from_secs_f64(7.066)));
    }

    #[test]
    fn parses_minutes_and_seconds() {
        let hint = parse_retry_hint("Please try again in 2m59.56s");

        assert_eq!(hint, Some(Duration::from_secs_f64(179.56)));
    }

    #[test]
    fn parses_milliseconds() {
        let hint = parse_retry_hint("Please try again in 114.688ms.");

        assert_eq!(hint, Some(Duration::from_secs_f64(0.114688)));
    }

    #[test]
    fn message_without_hint_yields_none() {
        assert_eq!(parse_retry_hint("Rate limit reached."), None);
    }
}
