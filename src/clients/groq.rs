use async_trait::async_trait;
use serde_json::Value;

use crate::clients::traits::{ChatBackend, ChatCompletion, ChatError, ChatRequest};

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Chat-completions client for Groq's OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GroqClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ChatError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ChatError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ChatError::Network(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    /// Build from loaded configuration; fails when no key is configured
    pub fn from_config(config: &crate::config::Config) -> Result<Self, ChatError> {
        let key = config
            .runtime
            .groq_api_key
            .clone()
            .ok_or(ChatError::MissingApiKey)?;
        Self::new(config.summarizer.endpoint.clone(), key)
    }
}

#[async_trait]
impl ChatBackend for GroqClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, ChatError> {
        tracing::debug!(model = %request.model, "calling groq chat completions");
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| ChatError::ParseError(format!("parse groq response json: {}", e)))?;
        if let Some(usage) = v.get("usage") {
            tracing::debug!("token usage: {}", usage);
        }
        completion_from_body(&v)
    }
}

/// Map a non-success HTTP status to a chat error
pub(crate) fn status_error(status: u16, body: &str) -> ChatError {
    match status {
        401 => ChatError::Unauthorized,
        429 => ChatError::RateLimited,
        500 | 502 | 503 => ChatError::Unavailable { status },
        _ => {
            let message = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| body.to_string());
            ChatError::Http { status, message }
        }
    }
}

pub(crate) fn completion_from_body(v: &Value) -> Result<ChatCompletion, ChatError> {
    let content = v
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or("");
    if content.trim().is_empty() {
        return Err(ChatError::EmptyResponse);
    }
    Ok(ChatCompletion {
        content: content.to_string(),
        usage: v.get("usage").cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_codes_map_to_errors() {
        assert!(matches!(status_error(401, ""), ChatError::Unauthorized));
        assert!(matches!(status_error(429, ""), ChatError::RateLimited));
        assert!(matches!(
            status_error(502, ""),
            ChatError::Unavailable { status: 502 }
        ));
    }

    #[test]
    fn provider_message_is_surfaced() {
        let body = r#"{"error":{"message":"model not found"}}"#;
        match status_error(404, body) {
            ChatError::Http { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "model not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match status_error(418, "teapot") {
            ChatError::Http { message, .. } => assert_eq!(message, "teapot"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn completion_reads_first_choice() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "1. Alpha"}}],
            "usage": {"total_tokens": 12}
        });
        let completion = completion_from_body(&body).unwrap();
        assert_eq!(completion.content, "1. Alpha");
        assert!(completion.usage.is_some());
    }

    #[test]
    fn blank_completion_is_empty_response() {
        let body = json!({"choices": [{"message": {"content": "  "}}]});
        assert!(matches!(
            completion_from_body(&body),
            Err(ChatError::EmptyResponse)
        ));
        assert!(matches!(
            completion_from_body(&json!({})),
            Err(ChatError::EmptyResponse)
        ));
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            GroqClient::new(DEFAULT_ENDPOINT, " "),
            Err(ChatError::MissingApiKey)
        ));
    }
}
