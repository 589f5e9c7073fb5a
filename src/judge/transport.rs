//! Transport to the remote judge model.
//!
//! [`HttpTransport`] works with any OpenAI-compatible chat completions
//! endpoint. Other backends implement [`JudgeTransport`].

use crate::config::JudgeConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampling temperature for every judge call.
pub const JUDGE_TEMPERATURE: f32 = 0.0;

/// A failed call to the judge model.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status or provider error code, when the backend reported one.
    pub status: Option<u16>,
    /// Description of the failure.
    pub message: String,
}

impl TransportError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Sends one prompt to one model and returns the raw reply text.
#[async_trait]
pub trait JudgeTransport: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<String, TransportError>;
}

/// Message role in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: Role,
    content: String,
}

/// Request body for chat completion.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

/// Response from chat completion.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// API error response.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    /// Numeric on some providers, a string slug on others.
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// OpenAI-compatible judge transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    api_base: String,
    api_key: String,
    max_tokens: u32,
}

impl HttpTransport {
    /// Create a transport for the configured endpoint.
    pub fn new(config: &JudgeConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("answer-judge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Get the API endpoint URL.
    fn endpoint(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/v1/chat/completions", base)
    }
}

#[async_trait]
impl JudgeTransport for HttpTransport {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<String, TransportError> {
        let request = ChatCompletionRequest {
            model,
            messages: vec![Message {
                role: Role::User,
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
            temperature: JUDGE_TEMPERATURE,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
                let provider_code = api_error
                    .error
                    .code
                    .as_ref()
                    .and_then(|c| c.as_u64())
                    .and_then(|c| u16::try_from(c).ok());
                return Err(TransportError::new(
                    Some(provider_code.unwrap_or(status.as_u16())),
                    format!("API error ({}): {}", status, api_error.error.message),
                ));
            }
            return Err(TransportError::new(
                Some(status.as_u16()),
                format!("Request failed ({}): {}", status, body),
            ));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::new(None, format!("Malformed completion body: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| TransportError::new(None, "No choices in response"))
    }
}

fn from_reqwest(err: reqwest::Error) -> TransportError {
    TransportError::new(err.status().map(|s| s.as_u16()), err.to_string())
}


#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport_for(server: &MockServer) -> HttpTransport {
        let config = JudgeConfig {
            api_base: format!("{}/", server.uri()),
            api_key: "test-key".to_string(),
            ..Default::default()
        };
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_construction() {
        let config = JudgeConfig {
            api_base: "https://api.example.com/".to_string(),
            api_key: "test".to_string(),
            ..Default::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(
            transport.endpoint(),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(
                serde_json::json!({"model": "judge-1", "temperature": 0.0}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "0.9"}}]
            })))
            .mount(&server)
            .await;

        let reply = transport_for(&server)
            .generate("judge-1", "rate this")
            .await
            .unwrap();
        assert_eq!(reply, "0.9");
    }

    #[tokio::test]
    async fn test_generate_reports_status_for_missing_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"message": "The model `old-judge` does not exist", "code": "model_not_found"}
            })))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .generate("old-judge", "rate this")
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(404));
        assert!(err.message.contains("does not exist"));
    }

    #[tokio::test]
    async fn test_generate_plain_text_error_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .generate("judge-1", "rate this")
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(429));
        assert!(err.message.contains("slow down"));
    }
}
