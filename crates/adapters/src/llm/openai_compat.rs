//! OpenAI-compatible chat-completions adapter (DeepSeek, OpenAI, local gateways)

use async_trait::async_trait;
use digest_bots_domain::{AnalysisError, AnalysisRequest, Analyzer};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::LlmConfig;
use crate::sources::truncate;

/// Non-JSON error bodies (gateway pages) are cut to this many characters
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Analyzer backed by any `/chat/completions` endpoint
pub struct OpenAiCompatAnalyzer {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: LlmConfig,
}

impl OpenAiCompatAnalyzer {
    pub fn new(api_key: SecretString, base_url: String, config: LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[async_trait]
impl Analyzer for OpenAiCompatAnalyzer {
    async fn complete(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: request.temperature,
            max_tokens: self.config.output_budget(request.max_output_tokens),
        };

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout
                } else {
                    AnalysisError::Api(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| truncate(&text, MAX_ERROR_BODY_CHARS));
            return Err(AnalysisError::Status { status, body });
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidFormat(e.to_string()))?;

        let text = api_response
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(AnalysisError::InvalidFormat("Empty response".to_string()));
        }

        tracing::debug!(
            model = %self.config.model,
            chars = text.chars().count(),
            "Completion received"
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn analyzer(uri: String, timeout_secs: u64) -> OpenAiCompatAnalyzer {
        OpenAiCompatAnalyzer::new(
            SecretString::new("test-key".into()),
            uri,
            LlmConfig {
                model: "deepseek-reasoner".to_string(),
                timeout_secs,
                max_output_tokens: None,
            },
        )
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            system: None,
            prompt: "Summarize this paper".to_string(),
            temperature: 0.4,
            max_output_tokens: 1200,
        }
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-reasoner",
                "max_tokens": 1200,
                "messages": [{ "role": "user", "content": "Summarize this paper" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "🔍 A concise summary" } }]
            })))
            .mount(&mock_server)
            .await;

        let text = analyzer(mock_server.uri(), 5).complete(&request()).await.unwrap();
        assert_eq!(text, "🔍 A concise summary");
    }

    #[tokio::test]
    async fn test_system_message_is_sent_first() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    { "role": "system", "content": "You are terse." },
                    { "role": "user", "content": "Summarize this paper" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "ok" } }]
            })))
            .mount(&mock_server)
            .await;

        let mut req = request();
        req.system = Some("You are terse.".to_string());
        let text = analyzer(mock_server.uri(), 5).complete(&req).await.unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_error_envelope_is_unwrapped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Authentication Fails", "type": "authentication_error" }
            })))
            .mount(&mock_server)
            .await;

        let result = analyzer(mock_server.uri(), 5).complete(&request()).await;
        match result {
            Err(AnalysisError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "Authentication Fails");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_gateway_page_is_truncated() {
        let mock_server = MockServer::start().await;
        let page = format!(
            "<html><body>{}</body></html>",
            "<p>Bad Gateway nginx</p>".repeat(2000)
        );

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string(page))
            .mount(&mock_server)
            .await;

        let result = analyzer(mock_server.uri(), 5).complete(&request()).await;
        match result {
            Err(AnalysisError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS);
                assert!(body.starts_with("<html><body><p>Bad Gateway"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&mock_server)
            .await;

        let result = analyzer(mock_server.uri(), 5).complete(&request()).await;
        assert!(matches!(result, Err(AnalysisError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(serde_json::json!({
                        "choices": [{ "message": { "content": "late" } }]
                    })),
            )
            .mount(&mock_server)
            .await;

        let result = analyzer(mock_server.uri(), 1).complete(&request()).await;
        assert!(matches!(result, Err(AnalysisError::Timeout)));
    }
}
