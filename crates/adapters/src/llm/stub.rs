//! Stub analyzer for testing and offline mode

use async_trait::async_trait;
use digest_bots_domain::{AnalysisError, AnalysisRequest, Analyzer};

/// Stub analyzer that returns configurable responses
pub struct StubAnalyzer {
    response: Option<String>,
    error: Option<AnalysisError>,
}

impl StubAnalyzer {
    /// Create a stub that returns a specific response
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            error: None,
        }
    }

    /// Create a stub that always returns an error
    pub fn with_error(error: AnalysisError) -> Self {
        Self {
            response: None,
            error: Some(error),
        }
    }

    /// Create a stub that echoes the first prompt line back
    pub fn echo() -> Self {
        Self {
            response: None,
            error: None,
        }
    }
}

impl Default for StubAnalyzer {
    fn default() -> Self {
        Self::echo()
    }
}

#[async_trait]
impl Analyzer for StubAnalyzer {
    async fn complete(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        if let Some(ref error) = self.error {
            return Err(match error {
                AnalysisError::Api(msg) => AnalysisError::Api(msg.clone()),
                AnalysisError::Status { status, body } => AnalysisError::Status {
                    status: *status,
                    body: body.clone(),
                },
                AnalysisError::InvalidFormat(msg) => AnalysisError::InvalidFormat(msg.clone()),
                AnalysisError::Timeout => AnalysisError::Timeout,
            });
        }

        if let Some(ref response) = self.response {
            return Ok(response.clone());
        }

        let first_line = request
            .prompt
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default();

        Ok(format!(
            "🤖 Stub analysis ({} prompt chars)\n{}",
            request.prompt.chars().count(),
            first_line
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> AnalysisRequest {
        AnalysisRequest {
            system: None,
            prompt: prompt.to_string(),
            temperature: 0.5,
            max_output_tokens: 400,
        }
    }

    #[tokio::test]
    async fn test_configured_response() {
        let analyzer = StubAnalyzer::with_response("fixed");
        assert_eq!(analyzer.complete(&request("anything")).await.unwrap(), "fixed");
    }

    #[tokio::test]
    async fn test_error_stub() {
        let analyzer = StubAnalyzer::with_error(AnalysisError::Timeout);
        let result = analyzer.complete(&request("anything")).await;

        assert!(matches!(result, Err(AnalysisError::Timeout)));
    }

    #[tokio::test]
    async fn test_echo_stub() {
        let analyzer = StubAnalyzer::echo();
        let text = analyzer
            .complete(&request("\n  仓库：tokio-rs/tokio\n语言：rust"))
            .await
            .unwrap();

        assert!(text.starts_with("🤖 Stub analysis"));
        assert!(text.ends_with("仓库：tokio-rs/tokio"));
    }
}
