//! Analysis use case: prompt the generative service for one curated item

use crate::{
    model::{AnalysisResult, CuratedItem},
    ports::{AnalysisError, Analyzer},
    prompt::PromptTemplate,
    sanitize::Sanitizer,
    usecases::assemble::truncate_chars,
};

/// Prefix of the placeholder used when an analysis call fails
pub const FAILURE_PREFIX: &str = "❌ analysis failed";

/// Longest failure reason carried into a report section
const MAX_FAILURE_REASON_CHARS: usize = 160;

/// Invokes the analyzer per item and sanitizes the result
pub struct AnalysisInvoker<A> {
    analyzer: A,
    template: PromptTemplate,
    sanitizer: Sanitizer,
}

impl<A: Analyzer> AnalysisInvoker<A> {
    pub fn new(analyzer: A, template: PromptTemplate) -> Self {
        let sanitizer = Sanitizer::new(template.sanitizer);
        Self {
            analyzer,
            template,
            sanitizer,
        }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Analyze one item; a failed call yields a visible placeholder, never an error
    pub async fn analyze(&self, item: &CuratedItem) -> AnalysisResult {
        let request = self.template.request(item);

        tracing::info!(
            rank = item.rank,
            key = %item.item.identity_key,
            prompt_chars = request.prompt.chars().count(),
            "Analyzing item"
        );

        let (raw_text, failed) = match self.analyzer.complete(&request).await {
            Ok(text) if !text.trim().is_empty() => (text, false),
            Ok(_) => (format!("{}: empty response", FAILURE_PREFIX), true),
            Err(error) => {
                tracing::warn!(
                    rank = item.rank,
                    key = %item.item.identity_key,
                    error = %error,
                    "Analysis failed"
                );
                (format!("{}: {}", FAILURE_PREFIX, failure_reason(&error)), true)
            }
        };

        let sanitized_text = self.sanitizer.sanitize(&raw_text);

        AnalysisResult {
            item_identity_key: item.item.identity_key.clone(),
            raw_text,
            sanitized_text,
            failed,
        }
    }
}

/// One line, bounded: error bodies can be whole HTML pages
fn failure_reason(error: &AnalysisError) -> String {
    let reason = error.to_string().split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&reason, MAX_FAILURE_REASON_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Origin, RawItem};
    use crate::ports::AnalysisRequest;
    use crate::prompt::BotKind;
    use async_trait::async_trait;

    /// Returns the canned text, or times out when none is set
    struct FakeAnalyzer {
        response: Option<String>,
    }

    #[async_trait]
    impl Analyzer for FakeAnalyzer {
        async fn complete(&self, _request: &AnalysisRequest) -> Result<String, AnalysisError> {
            self.response.clone().ok_or(AnalysisError::Timeout)
        }
    }

    /// Fails with a gateway error page as the body
    struct GatewayAnalyzer;

    #[async_trait]
    impl Analyzer for GatewayAnalyzer {
        async fn complete(&self, _request: &AnalysisRequest) -> Result<String, AnalysisError> {
            Err(AnalysisError::Status {
                status: 502,
                body: format!(
                    "<html>\n<body>{}</body>",
                    "<p>Bad Gateway nginx</p>\n".repeat(2000)
                ),
            })
        }
    }

    fn sample_item() -> CuratedItem {
        CuratedItem {
            rank: 1,
            item: RawItem::new(Origin::FundQuote, "022477", "示例基金", "")
                .with_identity_key("022477"),
        }
    }

    #[tokio::test]
    async fn test_analysis_is_sanitized() {
        let invoker = AnalysisInvoker::new(
            FakeAnalyzer {
                response: Some("## 📊 基金诊断\n- **健康度**：⭐⭐⭐\n【合规声明】".to_string()),
            },
            PromptTemplate::for_bot(BotKind::Funds),
        );

        let result = invoker.analyze(&sample_item()).await;

        assert!(!result.failed);
        assert_eq!(result.item_identity_key, "022477");
        assert_eq!(result.sanitized_text, "📊 基金诊断\n• 健康度：⭐⭐⭐\n合规声明");
        assert!(result.raw_text.starts_with("## "));
    }

    #[tokio::test]
    async fn test_timeout_yields_placeholder() {
        let invoker = AnalysisInvoker::new(
            FakeAnalyzer { response: None },
            PromptTemplate::for_bot(BotKind::Journals),
        );

        let result = invoker.analyze(&sample_item()).await;

        assert!(result.failed);
        assert!(result.sanitized_text.contains("failed"));
        assert!(result.sanitized_text.contains("Timeout"));
    }

    #[tokio::test]
    async fn test_empty_response_is_failure() {
        let invoker = AnalysisInvoker::new(
            FakeAnalyzer {
                response: Some("   ".to_string()),
            },
            PromptTemplate::for_bot(BotKind::Papers),
        );

        let result = invoker.analyze(&sample_item()).await;
        assert!(result.failed);
        assert!(result.sanitized_text.contains("empty response"));
    }

    #[tokio::test]
    async fn test_failure_placeholder_is_short_single_line() {
        let invoker =
            AnalysisInvoker::new(GatewayAnalyzer, PromptTemplate::for_bot(BotKind::Journals));

        let result = invoker.analyze(&sample_item()).await;

        assert!(result.failed);
        assert!(result.sanitized_text.starts_with(FAILURE_PREFIX));
        assert!(result.sanitized_text.contains("502"));
        assert!(!result.sanitized_text.contains('\n'));
        // prefix, ": ", then the bounded reason and its "..."
        let bound = FAILURE_PREFIX.chars().count() + 2 + MAX_FAILURE_REASON_CHARS + 3;
        assert!(result.sanitized_text.chars().count() <= bound);
    }
}
