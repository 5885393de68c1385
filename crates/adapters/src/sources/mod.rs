//! Content source adapters

pub mod arxiv;
pub mod encyclopedia;
pub mod fund;
pub mod hot_list;
pub mod pubmed;
pub mod rss;
pub mod static_source;
pub mod trending;

pub use arxiv::ArxivSource;
pub use encyclopedia::EncyclopediaSource;
pub use fund::FundQuoteSource;
pub use hot_list::HotListSource;
pub use pubmed::PubMedSource;
pub use rss::FeedSource;
pub use static_source::StaticSource;
pub use trending::TrendingSource;

use digest_bots_domain::SourceError;
use reqwest::{Client, Response};
use scraper::Html;
use std::time::Duration;

/// Per-request timeout for source fetches
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Browser-like user agent; listing pages reject bare clients
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 digest-bots/0.1";

pub(crate) fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to build HTTP client")
}

pub(crate) fn transport_error(error: reqwest::Error) -> SourceError {
    let is_timeout = error.is_timeout();
    SourceError::from_transport(error, is_timeout)
}

/// Turn a non-success response into a `SourceError::Status`
pub(crate) async fn ensure_success(response: Response) -> Result<Response, SourceError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(SourceError::Status {
        status,
        message: truncate(&message, 200),
    })
}

/// Flatten an HTML fragment to whitespace-normalized text
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: Vec<&str> = fragment.root_element().text().collect();
    text.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep the first `max` characters
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_strips_tags() {
        let html = "<p>Single-cell <b>atlas</b> of the\n  human <a href=\"#\">tumour</a></p>";
        assert_eq!(html_to_text(html), "Single-cell atlas of the human tumour");
    }

    #[test]
    fn test_html_to_text_plain_passthrough() {
        assert_eq!(html_to_text("already plain"), "already plain");
        assert_eq!(html_to_text(""), "");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("睡眠与昼夜节律", 2), "睡眠");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
