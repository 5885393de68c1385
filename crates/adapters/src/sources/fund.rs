//! Fund intraday valuation source (JSONP quote endpoint)

use async_trait::async_trait;
use digest_bots_domain::{Origin, RawItem, SourceAdapter, SourceError};
use reqwest::Client;
use serde::Deserialize;

use super::{ensure_success, http_client, transport_error};

const DEFAULT_BASE_URL: &str = "http://fundgz.1234567.com.cn/js";

/// Latest valuation for one fund code
pub struct FundQuoteSource {
    client: Client,
    base_url: String,
    code: String,
}

impl FundQuoteSource {
    pub fn new(code: impl Into<String>) -> Self {
        Self::with_base_url(code, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(code: impl Into<String>, base_url: String) -> Self {
        Self {
            client: http_client(),
            base_url,
            code: code.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FundQuote {
    #[serde(default)]
    name: String,
    /// Last official unit NAV
    #[serde(default)]
    dwjz: String,
    /// Date of the official NAV
    #[serde(default)]
    jzrq: String,
    /// Estimated NAV
    #[serde(default)]
    gsz: String,
    /// Estimated change, percent
    #[serde(default)]
    gszzl: String,
    #[serde(default)]
    gztime: String,
}

/// Strip the `jsonpgz(...)` wrapper; `None` when the payload is empty
fn unwrap_jsonp(body: &str) -> Result<Option<&str>, SourceError> {
    let inner = body
        .trim()
        .strip_prefix("jsonpgz(")
        .and_then(|rest| rest.trim_end_matches(';').strip_suffix(')'))
        .ok_or_else(|| SourceError::Malformed("missing jsonpgz wrapper".to_string()))?
        .trim();

    Ok((!inner.is_empty()).then_some(inner))
}

pub(crate) fn parse_quote(code: &str, body: &str) -> Result<Vec<RawItem>, SourceError> {
    let Some(json) = unwrap_jsonp(body)? else {
        return Ok(Vec::new());
    };

    let quote: FundQuote =
        serde_json::from_str(json).map_err(|e| SourceError::Malformed(e.to_string()))?;

    let title = if quote.name.trim().is_empty() {
        code.to_string()
    } else {
        quote.name
    };

    Ok(vec![
        RawItem::new(
            Origin::FundQuote,
            code,
            title,
            format!("https://fund.eastmoney.com/{}.html", code),
        )
        .with_identity_key(code)
        .with_attribute("nav", quote.dwjz)
        .with_attribute("nav_date", quote.jzrq)
        .with_attribute("estimate", quote.gsz)
        .with_attribute("change_percent", quote.gszzl)
        .with_attribute("valuation_time", quote.gztime),
    ])
}

#[async_trait]
impl SourceAdapter for FundQuoteSource {
    fn name(&self) -> &str {
        &self.code
    }

    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let url = format!("{}/{}.js", self.base_url, self.code);
        tracing::debug!(code = %self.code, "Fetching fund valuation");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;
        let body = ensure_success(response)
            .await?
            .text()
            .await
            .map_err(transport_error)?;

        parse_quote(&self.code, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const QUOTE: &str = r#"jsonpgz({"fundcode":"022477","name":"示例成长混合","jzrq":"2025-03-06","dwjz":"1.2345","gsz":"1.2500","gszzl":"1.26","gztime":"2025-03-07 14:30"});"#;

    #[test]
    fn test_parse_quote_fields() {
        let items = parse_quote("022477", QUOTE).unwrap();

        assert_eq!(items.len(), 1);
        let fund = &items[0];
        assert_eq!(fund.title, "示例成长混合");
        assert_eq!(fund.identity_key, "022477");
        assert_eq!(fund.source, "022477");
        assert_eq!(fund.attribute("nav"), Some("1.2345"));
        assert_eq!(fund.attribute("estimate"), Some("1.2500"));
        assert_eq!(fund.attribute("change_percent"), Some("1.26"));
        assert_eq!(fund.attribute("valuation_time"), Some("2025-03-07 14:30"));
    }

    #[test]
    fn test_parse_empty_quote() {
        assert!(parse_quote("000000", "jsonpgz();").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_unwrapped_body() {
        let result = parse_quote("022477", "<html>404</html>");
        assert!(matches!(result, Err(SourceError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_fetch_quote() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/022477.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string(QUOTE))
            .mount(&mock_server)
            .await;

        let source = FundQuoteSource::with_base_url("022477", mock_server.uri());
        let items = source.fetch().await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].link, "https://fund.eastmoney.com/022477.html");
    }
}
