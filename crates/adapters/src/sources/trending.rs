//! GitHub trending listing source (HTML scraping)

use async_trait::async_trait;
use digest_bots_domain::{Origin, RawItem, SourceAdapter, SourceError};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use super::{ensure_success, http_client, transport_error};

const DEFAULT_BASE_URL: &str = "https://github.com/trending";

/// Daily trending repositories for one language
pub struct TrendingSource {
    client: Client,
    base_url: String,
    language: String,
}

impl TrendingSource {
    pub fn new(language: impl Into<String>) -> Self {
        Self::with_base_url(language, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(language: impl Into<String>, base_url: String) -> Self {
        Self {
            client: http_client(),
            base_url,
            language: language.into(),
        }
    }
}

#[async_trait]
impl SourceAdapter for TrendingSource {
    fn name(&self) -> &str {
        &self.language
    }

    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let url = format!("{}/{}", self.base_url, self.language);
        tracing::debug!(language = %self.language, url = %url, "Fetching trending page");

        let response = self
            .client
            .get(&url)
            .query(&[("since", "daily")])
            .send()
            .await
            .map_err(transport_error)?;
        let html = ensure_success(response)
            .await?
            .text()
            .await
            .map_err(transport_error)?;

        parse_listing(&html, &self.language)
    }
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Malformed(format!("bad selector {}: {}", css, e)))
}

fn squash(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn leading_number(text: &str) -> Option<String> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .collect();
    (!digits.is_empty()).then_some(digits)
}

/// Extract repository rows from a trending page
pub(crate) fn parse_listing(html: &str, language: &str) -> Result<Vec<RawItem>, SourceError> {
    let document = Html::parse_document(html);
    let rows = selector("article.Box-row")?;
    let heading = selector("h2")?;
    let description = selector("p")?;
    let stargazers = selector(r#"a[href$="/stargazers"]"#)?;
    let counters = selector("span.d-inline-block")?;

    let mut items = Vec::new();
    for row in document.select(&rows) {
        let Some(name) = row
            .select(&heading)
            .next()
            .map(|h| {
                h.text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<String>()
            })
            .filter(|n| !n.is_empty())
        else {
            continue;
        };

        let summary = row
            .select(&description)
            .next()
            .map(squash)
            .unwrap_or_default();

        let stars = row
            .select(&stargazers)
            .next()
            .and_then(|a| leading_number(&squash(a)))
            .unwrap_or_default();

        let stars_today = row
            .select(&counters)
            .map(squash)
            .find(|text| text.contains("today"))
            .unwrap_or_default();

        items.push(
            RawItem::new(
                Origin::Trending,
                language,
                name.clone(),
                format!("https://github.com/{}", name),
            )
            .with_excerpt(summary)
            .with_attribute("stars", stars)
            .with_attribute("stars_today", stars_today)
            .with_attribute("language", language),
        );
    }

    if items.is_empty() {
        tracing::warn!(language = %language, "Trending page had no repository rows");
    }

    Ok(items)
}
