//! arXiv search source (Atom API)

use async_trait::async_trait;
use digest_bots_domain::{Origin, RawItem, SourceAdapter, SourceError};
use feed_rs::model::Entry;
use reqwest::Client;
use time::OffsetDateTime;

use super::rss::parse_entries;
use super::{ensure_success, html_to_text, http_client, transport_error, truncate};

const DEFAULT_BASE_URL: &str = "https://export.arxiv.org/api/query";
const EXCERPT_CHARS: usize = 800;
const MAX_AUTHORS: usize = 3;

/// Most recent submissions matching one keyword
pub struct ArxivSource {
    client: Client,
    base_url: String,
    keyword: String,
    max_results: usize,
}

impl ArxivSource {
    pub fn new(keyword: impl Into<String>, max_results: usize) -> Self {
        Self::with_base_url(keyword, max_results, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(keyword: impl Into<String>, max_results: usize, base_url: String) -> Self {
        Self {
            client: http_client(),
            base_url,
            keyword: keyword.into(),
            max_results,
        }
    }

    fn to_item(&self, entry: Entry) -> RawItem {
        let title = entry
            .title
            .map(|t| t.content.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        let pdf_link = entry
            .links
            .iter()
            .find(|l| {
                l.title.as_deref() == Some("pdf")
                    || l.media_type.as_deref() == Some("application/pdf")
            })
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone())
            .unwrap_or_default();

        let authors = entry
            .authors
            .iter()
            .take(MAX_AUTHORS)
            .map(|a| a.name.clone())
            .collect::<Vec<_>>()
            .join(", ");

        let categories: Vec<String> = entry.categories.iter().map(|c| c.term.clone()).collect();

        let abstract_text = entry.summary.map(|s| html_to_text(&s.content)).unwrap_or_default();

        let published_at = entry
            .published
            .and_then(|dt| OffsetDateTime::from_unix_timestamp(dt.timestamp()).ok());

        RawItem::new(Origin::Arxiv, self.keyword.clone(), title, pdf_link)
            .with_excerpt(truncate(&abstract_text, EXCERPT_CHARS))
            .with_published_at(published_at)
            .with_attribute("authors", authors)
            .with_attribute(
                "primary_category",
                categories.first().cloned().unwrap_or_default(),
            )
            .with_attribute("categories", categories.join(", "))
            .with_attribute("keyword", self.keyword.clone())
    }
}

#[async_trait]
impl SourceAdapter for ArxivSource {
    fn name(&self) -> &str {
        &self.keyword
    }

    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        tracing::debug!(keyword = %self.keyword, max = self.max_results, "Searching arXiv");

        let query = format!("all:{}", self.keyword);
        let max_results = self.max_results.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("search_query", query.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;
        let body = ensure_success(response)
            .await?
            .bytes()
            .await
            .map_err(transport_error)?;

        Ok(parse_entries(&body)?
            .into_iter()
            .map(|entry| self.to_item(entry))
            .filter(|item| !item.title.is_empty())
            .collect())
    }
}
