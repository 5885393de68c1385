//! RSS/Atom feed source

use async_trait::async_trait;
use digest_bots_domain::{Origin, RawItem, SourceAdapter, SourceError};
use feed_rs::model::Entry;
use reqwest::Client;
use std::collections::BTreeMap;
use time::OffsetDateTime;

use super::{ensure_success, html_to_text, http_client, transport_error, truncate};

/// Characters kept from an entry summary
const EXCERPT_CHARS: usize = 500;

const UNTITLED: &str = "Untitled";

/// One syndication feed, e.g. a journal's current-issue RSS
pub struct FeedSource {
    client: Client,
    name: String,
    url: String,
    attributes: BTreeMap<String, String>,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            name: name.into(),
            url: url.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Static attribute copied onto every item (e.g. impact factor)
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn to_item(&self, entry: Entry) -> RawItem {
        let title = entry
            .title
            .as_ref()
            .map(|t| html_to_text(&t.content))
            .filter(|t| !t.is_empty());

        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();

        // Untitled entries are told apart by link, then by feed entry id
        let identity_key = match &title {
            Some(title) => title.clone(),
            None if !link.is_empty() => link.clone(),
            None => entry.id.clone(),
        };
        let title = title.unwrap_or_else(|| UNTITLED.to_string());

        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        let published_at = entry
            .published
            .or(entry.updated)
            .and_then(|dt| OffsetDateTime::from_unix_timestamp(dt.timestamp()).ok());

        let mut item = RawItem::new(Origin::Feed, self.name.clone(), title, link)
            .with_identity_key(identity_key)
            .with_excerpt(truncate(&html_to_text(&summary), EXCERPT_CHARS))
            .with_published_at(published_at);
        for (key, value) in &self.attributes {
            item = item.with_attribute(key.clone(), value.clone());
        }
        item
    }
}

/// Parse a feed document into entries, preserving document order
pub(crate) fn parse_entries(body: &[u8]) -> Result<Vec<Entry>, SourceError> {
    feed_rs::parser::parse(body)
        .map(|feed| feed.entries)
        .map_err(|e| SourceError::Malformed(format!("Failed to parse feed: {}", e)))
}

#[async_trait]
impl SourceAdapter for FeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        tracing::debug!(source = %self.name, url = %self.url, "Fetching feed");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(transport_error)?;
        let body = ensure_success(response)
            .await?
            .bytes()
            .await
            .map_err(transport_error)?;

        let items: Vec<RawItem> = parse_entries(&body)?
            .into_iter()
            .map(|entry| self.to_item(entry))
            .collect();

        tracing::debug!(source = %self.name, count = items.len(), "Parsed feed");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Nature</title>
    <link>https://www.nature.com</link>
    <description>Current issue</description>
    <item>
      <title>Tumour microenvironment atlas</title>
      <link>https://www.nature.com/articles/1</link>
      <description>&lt;p&gt;A &lt;b&gt;single-cell&lt;/b&gt; map of cancer.&lt;/p&gt;</description>
      <pubDate>Fri, 07 Mar 2025 06:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Galaxy formation</title>
      <link>https://www.nature.com/articles/2</link>
    </item>
  </channel>
</rss>"#;

    #[tokio::test]
    async fn test_fetch_feed_items() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/nature.rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&mock_server)
            .await;

        let source = FeedSource::new("Nature", format!("{}/nature.rss", mock_server.uri()))
            .with_attribute("impact_factor", "64.8");

        let items = source.fetch().await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Tumour microenvironment atlas");
        assert_eq!(items[0].source, "Nature");
        assert_eq!(items[0].link, "https://www.nature.com/articles/1");
        assert_eq!(items[0].body_excerpt, "A single-cell map of cancer.");
        assert_eq!(items[0].attribute("impact_factor"), Some("64.8"));
        assert_eq!(
            items[0].published_at.map(|t| t.unix_timestamp()),
            Some(1_741_327_200)
        );
        assert!(items[1].published_at.is_none());
        assert_eq!(items[1].body_excerpt, "");
    }

    #[tokio::test]
    async fn test_fetch_feed_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&mock_server)
            .await;

        let source = FeedSource::new("Cell", format!("{}/cell.rss", mock_server.uri()));
        let result = source.fetch().await;

        assert!(matches!(result, Err(SourceError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_fetch_feed_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not a feed</html>"))
            .mount(&mock_server)
            .await;

        let source = FeedSource::new("Science", mock_server.uri());
        let result = source.fetch().await;

        assert!(matches!(result, Err(SourceError::Malformed(_))));
    }

    #[test]
    fn test_untitled_entries_keep_distinct_identities() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Cell</title>
    <link>https://www.cell.com</link>
    <description>Online now</description>
    <item><link>https://www.cell.com/articles/a</link></item>
    <item><link>https://www.cell.com/articles/b</link></item>
    <item><title>Organoid screens</title><link>https://www.cell.com/articles/c</link></item>
  </channel>
</rss>"#;

        let source = FeedSource::new("Cell", "https://www.cell.com/rss");
        let items: Vec<_> = parse_entries(rss.as_bytes())
            .unwrap()
            .into_iter()
            .map(|entry| source.to_item(entry))
            .collect();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Untitled");
        assert_eq!(items[0].identity_key, "https://www.cell.com/articles/a");
        assert_eq!(items[1].identity_key, "https://www.cell.com/articles/b");
        assert_eq!(items[2].identity_key, "Organoid screens");
    }
}
