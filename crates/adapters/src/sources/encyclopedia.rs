//! Encyclopedia topic-of-the-day source (Wikipedia REST page summary)

use async_trait::async_trait;
use digest_bots_domain::{Clock, Origin, RawItem, SourceAdapter, SourceError};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

use super::{ensure_success, http_client, transport_error, truncate};

const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
const EXCERPT_CHARS: usize = 800;
const SOURCE_LABEL: &str = "Wikipedia (CC BY-SA)";

/// Summary of one topic, rotated through a fixed list by day of year
pub struct EncyclopediaSource {
    client: Client,
    base_url: String,
    topics: Vec<String>,
    clock: Arc<dyn Clock>,
}

impl EncyclopediaSource {
    pub fn new(topics: Vec<String>, clock: Arc<dyn Clock>) -> Self {
        Self::with_base_url(topics, clock, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(topics: Vec<String>, clock: Arc<dyn Clock>, base_url: String) -> Self {
        Self {
            client: http_client(),
            base_url,
            topics,
            clock,
        }
    }

    /// Topic for today; stable within a day
    pub fn topic_of_the_day(&self) -> Option<&str> {
        if self.topics.is_empty() {
            return None;
        }
        let day = usize::from(self.clock.now().ordinal());
        Some(&self.topics[(day - 1) % self.topics.len()])
    }
}

#[derive(Deserialize)]
struct PageSummary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: String,
    content_urls: Option<ContentUrls>,
}

#[derive(Deserialize)]
struct ContentUrls {
    desktop: PageUrl,
}

#[derive(Deserialize)]
struct PageUrl {
    page: String,
}

#[async_trait]
impl SourceAdapter for EncyclopediaSource {
    fn name(&self) -> &str {
        SOURCE_LABEL
    }

    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let Some(topic) = self.topic_of_the_day() else {
            return Ok(Vec::new());
        };
        let slug = topic.replace(' ', "_");
        tracing::debug!(topic = %topic, "Fetching encyclopedia summary");

        let response = self
            .client
            .get(format!("{}/{}", self.base_url, slug))
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::warn!(topic = %topic, "Encyclopedia page does not exist");
            return Ok(Vec::new());
        }

        let page: PageSummary = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        if page.extract.trim().is_empty() {
            return Ok(Vec::new());
        }

        let title = if page.title.is_empty() {
            topic.to_string()
        } else {
            page.title
        };
        let link = page
            .content_urls
            .map(|urls| urls.desktop.page)
            .unwrap_or_else(|| format!("https://en.wikipedia.org/wiki/{}", slug));

        Ok(vec![
            RawItem::new(Origin::Encyclopedia, SOURCE_LABEL, title, link)
                .with_excerpt(truncate(&page.extract, EXCERPT_CHARS))
                .with_attribute("topic", topic),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use time::macros::datetime;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedClock(OffsetDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            self.0
        }
    }

    fn topics() -> Vec<String> {
        vec!["Circadian rhythm".to_string(), "Melatonin".to_string(), "Vitamin D".to_string()]
    }

    #[test]
    fn test_topic_rotates_by_day_of_year() {
        let at = |time| EncyclopediaSource::new(topics(), Arc::new(FixedClock(time)));
        let jan_1 = at(datetime!(2025-01-01 0:00 UTC));
        let jan_2 = at(datetime!(2025-01-02 23:59 UTC));
        let jan_4 = at(datetime!(2025-01-04 12:00 UTC));

        assert_eq!(jan_1.topic_of_the_day(), Some("Circadian rhythm"));
        assert_eq!(jan_2.topic_of_the_day(), Some("Melatonin"));
        assert_eq!(jan_4.topic_of_the_day(), Some("Circadian rhythm"));
    }

    #[tokio::test]
    async fn test_fetch_summary() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/Circadian_rhythm"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Circadian rhythm",
                "extract": "A circadian rhythm is a natural oscillation that repeats roughly every 24 hours.",
                "content_urls": {
                    "desktop": { "page": "https://en.wikipedia.org/wiki/Circadian_rhythm" }
                }
            })))
            .mount(&mock_server)
            .await;

        let source = EncyclopediaSource::with_base_url(
            topics(),
            Arc::new(FixedClock(datetime!(2025-01-01 8:00 UTC))),
            mock_server.uri(),
        );
        let items = source.fetch().await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Circadian rhythm");
        assert_eq!(items[0].source, "Wikipedia (CC BY-SA)");
        assert_eq!(items[0].link, "https://en.wikipedia.org/wiki/Circadian_rhythm");
        assert!(items[0].body_excerpt.starts_with("A circadian rhythm"));
    }

    #[tokio::test]
    async fn test_missing_page_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let source = EncyclopediaSource::with_base_url(
            topics(),
            Arc::new(FixedClock(datetime!(2025-01-02 8:00 UTC))),
            mock_server.uri(),
        );
        assert!(source.fetch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_topics_is_empty() {
        let clock = Arc::new(FixedClock(OffsetDateTime::UNIX_EPOCH));
        let source = EncyclopediaSource::new(vec![], clock);
        assert!(source.fetch().await.unwrap().is_empty());
    }
}
