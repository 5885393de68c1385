//! PubMed literature search (NCBI E-utilities, JSON mode)

use async_trait::async_trait;
use digest_bots_domain::{Origin, RawItem, SourceAdapter, SourceError};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::{ensure_success, http_client, transport_error};

const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Newest PubMed records matching a query within a relative-date window
pub struct PubMedSource {
    client: Client,
    base_url: String,
    name: String,
    term: String,
    max_results: usize,
    window_days: u32,
}

impl PubMedSource {
    pub fn new(name: impl Into<String>, term: impl Into<String>) -> Self {
        Self::with_base_url(name, term, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(
        name: impl Into<String>,
        term: impl Into<String>,
        base_url: String,
    ) -> Self {
        Self {
            client: http_client(),
            base_url,
            name: name.into(),
            term: term.into(),
            max_results: 3,
            window_days: 7,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_window_days(mut self, window_days: u32) -> Self {
        self.window_days = window_days;
        self
    }

    async fn search(&self) -> Result<Vec<String>, SourceError> {
        let retmax = self.max_results.to_string();
        let reldate = self.window_days.to_string();
        let response = self
            .client
            .get(format!("{}/esearch.fcgi", self.base_url))
            .query(&[
                ("db", "pubmed"),
                ("term", self.term.as_str()),
                ("retmax", retmax.as_str()),
                ("sort", "date"),
                ("retmode", "json"),
                ("datetype", "pdat"),
                ("reldate", reldate.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let search: SearchResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        Ok(search.esearchresult.idlist)
    }

    async fn summaries(&self, ids: &[String]) -> Result<HashMap<String, Summary>, SourceError> {
        let id = ids.join(",");
        let response = self
            .client
            .get(format!("{}/esummary.fcgi", self.base_url))
            .query(&[("db", "pubmed"), ("id", id.as_str()), ("retmode", "json")])
            .send()
            .await
            .map_err(transport_error)?;

        let body: SummaryResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        // `result` mixes a `uids` array with one object per id
        Ok(body
            .result
            .into_iter()
            .filter(|(key, _)| key != "uids")
            .filter_map(|(key, value)| {
                serde_json::from_value::<Summary>(value)
                    .ok()
                    .map(|summary| (key, summary))
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    esearchresult: SearchResult,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    result: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct Summary {
    #[serde(default)]
    title: String,
    /// Journal abbreviation
    #[serde(default)]
    source: String,
    #[serde(default)]
    sortfirstauthor: String,
    #[serde(default)]
    pubdate: String,
}

#[async_trait]
impl SourceAdapter for PubMedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        tracing::debug!(source = %self.name, term = %self.term, "Searching PubMed");

        let ids = self.search().await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut summaries = self.summaries(&ids).await?;

        Ok(ids
            .iter()
            .filter_map(|id| summaries.remove(id).map(|summary| (id, summary)))
            .filter(|(_, summary)| !summary.title.trim().is_empty())
            .map(|(id, summary)| {
                let label = if summary.source.is_empty() {
                    self.name.clone()
                } else {
                    format!("{} - {}", self.name, summary.source)
                };
                RawItem::new(
                    Origin::PubMed,
                    label,
                    summary.title,
                    format!("https://pubmed.ncbi.nlm.nih.gov/{}/", id),
                )
                .with_identity_key(format!("pmid:{}", id))
                .with_attribute("pmid", id.clone())
                .with_attribute("journal", summary.source)
                .with_attribute("first_author", summary.sortfirstauthor)
                .with_attribute("pubdate", summary.pubdate)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_search_then_summaries() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .and(query_param("reldate", "7"))
            .and(query_param("retmode", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "esearchresult": { "count": "2", "idlist": ["40000002", "40000001"] }
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/esummary.fcgi"))
            .and(query_param("id", "40000002,40000001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {
                    "uids": ["40000002", "40000001"],
                    "40000001": {
                        "uid": "40000001",
                        "title": "Sleep duration and mortality: a meta-analysis.",
                        "source": "BMJ",
                        "sortfirstauthor": "Smith J",
                        "pubdate": "2025 Mar 5"
                    },
                    "40000002": {
                        "uid": "40000002",
                        "title": "Mediterranean diet randomized trial.",
                        "source": "Lancet",
                        "sortfirstauthor": "Rossi M",
                        "pubdate": "2025 Mar 6"
                    }
                }
            })))
            .mount(&mock_server)
            .await;

        let source = PubMedSource::with_base_url("PubMed", "sleep[Title]", mock_server.uri());
        let items = source.fetch().await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Mediterranean diet randomized trial.");
        assert_eq!(items[0].source, "PubMed - Lancet");
        assert_eq!(items[0].link, "https://pubmed.ncbi.nlm.nih.gov/40000002/");
        assert_eq!(items[0].identity_key, "pmid:40000002");
        assert_eq!(items[1].attribute("first_author"), Some("Smith J"));
    }

    #[tokio::test]
    async fn test_fetch_no_hits_skips_summary() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "esearchresult": { "count": "0", "idlist": [] }
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/esummary.fcgi"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&mock_server)
            .await;

        let source = PubMedSource::with_base_url("PubMed", "diet", mock_server.uri());
        assert!(source.fetch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_malformed_search() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/esearch.fcgi"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let source = PubMedSource::with_base_url("PubMed", "diet", mock_server.uri());
        assert!(matches!(source.fetch().await, Err(SourceError::Malformed(_))));
    }
}
