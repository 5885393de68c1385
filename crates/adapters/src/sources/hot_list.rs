//! Social hot-list source (JSON `data[].target.{title,url}`)

use async_trait::async_trait;
use digest_bots_domain::{Origin, RawItem, SourceAdapter, SourceError};
use reqwest::Client;
use serde::Deserialize;

use super::{ensure_success, http_client, transport_error};

pub const DEFAULT_URL: &str = "https://www.zhihu.com/api/v3/feed/topstory/hot-lists/total?limit=50";

/// Ranked hot topics; relevance is left to the slot's keyword policy
pub struct HotListSource {
    client: Client,
    name: String,
    url: String,
}

impl HotListSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Deserialize)]
struct HotList {
    #[serde(default)]
    data: Vec<HotEntry>,
}

#[derive(Deserialize)]
struct HotEntry {
    #[serde(default)]
    target: Target,
}

#[derive(Default, Deserialize)]
struct Target {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    excerpt: String,
}

#[async_trait]
impl SourceAdapter for HotListSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(transport_error)?;

        let list: HotList = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        Ok(list
            .data
            .into_iter()
            .map(|entry| entry.target)
            .filter(|target| !target.title.trim().is_empty())
            .map(|target| {
                RawItem::new(Origin::HotList, self.name.clone(), target.title, target.url)
                    .with_excerpt(target.excerpt)
            })
            .collect())
    }
}
