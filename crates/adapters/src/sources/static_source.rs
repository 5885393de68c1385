//! Fixed in-memory items, the last link of a fallback chain

use async_trait::async_trait;
use digest_bots_domain::{Origin, RawItem, SourceAdapter, SourceError};

pub struct StaticSource {
    name: String,
    items: Vec<RawItem>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, items: Vec<RawItem>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }

    /// Single local topic with a title and background text
    pub fn topic(name: impl Into<String>, title: &str, excerpt: &str) -> Self {
        let name = name.into();
        let item = RawItem::new(Origin::Local, name.clone(), title, "").with_excerpt(excerpt);
        Self::new(name, vec![item])
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        Ok(self.items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_topic_yields_one_local_item() {
        let source = StaticSource::topic("本地话题", "健康生活方式", "睡眠、运动、饮食");
        let items = source.fetch().await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].origin, Origin::Local);
        assert_eq!(items[0].source, "本地话题");
        assert_eq!(items[0].body_excerpt, "睡眠、运动、饮食");
        assert!(items[0].link.is_empty());
    }
}
