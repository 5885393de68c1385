//! Curation stages: relevance, deduplication and quota

use std::collections::HashSet;

use crate::model::{CuratedItem, RawItem};

/// Case-insensitive keyword predicate over title and excerpt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl RelevanceFilter {
    /// Build a filter; blank keywords are ignored
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// A filter with no keywords accepts everything
    pub fn is_disabled(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_relevant(&self, item: &RawItem) -> bool {
        if self.is_disabled() {
            return true;
        }

        let haystack = format!("{} {}", item.title, item.body_excerpt).to_lowercase();
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }

    pub fn apply(&self, items: Vec<RawItem>) -> Vec<RawItem> {
        items.into_iter().filter(|i| self.is_relevant(i)).collect()
    }
}

/// First-occurrence-wins removal of repeated identity keys
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a key is offered
    pub fn admit(&mut self, item: &RawItem) -> bool {
        self.seen.insert(item.identity_key.clone())
    }

    pub fn dedupe(items: Vec<RawItem>) -> Vec<RawItem> {
        let mut dedup = Self::new();
        items.into_iter().filter(|i| dedup.admit(i)).collect()
    }
}

/// Run ceiling on the number of curated items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaSelector {
    /// Maximum items per run (None = unbounded)
    pub max_total: Option<usize>,
}

impl QuotaSelector {
    pub fn new(max_total: Option<usize>) -> Self {
        Self { max_total }
    }

    /// Order-preserving prefix selection; stops at the ceiling
    pub fn select(&self, items: Vec<RawItem>) -> Vec<RawItem> {
        match self.max_total {
            Some(max) => items.into_iter().take(max).collect(),
            None => items,
        }
    }
}

/// Relevance, dedup and quota in pipeline order
#[derive(Debug, Clone, Default)]
pub struct Curator {
    pub filter: RelevanceFilter,
    pub quota: QuotaSelector,
}

impl Curator {
    pub fn new(filter: RelevanceFilter, quota: QuotaSelector) -> Self {
        Self { filter, quota }
    }

    /// Curate raw items into ranked items, preserving source-then-discovery order
    pub fn curate(&self, items: Vec<RawItem>) -> Vec<CuratedItem> {
        let fetched = items.len();
        let relevant = self.filter.apply(items);
        let relevant_count = relevant.len();
        let unique = Deduplicator::dedupe(relevant);
        let unique_count = unique.len();
        let selected = self.quota.select(unique);

        tracing::info!(
            fetched,
            relevant = relevant_count,
            unique = unique_count,
            selected = selected.len(),
            "Curated items"
        );

        selected
            .into_iter()
            .enumerate()
            .map(|(index, item)| CuratedItem {
                rank: index + 1,
                item,
            })
            .collect()
    }
}
