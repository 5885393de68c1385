//! Source fetching: the local-recovery boundary and the fallback chain

use std::sync::Arc;
use time::{Duration, OffsetDateTime};

use crate::model::RawItem;
use crate::ports::SourceAdapter;
use crate::usecases::curate::RelevanceFilter;

/// Uniform per-source extraction rules
#[derive(Debug, Clone, Default)]
pub struct FetchPolicy {
    /// Keep only the first N items in native order
    pub max_entries: Option<usize>,
    /// Drop items published before `now - freshness`
    pub freshness: Option<Duration>,
    /// Source-local relevance filter
    pub keywords: RelevanceFilter,
}

impl FetchPolicy {
    pub fn first(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Default::default()
        }
    }

    pub fn with_freshness(mut self, freshness: Option<Duration>) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn with_keywords(mut self, keywords: RelevanceFilter) -> Self {
        self.keywords = keywords;
        self
    }

    /// Truncate, drop stale items, then filter; items without a timestamp are kept
    pub fn apply(&self, mut items: Vec<RawItem>, now: OffsetDateTime) -> Vec<RawItem> {
        if let Some(max) = self.max_entries {
            items.truncate(max);
        }

        if let Some(window) = self.freshness {
            let cutoff = now - window;
            items.retain(|item| item.published_at.is_none_or(|at| at >= cutoff));
        }

        self.keywords.apply(items)
    }
}

/// One adapter plus the policy applied to its output
#[derive(Clone)]
pub struct SourceSlot {
    pub adapter: Arc<dyn SourceAdapter>,
    pub policy: FetchPolicy,
}

impl SourceSlot {
    pub fn new(adapter: Arc<dyn SourceAdapter>, policy: FetchPolicy) -> Self {
        Self { adapter, policy }
    }

    pub fn name(&self) -> &str {
        self.adapter.name()
    }

    /// Fetch and apply the policy. Failures are logged and yield no items.
    pub async fn collect(&self, now: OffsetDateTime) -> Vec<RawItem> {
        match self.adapter.fetch().await {
            Ok(items) => {
                let fetched = items.len();
                let kept = self.policy.apply(items, now);
                tracing::debug!(
                    source = %self.name(),
                    fetched,
                    kept = kept.len(),
                    "Fetched source"
                );
                kept
            }
            Err(error) => {
                tracing::warn!(source = %self.name(), error = %error, "Source fetch failed");
                Vec::new()
            }
        }
    }
}

/// How a chain combines its sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStrategy {
    /// First source with a non-empty result wins; later sources are not invoked
    PickOne,
    /// Every source is invoked; results are concatenated in slot order
    UnionAll,
}

/// Items gathered by a chain plus the sources consulted
#[derive(Debug, Clone, Default)]
pub struct ChainOutcome {
    pub items: Vec<RawItem>,
    pub sources_tried: Vec<String>,
}

/// Ordered list of source slots with a combination strategy
#[derive(Clone)]
pub struct SourceChain {
    slots: Vec<SourceSlot>,
    strategy: ChainStrategy,
}

impl SourceChain {
    pub fn new(strategy: ChainStrategy, slots: Vec<SourceSlot>) -> Self {
        Self { slots, strategy }
    }

    pub fn pick_one(slots: Vec<SourceSlot>) -> Self {
        Self::new(ChainStrategy::PickOne, slots)
    }

    pub fn union_all(slots: Vec<SourceSlot>) -> Self {
        Self::new(ChainStrategy::UnionAll, slots)
    }

    pub fn strategy(&self) -> ChainStrategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub async fn resolve(&self, now: OffsetDateTime) -> ChainOutcome {
        let mut outcome = ChainOutcome::default();

        for slot in &self.slots {
            outcome.sources_tried.push(slot.name().to_string());
            let items = slot.collect(now).await;

            match self.strategy {
                ChainStrategy::PickOne => {
                    if !items.is_empty() {
                        tracing::info!(
                            source = %slot.name(),
                            count = items.len(),
                            "Source selected"
                        );
                        outcome.items = items;
                        return outcome;
                    }
                    tracing::info!(source = %slot.name(), "Source empty, falling through");
                }
                ChainStrategy::UnionAll => outcome.items.extend(items),
            }
        }

        outcome
    }
}
