//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;

/// Kind of external system an item was fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// RSS/Atom journal or news feed
    Feed,
    /// Trending-repository listing page
    Trending,
    /// Fund valuation endpoint
    FundQuote,
    /// arXiv search API
    Arxiv,
    /// PubMed E-utilities search
    PubMed,
    /// Encyclopedia page summary
    Encyclopedia,
    /// Hot-topic list
    HotList,
    /// Built-in local content
    Local,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Feed => "feed",
            Origin::Trending => "trending",
            Origin::FundQuote => "fund_quote",
            Origin::Arxiv => "arxiv",
            Origin::PubMed => "pubmed",
            Origin::Encyclopedia => "encyclopedia",
            Origin::HotList => "hot_list",
            Origin::Local => "local",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source-native content record before any filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    /// Display title
    pub title: String,
    /// Bounded excerpt of the body; empty when the source has none
    pub body_excerpt: String,
    /// Key used for deduplication (title or a source-native code)
    pub identity_key: String,
    /// Kind of source that produced the item
    pub origin: Origin,
    /// Human-readable source label (journal name, language, fund code...)
    pub source: String,
    /// Canonical link
    pub link: String,
    /// Publication time, when the source provides one
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    /// Source-specific fields made available to prompt templates
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl RawItem {
    /// Create an item whose identity key is its title
    pub fn new(
        origin: Origin,
        source: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            identity_key: title.clone(),
            title,
            body_excerpt: String::new(),
            origin,
            source: source.into(),
            link: link.into(),
            published_at: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.body_excerpt = excerpt.into();
        self
    }

    pub fn with_identity_key(mut self, key: impl Into<String>) -> Self {
        self.identity_key = key.into();
        self
    }

    pub fn with_published_at(mut self, published_at: Option<OffsetDateTime>) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Get a source-specific attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// A raw item that survived relevance, dedup and quota
#[derive(Debug, Clone, PartialEq)]
pub struct CuratedItem {
    /// 1-based position in the final selection
    pub rank: usize,
    pub item: RawItem,
}

/// Analysis text for one curated item
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub item_identity_key: String,
    /// Text as returned by the generative service (or the failure placeholder)
    pub raw_text: String,
    /// `raw_text` after a single sanitizer pass
    pub sanitized_text: String,
    /// Whether the analysis call failed and `raw_text` is a placeholder
    pub failed: bool,
}

/// One numbered section of a report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub number: usize,
    pub source: String,
    pub title: String,
    pub link: String,
    pub body: String,
}

/// The deliverable text for one run
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Header, numbered sections and footer
    Digest {
        header: String,
        sections: Vec<ReportSection>,
        footer: String,
    },
    /// Fixed message used when nothing survived curation
    NoContent { message: String },
}

impl Report {
    pub const SECTION_SEPARATOR: &'static str = "━━━━━━━━━━━━";

    /// Number of item sections in the report
    pub fn section_count(&self) -> usize {
        match self {
            Report::Digest { sections, .. } => sections.len(),
            Report::NoContent { .. } => 0,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Report::NoContent { .. })
    }

    /// Render the report as the plain text handed to delivery
    pub fn render(&self) -> String {
        match self {
            Report::NoContent { message } => message.clone(),
            Report::Digest {
                header,
                sections,
                footer,
            } => {
                let mut out = String::new();
                out.push_str(header.trim_end());
                out.push_str("\n\n");
                for section in sections {
                    out.push_str(Self::SECTION_SEPARATOR);
                    out.push('\n');
                    out.push_str(&format!(
                        "【{}】{} | {}\n",
                        section.number, section.source, section.title
                    ));
                    out.push_str(section.body.trim());
                    out.push('\n');
                    if !section.link.is_empty() {
                        out.push_str(&format!("🔗 {}\n", section.link));
                    }
                    out.push('\n');
                }
                out.push_str(footer.trim());
                out
            }
        }
    }
}

/// Pipeline stages, entered once each per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Fetching,
    Filtering,
    Analyzing,
    Assembling,
    Delivered,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Fetching => "fetching",
            RunStage::Filtering => "filtering",
            RunStage::Analyzing => "analyzing",
            RunStage::Assembling => "assembling",
            RunStage::Delivered => "delivered",
        };
        f.write_str(name)
    }
}

/// Outcome of a complete run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Sources consulted, in order
    pub sources_tried: Vec<String>,
    /// Items fetched before curation
    pub fetched: usize,
    /// Items in the final selection
    pub curated: Vec<CuratedItem>,
    /// Per-item analysis results, in rank order
    pub analyses: Vec<AnalysisResult>,
    /// The assembled report
    pub report: Report,
    /// Whether the delivery sink accepted the report
    pub delivered: bool,
}

impl RunSummary {
    pub fn failed_analyses(&self) -> usize {
        self.analyses.iter().filter(|a| a.failed).count()
    }
}
