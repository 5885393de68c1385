//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,

    #[serde(default)]
    pub journals: JournalsConfig,

    #[serde(default)]
    pub trending: TrendingConfig,

    #[serde(default)]
    pub funds: FundsConfig,

    #[serde(default)]
    pub papers: PapersConfig,

    #[serde(default)]
    pub health: HealthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Print reports instead of posting them
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// openai_compat or stub
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Optional cap over each bot's own output budget
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Webhook variable consulted when a bot's own variable is unset
    #[serde(default = "default_fallback_webhook_env")]
    pub fallback_webhook_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub impact_factor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalsConfig {
    #[serde(default = "default_journals_webhook_env")]
    pub webhook_env: String,

    #[serde(default = "default_journal_feeds")]
    pub feeds: Vec<FeedConfig>,

    #[serde(default = "default_entries_per_feed")]
    pub entries_per_feed: usize,

    /// 0 keeps entries regardless of age
    #[serde(default)]
    pub freshness_hours: u32,

    #[serde(default = "default_journal_keywords")]
    pub keywords: Vec<String>,

    #[serde(default = "default_journal_max_items")]
    pub max_items: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingConfig {
    #[serde(default = "default_trending_webhook_env")]
    pub webhook_env: String,

    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    #[serde(default = "default_per_language")]
    pub per_language: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsConfig {
    #[serde(default = "default_funds_webhook_env")]
    pub webhook_env: String,

    #[serde(default = "default_fund_codes")]
    pub codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PapersConfig {
    #[serde(default = "default_papers_webhook_env")]
    pub webhook_env: String,

    #[serde(default = "default_paper_keywords")]
    pub keywords: Vec<String>,

    #[serde(default = "default_per_keyword")]
    pub per_keyword: usize,

    #[serde(default = "default_paper_window_hours")]
    pub window_hours: u32,

    /// 0 means unbounded
    #[serde(default)]
    pub max_items: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_webhook_env")]
    pub webhook_env: String,

    /// Encyclopedia topics rotated by day of year
    #[serde(default = "default_health_topics")]
    pub topics: Vec<String>,

    #[serde(default = "default_facts_query")]
    pub facts_query: String,

    #[serde(default = "default_brief_query")]
    pub brief_query: String,

    #[serde(default = "default_literature_window_days")]
    pub literature_window_days: u32,

    #[serde(default = "default_hot_list_url")]
    pub hot_list_url: String,

    #[serde(default = "default_hot_list_keywords")]
    pub hot_list_keywords: Vec<String>,

    #[serde(default = "default_news_feed_url")]
    pub news_feed_url: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider() -> String {
    "openai_compat".to_string()
}

fn default_model() -> String {
    "deepseek-reasoner".to_string()
}

fn default_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    90
}

fn default_fallback_webhook_env() -> String {
    "FEISHU_WEBHOOK_URL".to_string()
}

fn default_journals_webhook_env() -> String {
    "CNS_FEISHU_URL".to_string()
}

fn default_trending_webhook_env() -> String {
    "GITHUB_FEISHU_URL".to_string()
}

fn default_funds_webhook_env() -> String {
    "FUND_FEISHU_URL".to_string()
}

fn default_papers_webhook_env() -> String {
    "PAPER_FEISHU_URL".to_string()
}

fn default_health_webhook_env() -> String {
    "LIFE_FEISHU_URL".to_string()
}

fn feed(name: &str, url: &str, impact_factor: &str) -> FeedConfig {
    FeedConfig {
        name: name.to_string(),
        url: url.to_string(),
        impact_factor: Some(impact_factor.to_string()),
    }
}

fn default_journal_feeds() -> Vec<FeedConfig> {
    vec![
        feed("Nature", "https://www.nature.com/nature.rss", "64.8"),
        feed("Nature Medicine", "https://www.nature.com/nm.rss", "82.9"),
        feed("Nature Cancer", "https://www.nature.com/natcancer.rss", "23.5"),
        feed("Cell", "https://www.cell.com/cell/current.rss", "64.5"),
        feed("Cancer Cell", "https://www.cell.com/cancer-cell/current.rss", "48.8"),
        feed("Cell Stem Cell", "https://www.cell.com/cell-stem-cell/current.rss", "23.9"),
        feed("Immunity", "https://www.cell.com/immunity/current.rss", "32.4"),
        feed("Science", "https://www.science.org/rss/news_current.xml", "56.9"),
        feed(
            "Science Translational Medicine",
            "https://www.science.org/rss/tm_current.xml",
            "17.1",
        ),
        feed("Molecular Cell", "https://www.cell.com/molecular-cell/current.rss", "17.0"),
        feed("Nature Cell Biology", "https://www.nature.com/ncb.rss", "17.3"),
        feed("Nature Immunology", "https://www.nature.com/ni.rss", "27.7"),
        feed("Cell Metabolism", "https://www.cell.com/cell-metabolism/current.rss", "31.3"),
        feed("Neuron", "https://www.cell.com/neuron/current.rss", "16.2"),
    ]
}

fn default_entries_per_feed() -> usize {
    2
}

fn default_journal_keywords() -> Vec<String> {
    [
        "cancer",
        "tumor",
        "immunotherapy",
        "single-cell",
        "spatial",
        "CRISPR",
        "genome",
        "transcriptome",
        "proteomics",
        "metabolism",
        "stem cell",
        "differentiation",
        "microenvironment",
        "signaling",
        "pathway",
        "mechanism",
        "therapeutic",
        "clinical trial",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_journal_max_items() -> usize {
    5
}

fn default_languages() -> Vec<String> {
    vec!["python".to_string(), "typescript".to_string()]
}

fn default_per_language() -> usize {
    5
}

fn default_fund_codes() -> Vec<String> {
    vec!["022477".to_string(), "016482".to_string(), "010011".to_string()]
}

fn default_paper_keywords() -> Vec<String> {
    vec!["LLM".to_string(), "RAG".to_string(), "Agent".to_string()]
}

fn default_per_keyword() -> usize {
    3
}

fn default_paper_window_hours() -> u32 {
    24
}

fn default_health_topics() -> Vec<String> {
    [
        "Circadian rhythm",
        "Melatonin",
        "Vitamin D",
        "Hypertension",
        "Caffeine",
        "Blue light",
        "Gut microbiota",
        "REM sleep",
        "Insulin resistance",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_facts_query() -> String {
    "(sleep[Title] OR diet[Title] OR exercise[Title]) AND (meta-analysis[Title] OR randomized[Title])"
        .to_string()
}

fn default_brief_query() -> String {
    "(health[Title] OR diet[Title] OR sleep[Title]) AND (review[Publication Type])".to_string()
}

fn default_literature_window_days() -> u32 {
    7
}

fn default_hot_list_url() -> String {
    digest_bots_adapters::sources::hot_list::DEFAULT_URL.to_string()
}

fn default_hot_list_keywords() -> Vec<String> {
    ["健康", "医学", "医生", "疾病", "减肥", "睡眠", "营养", "运动", "疫苗", "体检"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_news_feed_url() -> String {
    "https://www.who.int/rss-feeds/news-english.xml".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
            max_output_tokens: None,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            fallback_webhook_env: default_fallback_webhook_env(),
        }
    }
}

impl Default for JournalsConfig {
    fn default() -> Self {
        Self {
            webhook_env: default_journals_webhook_env(),
            feeds: default_journal_feeds(),
            entries_per_feed: default_entries_per_feed(),
            freshness_hours: 0,
            keywords: default_journal_keywords(),
            max_items: default_journal_max_items(),
        }
    }
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            webhook_env: default_trending_webhook_env(),
            languages: default_languages(),
            per_language: default_per_language(),
        }
    }
}

impl Default for FundsConfig {
    fn default() -> Self {
        Self {
            webhook_env: default_funds_webhook_env(),
            codes: default_fund_codes(),
        }
    }
}

impl Default for PapersConfig {
    fn default() -> Self {
        Self {
            webhook_env: default_papers_webhook_env(),
            keywords: default_paper_keywords(),
            per_keyword: default_per_keyword(),
            window_hours: default_paper_window_hours(),
            max_items: 0,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            webhook_env: default_health_webhook_env(),
            topics: default_health_topics(),
            facts_query: default_facts_query(),
            brief_query: default_brief_query(),
            literature_window_days: default_literature_window_days(),
            hot_list_url: default_hot_list_url(),
            hot_list_keywords: default_hot_list_keywords(),
            news_feed_url: default_news_feed_url(),
        }
    }
}

impl AppConfig {
    /// `--log-level` wins, then `general.log_level`; an unreadable config falls back to the default
    pub fn log_level(cli_level: Option<&str>, config_path: Option<&Path>) -> String {
        match cli_level {
            Some(level) => level.to_string(),
            None => Self::load(config_path)
                .map(|config| config.general.log_level)
                .unwrap_or_else(|_| default_log_level()),
        }
    }

    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("DIGEST_BOTS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# digest-bots configuration
#
# Secrets never live in this file: each *_env key names the environment
# variable that holds the value. Any key can be overridden with
# DIGEST_BOTS__<SECTION>__<KEY>, e.g. DIGEST_BOTS__LLM__MODEL=deepseek-chat.

[general]
log_level = "info"
# Print reports to stdout instead of posting them
dry_run = false

[llm]
provider = "openai_compat"  # openai_compat, stub
model = "deepseek-reasoner"
base_url = "https://api.deepseek.com/v1"
api_key_env = "OPENAI_API_KEY"
timeout_secs = 90
# max_output_tokens = 1200

[delivery]
# Used when a bot's own webhook variable is unset
fallback_webhook_env = "FEISHU_WEBHOOK_URL"

[journals]
webhook_env = "CNS_FEISHU_URL"
entries_per_feed = 2
# 0 keeps entries regardless of age
freshness_hours = 0
max_items = 5
keywords = ["cancer", "tumor", "immunotherapy", "single-cell", "CRISPR", "clinical trial"]

[[journals.feeds]]
name = "Nature"
url = "https://www.nature.com/nature.rss"
impact_factor = "64.8"

[[journals.feeds]]
name = "Cell"
url = "https://www.cell.com/cell/current.rss"
impact_factor = "64.5"

[trending]
webhook_env = "GITHUB_FEISHU_URL"
languages = ["python", "typescript"]
per_language = 5

[funds]
webhook_env = "FUND_FEISHU_URL"
codes = ["022477", "016482", "010011"]

[papers]
webhook_env = "PAPER_FEISHU_URL"
keywords = ["LLM", "RAG", "Agent"]
per_keyword = 3
window_hours = 24
# 0 means unbounded
max_items = 0

[health]
webhook_env = "LIFE_FEISHU_URL"
topics = ["Circadian rhythm", "Melatonin", "Vitamin D", "Gut microbiota"]
facts_query = "(sleep[Title] OR diet[Title] OR exercise[Title]) AND (meta-analysis[Title] OR randomized[Title])"
brief_query = "(health[Title] OR diet[Title] OR sleep[Title]) AND (review[Publication Type])"
literature_window_days = 7
hot_list_url = "https://www.zhihu.com/api/v3/feed/topstory/hot-lists/total?limit=50"
hot_list_keywords = ["健康", "医学", "医生", "疾病", "减肥", "睡眠", "营养", "运动", "疫苗", "体检"]
news_feed_url = "https://www.who.int/rss-feeds/news-english.xml"
"#
        .to_string()
    }
}
