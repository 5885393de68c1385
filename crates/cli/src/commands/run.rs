//! Run command - one straight-line pass of a digest bot

use anyhow::{Context, Result, bail};
use digest_bots_adapters::{
    delivery::{ConsoleDelivery, OutboxDelivery, OutboxWriter, WebhookDelivery},
    llm::{LlmConfig as AdapterLlmConfig, OpenAiCompatAnalyzer, StubAnalyzer},
    sources::{
        ArxivSource, EncyclopediaSource, FeedSource, FundQuoteSource, HotListSource,
        PubMedSource, StaticSource, TrendingSource,
    },
};
use digest_bots_domain::{
    Analyzer, BotKind, Clock, Delivery, PromptTemplate, SystemClock,
    usecases::{
        Curator, DigestPlan, DigestRun, FetchPolicy, QuotaSelector, RelevanceFilter, SourceChain,
        SourceSlot,
    },
};
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use time::Duration;

use crate::args::RunArgs;
use crate::config::{AppConfig, LlmConfig};

/// Impact factor shown for journals configured without one
const UNKNOWN_IMPACT_FACTOR: &str = "20+";

const LOCAL_TOPIC_SOURCE: &str = "本地话题";
const LOCAL_TOPIC_TITLE: &str = "健康生活方式的重要性";
const LOCAL_TOPIC_EXCERPT: &str = "WHO研究表明，生活方式占健康影响因素60%以上。睡眠、运动、饮食是日常可控的三大支柱：保持7-8小时优质睡眠，每天30分钟中等强度运动，多吃蔬菜水果并限制添加糖。";

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let plan = build_plan(&args, &config, clock.clone());
    let analyzer: Arc<dyn Analyzer> = Arc::from(build_analyzer(&config.llm)?);
    let delivery = build_delivery(&args, &config).await?;

    tracing::info!(
        bot = %args.bot,
        sources = plan.chain.len(),
        strategy = ?plan.chain.strategy(),
        provider = %config.llm.provider,
        "Starting digest run"
    );

    let summary = DigestRun::new(plan, analyzer, delivery, clock)
        .run_once()
        .await;

    if !summary.delivered {
        tracing::warn!(bot = %args.bot, "Run finished without a confirmed delivery");
    }

    Ok(())
}

fn build_plan(args: &RunArgs, config: &AppConfig, clock: Arc<dyn Clock>) -> DigestPlan {
    let (chain, curator) = match args.bot {
        BotKind::Journals => journals_chain(config),
        BotKind::Trending => trending_chain(args, config),
        BotKind::Funds => funds_chain(args, config),
        BotKind::Papers => papers_chain(args, config),
        BotKind::HealthFacts => health_facts_chain(config, clock),
        BotKind::HealthBrief => health_brief_chain(config),
    };

    DigestPlan {
        template: PromptTemplate::for_bot(args.bot),
        chain,
        curator,
    }
}

fn journals_chain(config: &AppConfig) -> (SourceChain, Curator) {
    let journals = &config.journals;
    let freshness = hours(journals.freshness_hours);

    let slots = journals
        .feeds
        .iter()
        .map(|feed| {
            let impact_factor = feed
                .impact_factor
                .clone()
                .unwrap_or_else(|| UNKNOWN_IMPACT_FACTOR.to_string());
            slot(
                FeedSource::new(&feed.name, &feed.url)
                    .with_attribute("impact_factor", impact_factor),
                FetchPolicy::first(journals.entries_per_feed).with_freshness(freshness),
            )
        })
        .collect();

    (
        SourceChain::union_all(slots),
        Curator::new(
            RelevanceFilter::new(&journals.keywords),
            QuotaSelector::new(limit(journals.max_items)),
        ),
    )
}

fn trending_chain(args: &RunArgs, config: &AppConfig) -> (SourceChain, Curator) {
    let per_language = args.max.unwrap_or(config.trending.per_language);

    let slots = list_override(args.languages.as_ref(), &config.trending.languages)
        .into_iter()
        .map(|language| slot(TrendingSource::new(language), FetchPolicy::first(per_language)))
        .collect();

    (SourceChain::union_all(slots), Curator::default())
}

fn funds_chain(args: &RunArgs, config: &AppConfig) -> (SourceChain, Curator) {
    let slots = list_override(args.funds.as_ref(), &config.funds.codes)
        .into_iter()
        .map(|code| slot(FundQuoteSource::new(code), FetchPolicy::default()))
        .collect();

    (SourceChain::union_all(slots), Curator::default())
}

fn papers_chain(args: &RunArgs, config: &AppConfig) -> (SourceChain, Curator) {
    let papers = &config.papers;
    let per_keyword = args.max.unwrap_or(papers.per_keyword);
    let window = hours(papers.window_hours);

    let slots = list_override(args.keywords.as_ref(), &papers.keywords)
        .into_iter()
        .map(|keyword| {
            slot(
                ArxivSource::new(keyword, per_keyword),
                FetchPolicy::first(per_keyword).with_freshness(window),
            )
        })
        .collect();

    (
        SourceChain::union_all(slots),
        Curator::new(RelevanceFilter::default(), QuotaSelector::new(limit(papers.max_items))),
    )
}

fn health_facts_chain(config: &AppConfig, clock: Arc<dyn Clock>) -> (SourceChain, Curator) {
    let health = &config.health;

    let slots = vec![
        slot(
            EncyclopediaSource::new(health.topics.clone(), clock),
            FetchPolicy::default(),
        ),
        slot(
            PubMedSource::new("PubMed", &health.facts_query)
                .with_max_results(5)
                .with_window_days(health.literature_window_days),
            FetchPolicy::default(),
        ),
    ];

    (
        SourceChain::union_all(slots),
        Curator::new(RelevanceFilter::default(), QuotaSelector::new(Some(2))),
    )
}

fn health_brief_chain(config: &AppConfig) -> (SourceChain, Curator) {
    let health = &config.health;

    let slots = vec![
        slot(
            HotListSource::new("知乎热榜", &health.hot_list_url),
            FetchPolicy::default().with_keywords(RelevanceFilter::new(&health.hot_list_keywords)),
        ),
        slot(
            FeedSource::new("WHO", &health.news_feed_url),
            FetchPolicy::first(1),
        ),
        slot(
            PubMedSource::new("PubMed", &health.brief_query)
                .with_max_results(3)
                .with_window_days(health.literature_window_days),
            FetchPolicy::default(),
        ),
        slot(
            StaticSource::topic(LOCAL_TOPIC_SOURCE, LOCAL_TOPIC_TITLE, LOCAL_TOPIC_EXCERPT),
            FetchPolicy::default(),
        ),
    ];

    (
        SourceChain::pick_one(slots),
        Curator::new(RelevanceFilter::default(), QuotaSelector::new(Some(1))),
    )
}

fn slot<S>(source: S, policy: FetchPolicy) -> SourceSlot
where
    S: digest_bots_domain::SourceAdapter + 'static,
{
    SourceSlot::new(Arc::new(source), policy)
}

/// CLI list if given, else the configured one; blanks dropped
fn list_override(cli: Option<&Vec<String>>, configured: &[String]) -> Vec<String> {
    cli.map(Vec::as_slice)
        .unwrap_or(configured)
        .iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// 0 means unbounded
fn limit(value: usize) -> Option<usize> {
    if value == 0 { None } else { Some(value) }
}

/// 0 disables the freshness window
fn hours(value: u32) -> Option<Duration> {
    if value == 0 {
        None
    } else {
        Some(Duration::hours(i64::from(value)))
    }
}

fn build_analyzer(config: &LlmConfig) -> Result<Box<dyn Analyzer>> {
    match config.provider.as_str() {
        "openai_compat" => {
            let base_url = config.base_url.trim();
            if base_url.is_empty() {
                bail!("LLM base_url is required");
            }
            let api_key = load_secret(&config.api_key_env, "llm")?;
            Ok(Box::new(OpenAiCompatAnalyzer::new(
                api_key,
                base_url.to_string(),
                AdapterLlmConfig {
                    model: config.model.clone(),
                    timeout_secs: config.timeout_secs,
                    max_output_tokens: config.max_output_tokens,
                },
            )))
        }
        "stub" => Ok(Box::new(StubAnalyzer::echo())),
        other => bail!("Unknown LLM provider: {}", other),
    }
}

async fn build_delivery(args: &RunArgs, config: &AppConfig) -> Result<Arc<dyn Delivery>> {
    if let Some(path) = &args.outbox {
        if args.dry_run {
            tracing::info!("--outbox overrides --dry-run");
        }
        let writer = OutboxWriter::new(path.clone())
            .await
            .context("Failed to initialize outbox writer")?;
        tracing::info!(outbox = %path.display(), "Writing report to outbox");
        return Ok(Arc::new(OutboxDelivery::new(writer, args.bot.as_str())));
    }

    if args.dry_run || config.general.dry_run {
        return Ok(Arc::new(ConsoleDelivery));
    }

    let webhook_env = webhook_env(args.bot, config);
    match resolve_webhook(&[webhook_env, &config.delivery.fallback_webhook_env]) {
        Some(url) => Ok(Arc::new(WebhookDelivery::new(url))),
        None => {
            tracing::warn!(
                env = %webhook_env,
                "Webhook variable not set; printing report to stdout"
            );
            Ok(Arc::new(ConsoleDelivery))
        }
    }
}

fn webhook_env(bot: BotKind, config: &AppConfig) -> &str {
    match bot {
        BotKind::Journals => &config.journals.webhook_env,
        BotKind::Trending => &config.trending.webhook_env,
        BotKind::Funds => &config.funds.webhook_env,
        BotKind::Papers => &config.papers.webhook_env,
        BotKind::HealthFacts | BotKind::HealthBrief => &config.health.webhook_env,
    }
}

/// First non-empty variable among the candidates
fn resolve_webhook(candidates: &[&str]) -> Option<SecretString> {
    candidates
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .find_map(|name| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
        })
        .map(|value| SecretString::new(value.into()))
}

fn load_secret(env_var: &str, purpose: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No env var configured for {}", purpose);
    }

    let value = std::env::var(env_var)
        .with_context(|| format!("Missing env var {} for {}", env_var, purpose))?;

    if value.trim().is_empty() {
        bail!("Env var {} is empty for {}", env_var, purpose);
    }

    Ok(SecretString::new(value.into()))
}
