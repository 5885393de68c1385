//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use digest_bots_domain::BotKind;
use std::path::PathBuf;

/// digest-bots: scheduled digests of feeds, papers, repositories and funds with LLM commentary
#[derive(Parser, Debug)]
#[command(name = "digest-bots")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one bot once: fetch, curate, analyze, deliver
    Run(RunArgs),

    /// Strip markup from text the way reports are cleaned
    Sanitize(SanitizeArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Bot to run (journals, trending, funds, papers, health-facts, health-brief)
    pub bot: BotKind,

    /// Print the report to stdout instead of posting it
    #[arg(long)]
    pub dry_run: bool,

    /// Append the report to a JSONL outbox instead of posting it
    #[arg(long)]
    pub outbox: Option<PathBuf>,

    /// Trending languages, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub languages: Option<Vec<String>>,

    /// Fund codes, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub funds: Option<Vec<String>>,

    /// Paper search keywords, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub keywords: Option<Vec<String>>,

    /// Results per source (papers per keyword, repositories per language)
    #[arg(long)]
    pub max: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SanitizeArgs {
    /// File to sanitize (stdin when omitted or -)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Also remove 【】 brackets
    #[arg(long)]
    pub strip_brackets: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}
