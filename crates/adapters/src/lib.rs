//! digest-bots adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `sources`: Feed, listing, quote and literature source adapters
//! - `llm`: Generative-text providers (OpenAI-compatible, stub)
//! - `delivery`: Webhook, JSONL outbox and console sinks

pub mod delivery;
pub mod llm;
pub mod sources;
