//! digest-bots domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Items, analyses and reports
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `prompt`: Per-bot prompt and report wording
//! - `sanitize`: Plain-text output constraints
//! - `usecases`: Fetch chain, curation, analysis, assembly and the run pipeline

pub mod model;
pub mod ports;
pub mod prompt;
pub mod sanitize;
pub mod usecases;

pub use model::*;
pub use ports::*;
pub use prompt::{BotKind, PromptTemplate};
pub use sanitize::{Sanitizer, SanitizerConfig};
