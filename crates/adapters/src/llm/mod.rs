//! Generative-text provider adapters

pub mod openai_compat;
pub mod stub;

pub use openai_compat::OpenAiCompatAnalyzer;
pub use stub::StubAnalyzer;

use serde::{Deserialize, Serialize};

/// Common LLM configuration
///
/// Temperature and output length come from each bot's prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name/ID
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Cap applied on top of the template's output budget
    pub max_output_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "deepseek-reasoner".to_string(),
            timeout_secs: 90,
            max_output_tokens: None,
        }
    }
}

impl LlmConfig {
    /// Output budget for one request, honouring the configured cap
    pub fn output_budget(&self, requested: u32) -> u32 {
        self.max_output_tokens
            .map_or(requested, |cap| requested.min(cap))
    }
}
