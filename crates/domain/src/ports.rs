//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::RawItem;

/// Error type for content source operations
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout")]
    Timeout,
    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Map a transport error, keeping timeouts distinguishable
    pub fn from_transport(error: impl std::fmt::Display, is_timeout: bool) -> Self {
        if is_timeout {
            SourceError::Timeout
        } else {
            SourceError::Network(error.to_string())
        }
    }
}

/// Port for fetching raw items from one external content source
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Label used in logs and reports (journal name, language, fund code...)
    fn name(&self) -> &str;

    /// Fetch items in the source's native order
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError>;
}

/// Error type for the generative-text service
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("API error: {0}")]
    Api(String),
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Timeout")]
    Timeout,
}

/// A single completion request
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// Optional system/persona message
    pub system: Option<String>,
    /// User prompt
    pub prompt: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

/// Port for the generative-text service: prompt in, text out
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn complete(&self, request: &AnalysisRequest) -> Result<String, AnalysisError>;
}

/// Error type for report delivery
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Webhook returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Webhook rejected message (code {code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("IO error: {0}")]
    Io(String),
}

/// Acknowledgement from a delivery sink
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// Sink name (e.g., "webhook", "console")
    pub sink: &'static str,
    /// HTTP status or sink-specific code, if any
    pub status: Option<u16>,
}

/// Port for delivering the final report
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[async_trait]
impl<A: Analyzer + ?Sized> Analyzer for &A {
    async fn complete(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        (*self).complete(request).await
    }
}
