//! Report delivery sinks

pub mod outbox;
pub mod webhook;

pub use outbox::{OutboxDelivery, OutboxError, OutboxWriter};
pub use webhook::WebhookDelivery;

use async_trait::async_trait;
use digest_bots_domain::{Delivery, DeliveryError, DeliveryReceipt};
use tokio::io::AsyncWriteExt;

/// Writes the report to stdout (dry runs and missing webhook)
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleDelivery;

#[async_trait]
impl Delivery for ConsoleDelivery {
    async fn deliver(&self, text: &str) -> Result<DeliveryReceipt, DeliveryError> {
        let mut stdout = tokio::io::stdout();
        let io = |e: std::io::Error| DeliveryError::Io(e.to_string());

        stdout.write_all(text.as_bytes()).await.map_err(io)?;
        stdout.write_all(b"\n").await.map_err(io)?;
        stdout.flush().await.map_err(io)?;

        Ok(DeliveryReceipt {
            sink: "console",
            status: None,
        })
    }
}
