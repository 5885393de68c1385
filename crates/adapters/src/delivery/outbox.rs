//! JSONL outbox sink: reports are appended for later review or replay

use async_trait::async_trait;
use digest_bots_domain::{Delivery, DeliveryError, DeliveryReceipt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct OutboxWriter {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl OutboxWriter {
    pub async fn new(path: PathBuf) -> Result<Self, OutboxError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: &OutboxEntry<'_>) -> Result<(), OutboxError> {
        let line = serde_json::to_string(entry)?;
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

/// Delivery that appends one JSON line per report
#[derive(Debug, Clone)]
pub struct OutboxDelivery {
    writer: OutboxWriter,
    bot: String,
}

impl OutboxDelivery {
    pub fn new(writer: OutboxWriter, bot: impl Into<String>) -> Self {
        Self {
            writer,
            bot: bot.into(),
        }
    }
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    id: String,
    bot: &'a str,
    #[serde(with = "time::serde::rfc3339")]
    written_at: OffsetDateTime,
    text: &'a str,
}

#[async_trait]
impl Delivery for OutboxDelivery {
    async fn deliver(&self, text: &str) -> Result<DeliveryReceipt, DeliveryError> {
        let entry = OutboxEntry {
            id: Uuid::new_v4().to_string(),
            bot: &self.bot,
            written_at: OffsetDateTime::now_utc(),
            text,
        };

        self.writer
            .append(&entry)
            .await
            .map_err(|error| DeliveryError::Io(format!("Outbox write failed: {}", error)))?;

        tracing::info!(
            path = %self.writer.path().display(),
            bot = %self.bot,
            "Report appended to outbox"
        );

        Ok(DeliveryReceipt {
            sink: "outbox",
            status: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    #[tokio::test]
    async fn outbox_delivery_appends_jsonl_entries() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join("outbox.jsonl");

        let writer = OutboxWriter::new(path.clone()).await.expect("writer");
        let delivery = OutboxDelivery::new(writer, "papers");

        let receipt = delivery.deliver("🎓 first report").await.expect("deliver");
        assert_eq!(receipt.sink, "outbox");
        delivery.deliver("second\nreport").await.expect("deliver");

        let contents = tokio::fs::read_to_string(&path).await.expect("read outbox");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).expect("valid json");
        assert_eq!(first["bot"], "papers");
        assert_eq!(first["text"], "🎓 first report");
        assert!(first["written_at"].as_str().is_some());

        let second: Value = serde_json::from_str(lines[1]).expect("valid json");
        assert_eq!(second["text"], "second\nreport");
        assert_ne!(first["id"], second["id"]);
    }
}
