//! Chat webhook sink (Feishu/Lark custom bot text message)

use async_trait::async_trait;
use digest_bots_domain::{Delivery, DeliveryError, DeliveryReceipt};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Posts the report as a single text message
pub struct WebhookDelivery {
    client: Client,
    url: SecretString,
}

impl WebhookDelivery {
    pub fn new(url: SecretString) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, url }
    }
}

#[derive(Serialize)]
struct TextMessage<'a> {
    msg_type: &'static str,
    content: TextContent<'a>,
}

#[derive(Serialize)]
struct TextContent<'a> {
    text: &'a str,
}

/// Webhooks answer 200 with a non-zero `code` when they reject a message
#[derive(Deserialize)]
struct WebhookReply {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

#[async_trait]
impl Delivery for WebhookDelivery {
    async fn deliver(&self, text: &str) -> Result<DeliveryReceipt, DeliveryError> {
        let message = TextMessage {
            msg_type: "text",
            content: TextContent { text },
        };

        let response = self
            .client
            .post(self.url.expose_secret())
            .json(&message)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if !(200..300).contains(&status) {
            return Err(DeliveryError::Status { status, body });
        }

        if let Ok(reply) = serde_json::from_str::<WebhookReply>(&body) {
            if reply.code != 0 {
                return Err(DeliveryError::Rejected {
                    code: reply.code,
                    message: reply.msg,
                });
            }
        }

        Ok(DeliveryReceipt {
            sink: "webhook",
            status: Some(status),
        })
    }
}
