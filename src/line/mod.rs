pub mod message;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use crate::error::CheckError;

pub use message::{format_stock_message, Transition};

/// Outbound text channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, message: &str) -> Result<(), CheckError>;
}

#[derive(Debug, Deserialize)]
struct NotifyResponse {
    message: Option<String>,
}

/// LINE Notify client.
pub struct LineNotifier {
    client: Client,
    endpoint: String,
    token: String,
}

impl LineNotifier {
    pub fn new(client: Client, endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl Notifier for LineNotifier {
    async fn send_text(&self, message: &str) -> Result<(), CheckError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .form(&[("message", message)])
            .send()
            .await
            .map_err(|e| CheckError::Notification(format!("Failed to reach LINE Notify: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            info!("Successfully sent LINE notification");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<NotifyResponse>(&body)
            .ok()
            .and_then(|r| r.message)
            .unwrap_or(body);
        error!("LINE Notify failed with status {}: {}", status, detail);
        Err(CheckError::Notification(format!("LINE Notify failed: {} - {}", status, detail)))
    }
}
