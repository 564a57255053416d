use std::time::Duration;

use serde_json::json;
use watchdog_core::{webhook_content, AlertEvent, ChannelKind};
use watchdog_logging::watch_info;

use super::{Channel, NotifyError};

const PLACEHOLDER_MARKER: &str = "your_webhook_here";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts `{"content": ...}` to a chat webhook.
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    endpoint: String,
    source_url: String,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(endpoint: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            source_url: source_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Channel for WebhookChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Webhook
    }

    fn is_active(&self) -> bool {
        let endpoint = self.endpoint.trim();
        !endpoint.is_empty() && !endpoint.contains(PLACEHOLDER_MARKER)
    }

    async fn deliver(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        let payload = json!({ "content": webhook_content(event, &self.source_url) });
        let response = self
            .client
            .post(self.endpoint.trim())
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|err| NotifyError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::HttpStatus(status.as_u16()));
        }
        watch_info!("Webhook alert sent.");
        Ok(())
    }
}
