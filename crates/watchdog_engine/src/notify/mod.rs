//! Notification channels.
//!
//! The log channel is always on and cannot fail outward. Webhook and mail
//! channels are optional, each reports its own outcome, and a failure in one
//! never prevents delivery on another.

mod log_channel;
mod mail;
mod webhook;

pub use log_channel::LogChannel;
pub use mail::{MailChannel, MailSettings, MailTransport};
pub use webhook::WebhookChannel;

use thiserror::Error;
use watchdog_core::{AlertEvent, ChannelKind};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook returned http status {0}")]
    HttpStatus(u16),
    #[error("webhook request failed: {0}")]
    Request(String),
    #[error("invalid mail address {address:?}: {message}")]
    Address { address: String, message: String },
    #[error("failed to build mail message: {0}")]
    Compose(String),
    #[error("smtp delivery failed: {0}")]
    Smtp(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent,
    /// Channel not configured, or disabled.
    Skipped,
    /// Delivery was attempted and failed.
    Failed,
}

/// An optional alert channel.
#[async_trait::async_trait]
pub trait Channel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Whether configuration allows this channel to send at all.
    fn is_active(&self) -> bool;

    async fn deliver(&self, event: &AlertEvent) -> Result<(), NotifyError>;
}

/// Routes alerts to the configured optional channels by kind.
#[derive(Default)]
pub struct Notifier {
    channels: Vec<Box<dyn Channel>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, channel: Box<dyn Channel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub async fn notify(
        &self,
        kind: ChannelKind,
        event: &AlertEvent,
    ) -> Result<DeliveryStatus, NotifyError> {
        let Some(channel) = self
            .channels
            .iter()
            .find(|channel| channel.kind() == kind && channel.is_active())
        else {
            return Ok(DeliveryStatus::Skipped);
        };
        channel.deliver(event).await?;
        Ok(DeliveryStatus::Sent)
    }
}
