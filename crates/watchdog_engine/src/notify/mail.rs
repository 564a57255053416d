use std::sync::Arc;
use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use watchdog_core::{mail_body, AlertEvent, ChannelKind};
use watchdog_logging::watch_info;

use super::{Channel, NotifyError};

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub timeout: Duration,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: String::new(),
            to: Vec::new(),
            subject: "Acronis Cyber Protect Agent Update".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl MailSettings {
    /// Sender address; falls back to the login name when unset.
    pub fn sender(&self) -> &str {
        if self.from.trim().is_empty() {
            self.username.trim()
        } else {
            self.from.trim()
        }
    }
}

/// Blocking submission of a composed mail.
pub trait MailTransport: Send + Sync {
    fn submit(&self, message: &Message) -> Result<(), NotifyError>;
}

impl<T> MailTransport for T
where
    T: Transport + Send + Sync,
    T::Error: std::fmt::Display,
{
    fn submit(&self, message: &Message) -> Result<(), NotifyError> {
        self.send(message)
            .map(|_| ())
            .map_err(|err| NotifyError::Smtp(err.to_string()))
    }
}

/// Sends one plaintext mail per alert over SMTP with STARTTLS.
#[derive(Clone)]
pub struct MailChannel {
    settings: MailSettings,
    source_url: String,
    transport: Option<Arc<dyn MailTransport>>,
}

impl MailChannel {
    pub fn new(settings: MailSettings, source_url: impl Into<String>) -> Self {
        Self {
            settings,
            source_url: source_url.into(),
            transport: None,
        }
    }

    /// Submits through `transport` instead of an SMTP relay built from the
    /// settings.
    pub fn with_transport(mut self, transport: Arc<dyn MailTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn compose(&self, event: &AlertEvent) -> Result<Message, NotifyError> {
        let mut builder = Message::builder()
            .from(parse_mailbox(self.settings.sender())?)
            .subject(self.settings.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.settings.to {
            builder = builder.to(parse_mailbox(recipient)?);
        }
        builder
            .body(mail_body(event, &self.source_url))
            .map_err(|err| NotifyError::Compose(err.to_string()))
    }

    fn smtp_transport(&self) -> Result<SmtpTransport, NotifyError> {
        let transport = SmtpTransport::starttls_relay(&self.settings.host)
            .map_err(|err| NotifyError::Smtp(err.to_string()))?
            .port(self.settings.port)
            .credentials(Credentials::new(
                self.settings.username.clone(),
                self.settings.password.clone(),
            ))
            .timeout(Some(self.settings.timeout))
            .build();
        Ok(transport)
    }
}

#[async_trait::async_trait]
impl Channel for MailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Mail
    }

    fn is_active(&self) -> bool {
        self.settings.enabled
    }

    async fn deliver(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        let message = self.compose(event)?;
        let transport: Arc<dyn MailTransport> = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(self.smtp_transport()?),
        };

        // The SMTP client is blocking; run it off the async thread and wait.
        tokio::task::spawn_blocking(move || transport.submit(&message))
            .await
            .map_err(|err| NotifyError::Smtp(err.to_string()))??;

        watch_info!("Email alert sent to {} recipient(s).", self.settings.to.len());
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|err| NotifyError::Address {
            address: address.to_string(),
            message: err.to_string(),
        })
}
