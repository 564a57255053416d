//! Startup configuration.
//!
//! Read once from TOML (`$WATCHDOG_CONFIG`, else `./watchdog.toml`) and
//! passed by value into every component. A missing file means defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::LevelFilter;
use serde::Deserialize;
use watchdog_engine::{FetchSettings, MailSettings};

pub const CONFIG_ENV: &str = "WATCHDOG_CONFIG";
pub const PASSWORD_ENV: &str = "WATCHDOG_SMTP_PASSWORD";
const DEFAULT_CONFIG_FILE: &str = "watchdog.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source_url: String,
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    pub snapshot_path: PathBuf,
    pub alert_log_path: PathBuf,
    pub diagnostic_log_path: PathBuf,
    pub log_level: String,
    pub webhook: WebhookConfig,
    pub mail: MailConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: "https://eu8-cloud.acronis.com/download/u/baas/4.0/".to_string(),
            interval_secs: 3600,
            request_timeout_secs: 10,
            snapshot_path: PathBuf::from("detected_versions.json"),
            alert_log_path: PathBuf::from("alert_log.txt"),
            diagnostic_log_path: PathBuf::from("watchdog.log"),
            log_level: "info".to_string(),
            webhook: WebhookConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebhookConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MailConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        let settings = MailSettings::default();
        Self {
            enabled: settings.enabled,
            host: settings.host,
            port: settings.port,
            username: settings.username,
            password: settings.password,
            from: settings.from,
            to: settings.to,
            subject: settings.subject,
        }
    }
}

impl Config {
    /// Load from `$WATCHDOG_CONFIG` or `./watchdog.toml`, then apply the
    /// password override from the environment.
    pub fn load() -> Result<Self> {
        let path = env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::load_from_path(&path)?;
        if let Ok(password) = env::var(PASSWORD_ENV) {
            config.mail.password = password;
        }
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.source_url)
            .with_context(|| format!("invalid source_url '{}'", self.source_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            bail!("source_url must be http or https, got '{}'", url.scheme());
        }
        if self.interval_secs == 0 {
            bail!("interval_secs must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        self.log_level_filter()?;

        if self.mail.enabled {
            if self.mail.host.trim().is_empty() {
                bail!("mail is enabled but mail.host is empty");
            }
            if self.mail.to.iter().all(|to| to.trim().is_empty()) {
                bail!("mail is enabled but mail.to has no recipients");
            }
            if self.mail_settings().sender().is_empty() {
                bail!("mail is enabled but neither mail.from nor mail.username is set");
            }
        }
        Ok(())
    }

    pub fn log_level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid log_level '{}'", self.log_level))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..FetchSettings::default()
        }
    }

    pub fn mail_settings(&self) -> MailSettings {
        MailSettings {
            enabled: self.mail.enabled,
            host: self.mail.host.clone(),
            port: self.mail.port,
            username: self.mail.username.clone(),
            password: self.mail.password.clone(),
            from: self.mail.from.clone(),
            to: self
                .mail
                .to
                .iter()
                .filter(|to| !to.trim().is_empty())
                .cloned()
                .collect(),
            subject: self.mail.subject.clone(),
            ..MailSettings::default()
        }
    }
}
