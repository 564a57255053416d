mod config;

use anyhow::Result;
use watchdog_engine::{
    AlertLog, MailChannel, Notifier, ReqwestFetcher, VersionStore, WatchSettings, Watcher,
    WebhookChannel,
};
use watchdog_logging::{initialize, watch_info, LogDestination};

use crate::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::load()?;
    initialize(
        LogDestination::Both,
        config.log_level_filter()?,
        &config.diagnostic_log_path,
    );
    config.validate()?;

    watch_info!(
        "Listing watchdog activated. Monitoring {} every {}s for new versions...",
        config.source_url,
        config.interval_secs
    );

    build_watcher(&config).run().await;
    Ok(())
}

fn build_watcher(config: &Config) -> Watcher {
    let notifier = Notifier::new()
        .with_channel(Box::new(WebhookChannel::new(
            config.webhook.url.clone(),
            config.source_url.clone(),
        )))
        .with_channel(Box::new(MailChannel::new(
            config.mail_settings(),
            config.source_url.clone(),
        )));

    Watcher::new(
        WatchSettings::new(config.source_url.clone(), config.interval()),
        Box::new(ReqwestFetcher::new(config.fetch_settings())),
        VersionStore::new(config.snapshot_path.clone()),
        AlertLog::new(config.alert_log_path.clone()),
        notifier,
    )
}
