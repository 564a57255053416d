use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use watchdog_core::{update, ChannelKind, Effect, Msg, VersionSet, WatchState};
use watchdog_logging::{set_cycle, watch_debug, watch_info};

use crate::{
    decode_listing, extract_subdirectories, AlertLog, DeliveryStatus, Fetcher, LogChannel,
    Notifier, VersionStore,
};

/// Source of timestamps for alert and error entries.
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

#[derive(Clone)]
pub struct WatchSettings {
    pub source_url: String,
    pub interval: Duration,
    pub clock: Clock,
}

impl WatchSettings {
    pub fn new(source_url: impl Into<String>, interval: Duration) -> Self {
        Self {
            source_url: source_url.into(),
            interval,
            clock: Arc::new(Local::now),
        }
    }
}

/// What a single pass did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CycleReport {
    pub cycle: u64,
    pub current: VersionSet,
    pub new: VersionSet,
    pub snapshot_saved: bool,
    pub deliveries: Vec<(ChannelKind, DeliveryStatus)>,
}

/// Runs fetch → diff → persist → notify passes on a fixed interval.
///
/// Every failure inside a pass is written to the alert log and the pass
/// carries on with a degraded value; nothing escapes `run_cycle`.
pub struct Watcher {
    settings: WatchSettings,
    fetcher: Box<dyn Fetcher>,
    store: VersionStore,
    alert_log: AlertLog,
    log_channel: LogChannel,
    notifier: Notifier,
    state: WatchState,
}

impl Watcher {
    pub fn new(
        settings: WatchSettings,
        fetcher: Box<dyn Fetcher>,
        store: VersionStore,
        alert_log: AlertLog,
        notifier: Notifier,
    ) -> Self {
        Self {
            settings,
            fetcher,
            store,
            log_channel: LogChannel::new(alert_log.clone()),
            alert_log,
            notifier,
            state: WatchState::new(),
        }
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// Scans immediately, then once per interval, forever.
    pub async fn run(mut self) {
        loop {
            self.run_cycle().await;
            tokio::time::sleep(self.settings.interval).await;
        }
    }

    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();
        let mut pending: VecDeque<Effect> = self.dispatch(Msg::Tick).into();
        report.cycle = self.state.cycles();
        set_cycle(report.cycle);

        while let Some(effect) = pending.pop_front() {
            match effect {
                Effect::StartScan => {
                    watch_info!("Scanning {}", self.settings.source_url);
                    let current = self.fetch_current().await;
                    let previous = self.load_previous();
                    report.current = current.clone();
                    let detected_at = self.now();
                    pending.extend(self.dispatch(Msg::ScanCompleted {
                        current,
                        previous,
                        detected_at,
                    }));
                }
                Effect::RecordAlert(event) => {
                    report.new = event.new.clone();
                    self.log_channel.record(&event);
                }
                Effect::SaveSnapshot(versions) => {
                    report.snapshot_saved = self.save_snapshot(&versions);
                }
                Effect::Notify { channel, event } => {
                    let status = match self.notifier.notify(channel, &event).await {
                        Ok(status) => status,
                        Err(err) => {
                            self.record_error(&format!("{channel} alert failed: {err}"));
                            DeliveryStatus::Failed
                        }
                    };
                    watch_debug!("{} channel: {:?}", channel, status);
                    report.deliveries.push((channel, status));
                }
            }
        }

        watch_debug!(
            "{} new of {} listed",
            self.state.last_new_count(),
            report.current.len()
        );
        report
    }

    fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        effects
    }

    async fn fetch_current(&self) -> VersionSet {
        let output = match self.fetcher.fetch(&self.settings.source_url).await {
            Ok(output) => output,
            Err(err) => {
                self.record_error(&format!("Fetch failed: {err}"));
                return VersionSet::new();
            }
        };
        if output.metadata.final_url != self.settings.source_url {
            watch_info!("Listing served from {}", output.metadata.final_url);
        }
        let decoded = decode_listing(&output.bytes, output.metadata.content_type.as_deref());
        if decoded.lossy {
            watch_debug!(
                "Listing had bytes invalid for {}; replaced",
                decoded.encoding_label
            );
        }
        extract_subdirectories(&decoded.html)
    }

    fn load_previous(&self) -> VersionSet {
        self.store.load().unwrap_or_else(|err| {
            self.record_error(&err.to_string());
            VersionSet::new()
        })
    }

    fn save_snapshot(&self, versions: &VersionSet) -> bool {
        match self.store.save(versions) {
            Ok(()) => true,
            Err(err) => {
                self.record_error(&format!("Saving versions failed: {err}"));
                false
            }
        }
    }

    fn record_error(&self, message: &str) {
        self.alert_log.record_error(&self.now(), message);
    }

    fn now(&self) -> DateTime<Local> {
        (self.settings.clock)()
    }
}
