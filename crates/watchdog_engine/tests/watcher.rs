use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use chrono::{Local, TimeZone};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use watchdog_core::{AlertEvent, ChannelKind, VersionSet};
use watchdog_engine::{
    AlertLog, Channel, DeliveryStatus, FailureKind, FetchError, FetchMetadata, FetchOutput,
    FetchSettings, Fetcher, Notifier, NotifyError, ReqwestFetcher, VersionStore, WatchSettings,
    Watcher, WebhookChannel,
};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const SOURCE: &str = "https://downloads.example.com/baas/4.0/";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(watchdog_logging::initialize_for_tests);
}

fn listing(names: &[&str]) -> String {
    let mut html = String::from("<html><body><pre><a href=\"../\">../</a>\n");
    for name in names {
        html.push_str(&format!("<a href=\"{name}/\">{name}/</a>\n"));
    }
    html.push_str("</pre></body></html>");
    html
}

/// Serves a fixed page, or fails every time.
struct StaticFetcher {
    page: Option<String>,
}

#[async_trait::async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let Some(page) = &self.page else {
            return Err(FetchError::new(FailureKind::Network, "connection refused"));
        };
        Ok(FetchOutput {
            bytes: page.clone().into_bytes(),
            metadata: FetchMetadata {
                final_url: url.to_string(),
                content_type: Some("text/html".to_string()),
            },
        })
    }
}

#[derive(Clone)]
struct RecordingChannel {
    kind: ChannelKind,
    fail: bool,
    seen: Arc<Mutex<Vec<AlertEvent>>>,
}

impl RecordingChannel {
    fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            fail: false,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing(kind: ChannelKind) -> Self {
        Self {
            fail: true,
            ..Self::new(kind)
        }
    }

    fn seen(&self) -> Vec<AlertEvent> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Channel for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn is_active(&self) -> bool {
        true
    }

    async fn deliver(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        self.seen.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(NotifyError::HttpStatus(502));
        }
        Ok(())
    }
}

struct Harness {
    _temp: TempDir,
    snapshot: PathBuf,
    alert_log: PathBuf,
}

impl Harness {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        Self {
            snapshot: temp.path().join("detected_versions.json"),
            alert_log: temp.path().join("alert_log.txt"),
            _temp: temp,
        }
    }

    fn seed_snapshot(&self, names: &[&str]) {
        let set: VersionSet = names.iter().copied().collect();
        VersionStore::new(&self.snapshot).save(&set).unwrap();
    }

    fn watcher(&self, fetcher: Box<dyn Fetcher>, notifier: Notifier) -> Watcher {
        let mut settings = WatchSettings::new(SOURCE, Duration::from_secs(3600));
        settings.clock = Arc::new(|| Local.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
        Watcher::new(
            settings,
            fetcher,
            VersionStore::new(&self.snapshot),
            AlertLog::new(&self.alert_log),
            notifier,
        )
    }

    fn snapshot_names(&self) -> Vec<String> {
        VersionStore::new(&self.snapshot)
            .load()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect()
    }

    fn log_lines(&self) -> Vec<String> {
        fs::read_to_string(&self.alert_log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn error_lines(&self) -> Vec<String> {
        self.log_lines()
            .into_iter()
            .filter(|line| line.contains("] ERROR: "))
            .collect()
    }
}

fn serving(names: &[&str]) -> Box<dyn Fetcher> {
    Box::new(StaticFetcher {
        page: Some(listing(names)),
    })
}

#[tokio::test]
async fn new_version_is_saved_logged_and_sent_everywhere() {
    init_logging();
    let harness = Harness::new();
    harness.seed_snapshot(&["v1", "v2"]);
    let webhook = RecordingChannel::new(ChannelKind::Webhook);
    let mail = RecordingChannel::new(ChannelKind::Mail);
    let notifier = Notifier::new()
        .with_channel(Box::new(webhook.clone()))
        .with_channel(Box::new(mail.clone()));

    let mut watcher = harness.watcher(serving(&["v1", "v2", "v3"]), notifier);
    let report = watcher.run_cycle().await;

    assert_eq!(report.cycle, 1);
    assert_eq!(report.new, ["v3"].into_iter().collect::<VersionSet>());
    assert!(report.snapshot_saved);
    assert_eq!(
        report.deliveries,
        vec![
            (ChannelKind::Webhook, DeliveryStatus::Sent),
            (ChannelKind::Mail, DeliveryStatus::Sent),
        ]
    );
    assert_eq!(harness.snapshot_names(), vec!["v1", "v2", "v3"]);
    assert_eq!(
        harness.log_lines(),
        vec!["[2024-05-01 08:00:00] 🚨 New version(s) detected: v3".to_string()]
    );

    let sent = webhook.seen();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].transition(), ("v2", "v3"));
    assert_eq!(mail.seen().len(), 1);
}

#[tokio::test]
async fn unchanged_listing_leaves_snapshot_untouched_and_stays_quiet() {
    init_logging();
    let harness = Harness::new();
    let webhook = RecordingChannel::new(ChannelKind::Webhook);
    let notifier = Notifier::new().with_channel(Box::new(webhook.clone()));
    let mut watcher = harness.watcher(serving(&["v2", "v1"]), notifier);

    let first = watcher.run_cycle().await;
    assert_eq!(first.new.len(), 2);
    let saved = fs::read(&harness.snapshot).unwrap();

    let second = watcher.run_cycle().await;
    assert_eq!(second.cycle, 2);
    assert!(second.new.is_empty());
    assert!(!second.snapshot_saved);
    assert!(second.deliveries.is_empty());
    assert_eq!(fs::read(&harness.snapshot).unwrap(), saved);
    assert_eq!(webhook.seen().len(), 1);
    assert_eq!(harness.log_lines().len(), 1);
}

#[tokio::test]
async fn server_error_logs_one_fetch_failure_and_changes_nothing() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let harness = Harness::new();
    harness.seed_snapshot(&["v1"]);
    let before = fs::read(&harness.snapshot).unwrap();

    let mut settings = WatchSettings::new(server.uri(), Duration::from_secs(3600));
    settings.clock = Arc::new(|| Local.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
    let mut watcher = Watcher::new(
        settings,
        Box::new(ReqwestFetcher::new(FetchSettings::default())),
        VersionStore::new(&harness.snapshot),
        AlertLog::new(&harness.alert_log),
        Notifier::new(),
    );

    let report = watcher.run_cycle().await;
    assert!(report.current.is_empty());
    assert!(report.new.is_empty());
    assert_eq!(fs::read(&harness.snapshot).unwrap(), before);

    let errors = harness.error_lines();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("[2024-05-01 08:00:00] ERROR: Fetch failed: http status 500"));
    assert_eq!(harness.log_lines().len(), 1);
}

#[tokio::test]
async fn plain_text_listing_is_still_parsed_for_names() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<a href="v1/">v1/</a>"#, "text/plain; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let harness = Harness::new();
    let mut settings = WatchSettings::new(server.uri(), Duration::from_secs(3600));
    settings.clock = Arc::new(|| Local.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
    let mut watcher = Watcher::new(
        settings,
        Box::new(ReqwestFetcher::new(FetchSettings::default())),
        VersionStore::new(&harness.snapshot),
        AlertLog::new(&harness.alert_log),
        Notifier::new(),
    );

    let report = watcher.run_cycle().await;
    assert_eq!(report.current, ["v1"].into_iter().collect::<VersionSet>());
    assert_eq!(report.new, ["v1"].into_iter().collect::<VersionSet>());
    assert!(harness.error_lines().is_empty());
    assert_eq!(harness.snapshot_names(), vec!["v1"]);
}

#[tokio::test]
async fn corrupt_snapshot_logs_once_and_treats_everything_as_new() {
    init_logging();
    let harness = Harness::new();
    fs::write(&harness.snapshot, "{ not json").unwrap();
    let mut watcher = harness.watcher(serving(&["v1", "v2"]), Notifier::new());

    let report = watcher.run_cycle().await;
    assert_eq!(report.new, ["v1", "v2"].into_iter().collect::<VersionSet>());
    assert!(report.snapshot_saved);
    assert_eq!(harness.snapshot_names(), vec!["v1", "v2"]);

    let errors = harness.error_lines();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Version file corrupt"));
}

#[tokio::test]
async fn empty_listing_on_first_run_writes_nothing() {
    init_logging();
    let harness = Harness::new();
    let mail = RecordingChannel::new(ChannelKind::Mail);
    let notifier = Notifier::new().with_channel(Box::new(mail.clone()));
    let mut watcher = harness.watcher(serving(&[]), notifier);

    let report = watcher.run_cycle().await;
    assert!(report.new.is_empty());
    assert!(!harness.snapshot.exists());
    assert!(!harness.alert_log.exists());
    assert!(mail.seen().is_empty());
}

#[tokio::test]
async fn removed_versions_are_not_written_back() {
    init_logging();
    let harness = Harness::new();
    harness.seed_snapshot(&["v1", "v2"]);
    let mut watcher = harness.watcher(serving(&["v1"]), Notifier::new());

    let report = watcher.run_cycle().await;
    assert!(report.new.is_empty());
    assert_eq!(harness.snapshot_names(), vec!["v1", "v2"]);
}

#[tokio::test]
async fn unset_webhook_does_not_block_mail() {
    init_logging();
    let harness = Harness::new();
    let mail = RecordingChannel::new(ChannelKind::Mail);
    let notifier = Notifier::new()
        .with_channel(Box::new(WebhookChannel::new("", SOURCE)))
        .with_channel(Box::new(mail.clone()));
    let mut watcher = harness.watcher(serving(&["v1"]), notifier);

    let report = watcher.run_cycle().await;
    assert_eq!(
        report.deliveries,
        vec![
            (ChannelKind::Webhook, DeliveryStatus::Skipped),
            (ChannelKind::Mail, DeliveryStatus::Sent),
        ]
    );
    assert_eq!(mail.seen().len(), 1);
    assert_eq!(harness.log_lines().len(), 1);
}

#[tokio::test]
async fn failing_webhook_is_logged_and_mail_still_sent() {
    init_logging();
    let harness = Harness::new();
    let mail = RecordingChannel::new(ChannelKind::Mail);
    let notifier = Notifier::new()
        .with_channel(Box::new(RecordingChannel::failing(ChannelKind::Webhook)))
        .with_channel(Box::new(mail.clone()));
    let mut watcher = harness.watcher(serving(&["v1"]), notifier);

    let report = watcher.run_cycle().await;
    assert_eq!(
        report.deliveries,
        vec![
            (ChannelKind::Webhook, DeliveryStatus::Failed),
            (ChannelKind::Mail, DeliveryStatus::Sent),
        ]
    );
    assert_eq!(mail.seen().len(), 1);

    let errors = harness.error_lines();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].ends_with("webhook alert failed: webhook returned http status 502"));
}

#[tokio::test]
async fn fetch_failure_after_detection_does_not_resend() {
    init_logging();
    let harness = Harness::new();
    harness.seed_snapshot(&["v1"]);
    let webhook = RecordingChannel::new(ChannelKind::Webhook);
    let notifier = Notifier::new().with_channel(Box::new(webhook.clone()));
    let mut watcher = harness.watcher(Box::new(StaticFetcher { page: None }), notifier);

    let report = watcher.run_cycle().await;
    assert!(report.current.is_empty());
    assert!(webhook.seen().is_empty());
    assert_eq!(harness.snapshot_names(), vec!["v1"]);
    assert_eq!(harness.error_lines().len(), 1);
}
