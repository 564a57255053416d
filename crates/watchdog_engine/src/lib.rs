//! Watchdog engine: listing fetch, snapshot store, notification channels and
//! the watch loop that executes core effects.
mod alert_log;
mod decode;
mod fetch;
mod listing;
mod notify;
mod persist;
mod store;
mod types;
mod watcher;

pub use alert_log::AlertLog;
pub use decode::{decode_listing, DecodedHtml};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use listing::extract_subdirectories;
pub use notify::{
    Channel, DeliveryStatus, LogChannel, MailChannel, MailSettings, MailTransport, Notifier,
    NotifyError, WebhookChannel,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use store::{StoreError, VersionStore};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
pub use watcher::{Clock, CycleReport, WatchSettings, Watcher};
