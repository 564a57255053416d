//! Watchdog core: pure cycle state machine, version sets and report text.
mod alert;
mod effect;
mod msg;
mod state;
mod update;
mod version_set;

pub use alert::{
    alert_line, error_line, format_timestamp, mail_body, webhook_content, AlertEvent,
    NO_PREVIOUS_VERSION,
};
pub use effect::{ChannelKind, Effect};
pub use msg::Msg;
pub use state::{Phase, WatchState};
pub use update::update;
pub use version_set::VersionSet;
