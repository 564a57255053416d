use chrono::{DateTime, Local};

use crate::VersionSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Interval timer fired (also sent once at startup).
    Tick,
    /// Fetch and snapshot load finished for the scan in progress.
    ///
    /// Either side is empty when its source failed; the failure has already
    /// been logged by whoever produced the message.
    ScanCompleted {
        current: VersionSet,
        previous: VersionSet,
        detected_at: DateTime<Local>,
    },
}
