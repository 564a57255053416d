use std::fmt;

use crate::{AlertEvent, VersionSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the listing and load the snapshot, then report `Msg::ScanCompleted`.
    StartScan,
    /// Append the alert line to the alert log and echo it.
    RecordAlert(AlertEvent),
    /// Overwrite the snapshot with this set.
    SaveSnapshot(VersionSet),
    /// Deliver the alert on one optional channel.
    Notify {
        channel: ChannelKind,
        event: AlertEvent,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Webhook,
    Mail,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Webhook => write!(f, "webhook"),
            ChannelKind::Mail => write!(f, "mail"),
        }
    }
}
