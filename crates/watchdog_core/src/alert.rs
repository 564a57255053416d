//! Alert values and the human-readable text every channel sends.

use chrono::{DateTime, Local};

use crate::VersionSet;

/// Shown in place of the previous latest version on a first detection.
pub const NO_PREVIOUS_VERSION: &str = "None";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Produced once per cycle that found new names; consumed by every channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    pub current: VersionSet,
    pub new: VersionSet,
    pub previous: VersionSet,
    pub detected_at: DateTime<Local>,
}

impl AlertEvent {
    /// Greatest previous name and greatest current name.
    ///
    /// Only the maximum of each side is reported, so several new names or a
    /// reappearing old one collapse into a single transition.
    pub fn transition(&self) -> (&str, &str) {
        (
            self.previous.latest().unwrap_or(NO_PREVIOUS_VERSION),
            self.current.latest().unwrap_or(NO_PREVIOUS_VERSION),
        )
    }
}

pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// `[YYYY-MM-DD HH:MM:SS] 🚨 New version(s) detected: a, b`
pub fn alert_line(event: &AlertEvent) -> String {
    format!(
        "[{}] 🚨 New version(s) detected: {}",
        format_timestamp(&event.detected_at),
        event.new.sorted().join(", ")
    )
}

/// `[YYYY-MM-DD HH:MM:SS] ERROR: message`
pub fn error_line(at: &DateTime<Local>, message: &str) -> String {
    format!("[{}] ERROR: {}", format_timestamp(at), message)
}

/// Markdown body posted to the webhook.
pub fn webhook_content(event: &AlertEvent, source_url: &str) -> String {
    let bullets: Vec<String> = event
        .current
        .sorted()
        .into_iter()
        .map(|name| format!("🔹 `{name}`"))
        .collect();
    let (old_latest, new_latest) = event.transition();

    let mut content = String::from("✅ **Current Acronis Versions:**\n");
    content.push_str(&bullets.join("\n"));
    content.push_str("\n\n🔁 **Change detected:**\n");
    content.push_str(&format!("`{old_latest}` ➝ `{new_latest}`"));
    content.push_str(&format!("\n🔗 {source_url}"));
    content
}

/// Plaintext body of the alert mail.
pub fn mail_body(event: &AlertEvent, source_url: &str) -> String {
    let bullets: Vec<String> = event
        .current
        .sorted()
        .into_iter()
        .map(|name| format!("- {name}"))
        .collect();
    let (old_latest, new_latest) = event.transition();

    format!(
        "A new version of the Acronis Cyber Protect Agent has been detected.\n\
         \n\
         Current versions:\n\
         {}\n\
         \n\
         Change detected:\n\
         {old_latest} ➝ {new_latest}\n\
         \n\
         View: {source_url}",
        bullets.join("\n")
    )
}
