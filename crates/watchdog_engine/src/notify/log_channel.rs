use watchdog_core::{alert_line, AlertEvent};
use watchdog_logging::watch_warn;

use crate::AlertLog;

/// Always-on channel: echoes the alert line on stdout and appends it to the
/// alert log. A log write failure leaves the stdout echo as the only record.
#[derive(Debug, Clone)]
pub struct LogChannel {
    log: AlertLog,
}

impl LogChannel {
    pub fn new(log: AlertLog) -> Self {
        Self { log }
    }

    /// Returns the line that was emitted.
    pub fn record(&self, event: &AlertEvent) -> String {
        let line = alert_line(event);
        println!("{line}");
        if let Err(err) = self.log.append(&line) {
            watch_warn!(
                "Alert log {:?} not writable, alert kept on stdout only: {}",
                self.log.path(),
                err
            );
        }
        line
    }
}
