//! Append-only activity log shown to the user.
//!
//! Every operation reports progress and failures here; the GUI renders the
//! entries in insertion order. Entries are also mirrored to `tracing`.

use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex, MutexGuard};

pub const PLACEHOLDER_MESSAGE: &str = "Log messages will appear here...";

/// Link attached to a log entry (explorer page of a submitted transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub link: Option<LogLink>,
    pub is_error: bool,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, is_error: bool) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
            link: None,
            is_error,
        }
    }

    /// Local wall-clock time, e.g. `14:03:27`
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

#[derive(Debug)]
struct LogState {
    entries: Vec<LogEntry>,
    placeholder: bool,
}

/// Cloneable handle to the session's activity log.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    state: Arc<Mutex<LogState>>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LogState {
                entries: vec![LogEntry::new(PLACEHOLDER_MESSAGE, false)],
                placeholder: true,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, entry: LogEntry) {
        if entry.is_error {
            tracing::error!("{}", entry.message);
        } else {
            tracing::info!("{}", entry.message);
        }

        let mut state = self.lock();
        if state.placeholder {
            state.entries.clear();
            state.placeholder = false;
        }
        state.entries.push(entry);
    }

    pub fn append(&self, message: impl Into<String>, is_error: bool) {
        self.push(LogEntry::new(message, is_error));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.append(message, false);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.append(message, true);
    }

    pub fn append_with_link(&self, message: impl Into<String>, link: Option<LogLink>) {
        let mut entry = LogEntry::new(message, false);
        entry.link = link;
        self.push(entry);
    }

    /// Snapshot of all entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True until the first real message has been appended
    pub fn is_placeholder(&self) -> bool {
        self.lock().placeholder
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock().entries.iter().map(|e| e.message.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_log_shows_placeholder() {
        let log = ActivityLog::new();
        assert!(log.is_placeholder());
        assert_eq!(log.messages(), vec![PLACEHOLDER_MESSAGE.to_string()]);
    }

    #[test]
    fn test_first_append_clears_placeholder() {
        let log = ActivityLog::new();
        log.info("Requesting wallet connection...");
        assert!(!log.is_placeholder());
        assert_eq!(log.messages(), vec!["Requesting wallet connection...".to_string()]);
    }

    #[test]
    fn test_append_preserves_order_and_flags() {
        let log = ActivityLog::new();
        log.info("one");
        log.error("two");
        log.info("three");

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "one");
        assert!(!entries[0].is_error);
        assert!(entries[1].is_error);
        assert_eq!(entries[2].message, "three");
        assert!(entries[0].timestamp <= entries[2].timestamp);
    }

    #[test]
    fn test_clones_share_entries() {
        let log = ActivityLog::new();
        let writer = log.clone();
        writer.info("from another handle");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_append_with_link() {
        let log = ActivityLog::new();
        log.append_with_link(
            "Approval transaction sent.",
            Some(LogLink {
                label: "View Transaction".to_string(),
                url: "https://example.org/tx/0x01".to_string(),
            }),
        );
        let entry = &log.entries()[0];
        assert_eq!(entry.link.as_ref().unwrap().label, "View Transaction");
        assert!(!entry.is_error);
    }

    #[test]
    fn test_time_label_format() {
        let entry = LogEntry::new("x", false);
        let label = entry.time_label();
        assert_eq!(label.len(), 8);
        assert_eq!(label.matches(':').count(), 2);
    }
}
