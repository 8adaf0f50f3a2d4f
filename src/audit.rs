use crate::model::HistoryLogEntry;
use chrono::Utc;

pub const SYSTEM_USER: &str = "System";

/// Append-only change log, newest first. Undo and redo never rewrite it.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<HistoryLogEntry>,
}

impl AuditLog {
    pub fn from_entries(entries: Vec<HistoryLogEntry>) -> Self {
        Self { entries }
    }

    pub fn record(&mut self, user: &str, action: &str, details: impl Into<String>) {
        self.entries.insert(
            0,
            HistoryLogEntry {
                timestamp: Utc::now(),
                user: user.to_string(),
                action: action.to_string(),
                details: details.into(),
            },
        );
    }

    pub fn entries(&self) -> &[HistoryLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
