use crate::audit::AuditLog;
use crate::db;
use crate::history::HistoryStack;
use crate::model::{DataSnapshot, HistoryLogEntry};
use crate::mutate::Change;
use crate::seed;
use anyhow::{anyhow, bail, Context};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

pub const WORKBOOK_KEY: &str = "workbook";

/// Shape of the persisted blob.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    history_stack: Vec<DataSnapshot>,
    history_index: i64,
    #[serde(default)]
    history: Vec<HistoryLogEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedStateRef<'a> {
    history_stack: &'a [DataSnapshot],
    history_index: usize,
    history: &'a [HistoryLogEntry],
}

/// Undoable data plus the audit trail. Every structural change to the
/// history is paired with exactly one audit entry.
#[derive(Debug, Clone)]
pub struct Workbook {
    history: HistoryStack<DataSnapshot>,
    audit: AuditLog,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new(seed::default_snapshot())
    }
}

impl Workbook {
    pub fn new(initial: DataSnapshot) -> Self {
        Self {
            history: HistoryStack::new(initial),
            audit: AuditLog::default(),
        }
    }

    pub fn current(&self) -> &DataSnapshot {
        self.history.current()
    }

    pub fn commit(&mut self, change: Change, user: &str) {
        self.history.push(change.snapshot);
        self.audit.record(user, &change.action, change.details);
        tracing::info!(
            action = %change.action,
            user,
            cursor = self.history.cursor(),
            "committed snapshot"
        );
    }

    pub fn undo(&mut self, user: &str) -> bool {
        if !self.history.undo() {
            return false;
        }
        self.audit.record(user, "Undo", "Reverted the last data change");
        tracing::info!(user, cursor = self.history.cursor(), "undo");
        true
    }

    pub fn redo(&mut self, user: &str) -> bool {
        if !self.history.redo() {
            return false;
        }
        self.audit.record(user, "Redo", "Reapplied a reverted data change");
        tracing::info!(user, cursor = self.history.cursor(), "redo");
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn cursor(&self) -> usize {
        self.history.cursor()
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&PersistedStateRef {
            history_stack: self.history.snapshots(),
            history_index: self.history.cursor(),
            history: self.audit.entries(),
        })
    }

    /// Strict parse of a persisted blob. Any defect rejects the whole blob.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let state: PersistedState =
            serde_json::from_str(text).context("invalid workbook JSON")?;
        let len = state.history_stack.len();
        if len == 0 {
            bail!("historyStack must not be empty");
        }
        let index = usize::try_from(state.history_index)
            .ok()
            .filter(|i| *i < len)
            .ok_or_else(|| {
                anyhow!(
                    "historyIndex {} out of range for {} snapshots",
                    state.history_index,
                    len
                )
            })?;
        let history = HistoryStack::from_parts(state.history_stack, index)
            .ok_or_else(|| anyhow!("history stack rejected"))?;
        Ok(Self {
            history,
            audit: AuditLog::from_entries(state.history),
        })
    }
}

/// Loads the persisted workbook, falling back to a fresh one on any problem.
pub fn load_workbook(conn: &Connection) -> Workbook {
    let text = match db::app_state_get(conn, WORKBOOK_KEY) {
        Ok(Some(t)) => t,
        Ok(None) => {
            tracing::info!("no saved workbook; starting from defaults");
            return Workbook::default();
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to read saved workbook; starting from defaults");
            return Workbook::default();
        }
    };
    match Workbook::from_json(&text) {
        Ok(wb) => {
            tracing::info!(
                snapshots = wb.depth(),
                cursor = wb.cursor(),
                log_entries = wb.audit().len(),
                "loaded workbook"
            );
            wb
        }
        Err(e) => {
            tracing::warn!(
                error = %format!("{:#}", e),
                "saved workbook is corrupt; resetting to defaults"
            );
            if let Err(e) = db::app_state_delete(conn, WORKBOOK_KEY) {
                tracing::warn!(error = %e, "failed to clear corrupt workbook");
            }
            Workbook::default()
        }
    }
}

pub fn save_workbook(conn: &Connection, workbook: &Workbook) -> anyhow::Result<()> {
    let text = workbook.to_json()?;
    db::app_state_set(conn, WORKBOOK_KEY, &text)
}
