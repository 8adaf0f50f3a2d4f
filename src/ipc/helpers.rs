use crate::access::{AccessError, User, View};
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup;
use crate::ipc::types::{AppState, Request};
use crate::model::Semester;
use crate::mutate::{Change, MutationError};
use crate::store;
use serde_json::{json, Value};

/// Failure of a handler, mapped one-to-one onto the error envelope.
#[derive(Debug)]
pub struct HandlerErr {
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> Value {
        err(id, &self.code, self.message, self.details)
    }
}

impl From<MutationError> for HandlerErr {
    fn from(e: MutationError) -> Self {
        Self {
            code: e.code,
            message: e.message,
            details: e.details,
        }
    }
}

impl From<AccessError> for HandlerErr {
    fn from(e: AccessError) -> Self {
        Self {
            code: e.code.to_string(),
            message: e.message,
            details: e.details,
        }
    }
}

pub type HandlerResult = Result<Value, HandlerErr>;

pub fn respond(req: &Request, result: HandlerResult) -> Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn bad_params(message: impl Into<String>) -> HandlerErr {
    HandlerErr::new("bad_params", message)
}

/// A trimmed, non-empty string parameter.
pub fn require_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, HandlerErr> {
    match req.params.get(key).and_then(|v| v.as_str()).map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(bad_params(format!("missing {}", key))),
    }
}

pub fn optional_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub fn parse_semester(v: &Value) -> Result<Semester, HandlerErr> {
    let n = v
        .as_i64()
        .ok_or_else(|| bad_params("semester must be 1 or 2"))?;
    Semester::try_from(n).map_err(bad_params)
}

pub fn optional_semester(req: &Request) -> Result<Option<Semester>, HandlerErr> {
    match req.params.get("semester") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => parse_semester(v).map(Some),
    }
}

/// The requested semester, else the workspace's `reports.defaultSemester`.
pub fn semester_or_default(state: &AppState, req: &Request) -> Result<Semester, HandlerErr> {
    Ok(optional_semester(req)?.unwrap_or_else(|| setup::default_semester(state)))
}

/// The logged-in user, if they may act inside `view`.
pub fn require_view(state: &AppState, view: View) -> Result<User, HandlerErr> {
    Ok(state.session.require(view)?.clone())
}

/// Records `change` under the acting user and saves the workbook.
pub fn commit(state: &mut AppState, change: Change) {
    let user = state.session.display_name().to_string();
    state.book.commit(change, &user);
    persist(state);
}

/// Saves the workbook if a workspace is open. A failed save is logged only;
/// the in-memory change stands.
pub fn persist(state: &AppState) {
    let Some(conn) = state.db.as_ref() else {
        return;
    };
    if let Err(e) = store::save_workbook(conn, &state.book) {
        tracing::warn!(error = %e, "failed to save workbook");
    }
}

pub fn history_status(state: &AppState) -> Value {
    json!({
        "cursor": state.book.cursor(),
        "depth": state.book.depth(),
        "canUndo": state.book.can_undo(),
        "canRedo": state.book.can_redo(),
    })
}
