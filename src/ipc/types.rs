use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::access::Session;
use crate::store::Workbook;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything one sidecar process owns. Handlers receive it explicitly.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub book: Workbook,
    pub session: Session,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            db: None,
            book: Workbook::default(),
            session: Session::default(),
        }
    }
}
