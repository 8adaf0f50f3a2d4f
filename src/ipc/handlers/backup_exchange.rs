use super::setup::average_decimals;
use crate::access::View;
use crate::backup;
use crate::db;
use crate::ipc::helpers::{
    persist, require_str, require_view, respond, semester_or_default, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::ledger;
use crate::store;
use serde_json::json;
use std::path::PathBuf;

fn io_failed(e: impl ToString, path: &str) -> HandlerErr {
    HandlerErr::new("io_failed", e.to_string()).with_details(json!({ "path": path }))
}

fn handle_backup_export_workspace_bundle(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let out_path = require_str(req, "outPath")?.to_string();
    let Some(workspace_path) = state.workspace.clone() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };

    // The bundle must carry the in-memory workbook as it stands now.
    persist(state);
    if let Some(conn) = state.db.as_ref() {
        if let Err(e) = conn.execute_batch("PRAGMA wal_checkpoint(FULL)") {
            tracing::debug!(error = %e, "wal checkpoint skipped");
        }
    }

    let out = PathBuf::from(&out_path);
    let export =
        backup::export_workspace_bundle(&workspace_path, &out).map_err(|e| io_failed(e, &out_path))?;

    Ok(json!({
        "ok": true,
        "path": out_path,
        "bundleFormat": export.bundle_format,
        "entryCount": export.entry_count,
        "dbSha256": export.db_sha256,
    }))
}

fn handle_backup_import_workspace_bundle(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let in_path = require_str(req, "inPath")?.to_string();
    let workspace_path = req
        .params
        .get("workspacePath")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .or_else(|| state.workspace.clone());
    let Some(workspace_path) = workspace_path else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };

    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return Err(HandlerErr::new("not_found", "bundle file not found")
            .with_details(json!({ "path": in_path })));
    }

    // Drop open handle before replacing file.
    state.db = None;

    let import = match backup::import_workspace_bundle(&src, &workspace_path) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, path = %in_path, "workspace bundle rejected");
            if let Some(prev) = state.workspace.clone() {
                match db::open_db(&prev) {
                    Ok(conn) => state.db = Some(conn),
                    Err(reopen) => tracing::warn!(error = %reopen, "failed to reopen workspace"),
                }
            }
            return Err(io_failed(e, &in_path));
        }
    };

    let conn = db::open_db(&workspace_path)
        .map_err(|e| HandlerErr::new("db_open_failed", e.to_string()))?;
    state.book = store::load_workbook(&conn);
    state.workspace = Some(workspace_path.clone());
    state.db = Some(conn);

    Ok(json!({
        "ok": true,
        "workspacePath": workspace_path.to_string_lossy(),
        "bundleFormatDetected": import.bundle_format_detected,
        "historyIndex": state.book.cursor(),
    }))
}

fn handle_exchange_export_ledger_csv(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::ReportCard)?;
    let class = require_str(req, "class")?;
    let semester = semester_or_default(state, req)?;
    let out_path = require_str(req, "outPath")?;
    state.session.require_class(class)?;

    let model = ledger::build_ledger(state.book.current(), class, semester);
    let table = model.to_table(average_decimals(state));
    let rows_exported = table
        .write_csv(&PathBuf::from(out_path))
        .map_err(|e| io_failed(e, out_path))?;
    tracing::info!(class, %semester, rows = rows_exported, path = out_path, "exported ledger csv");

    Ok(json!({ "ok": true, "rowsExported": rows_exported, "path": out_path }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "backup.exportWorkspaceBundle" => handle_backup_export_workspace_bundle(state, req),
        "backup.importWorkspaceBundle" => handle_backup_import_workspace_bundle(state, req),
        "exchange.exportLedgerCsv" => handle_exchange_export_ledger_csv(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
