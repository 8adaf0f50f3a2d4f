use crate::access::View;
use crate::ipc::helpers::{history_status, persist, require_view, respond, HandlerResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_undo(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let user = state.session.display_name().to_string();
    let changed = state.book.undo(&user);
    if changed {
        persist(state);
    }
    let mut body = history_status(state);
    body["changed"] = json!(changed);
    Ok(body)
}

fn handle_redo(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let user = state.session.display_name().to_string();
    let changed = state.book.redo(&user);
    if changed {
        persist(state);
    }
    let mut body = history_status(state);
    body["changed"] = json!(changed);
    Ok(body)
}

fn handle_status(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_view(state, View::Dashboard)?;
    Ok(history_status(state))
}

fn handle_log(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::History)?;
    let entries = state.book.audit().entries();
    let limit = req
        .params
        .get("limit")
        .and_then(|v| v.as_u64())
        .map(|n| n as usize)
        .unwrap_or(entries.len());
    Ok(json!({
        "total": entries.len(),
        "entries": &entries[..limit.min(entries.len())],
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "history.undo" => handle_undo(state, req),
        "history.redo" => handle_redo(state, req),
        "history.status" => handle_status(state, req),
        "history.log" => handle_log(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
