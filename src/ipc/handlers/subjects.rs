use crate::access::View;
use crate::ipc::helpers::{commit, require_str, require_view, respond, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::mutate::{self, SubjectAction};
use serde_json::json;

fn handle_subjects_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_view(state, View::Dashboard)?;
    Ok(json!({ "subjects": state.book.current().subjects }))
}

fn apply(state: &mut AppState, action: SubjectAction) -> HandlerResult {
    let change = mutate::apply_subject(state.book.current(), action)?;
    let details = change.details.clone();
    commit(state, change);
    Ok(json!({
        "subjects": state.book.current().subjects,
        "details": details,
        "historyIndex": state.book.cursor(),
    }))
}

fn handle_subjects_add(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let name = require_str(req, "name")?.to_string();
    apply(state, SubjectAction::Add(name))
}

fn handle_subjects_rename(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let old_name = require_str(req, "oldName")?.to_string();
    let new_name = require_str(req, "newName")?.to_string();
    apply(state, SubjectAction::Rename { old_name, new_name })
}

fn handle_subjects_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let name = require_str(req, "name")?.to_string();
    apply(state, SubjectAction::Delete(name))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "subjects.list" => handle_subjects_list(state, req),
        "subjects.add" => handle_subjects_add(state, req),
        "subjects.rename" => handle_subjects_rename(state, req),
        "subjects.delete" => handle_subjects_delete(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
