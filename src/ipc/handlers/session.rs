use crate::access::{self, LoginChoice, View};
use crate::ipc::helpers::{bad_params, require_str, respond, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_auth_options(state: &mut AppState, _req: &Request) -> HandlerResult {
    let snap = state.book.current();
    let teachers: Vec<serde_json::Value> = snap
        .teachers
        .iter()
        .map(|t| json!({ "id": t.id, "name": t.name }))
        .collect();
    let mut homeroom_classes: Vec<&str> = snap
        .homeroom_teachers
        .iter()
        .map(|h| h.class.as_str())
        .collect();
    homeroom_classes.sort();
    homeroom_classes.dedup();
    Ok(json!({
        "teachers": teachers,
        "homeroomClasses": homeroom_classes,
    }))
}

fn parse_login(req: &Request) -> Result<LoginChoice, HandlerErr> {
    match require_str(req, "role")? {
        "admin" => Ok(LoginChoice::Admin),
        "teacher" => Ok(LoginChoice::Teacher {
            teacher_id: require_str(req, "teacherId")?.to_string(),
        }),
        "homeroom" => Ok(LoginChoice::Homeroom {
            class: require_str(req, "class")?.to_string(),
        }),
        other => Err(bad_params(format!("unknown role: {}", other))),
    }
}

fn handle_auth_login(state: &mut AppState, req: &Request) -> HandlerResult {
    let choice = parse_login(req)?;
    let user = access::resolve_login(state.book.current(), &choice)?;
    tracing::info!(user = %user.name, "login");
    let views = access::views_for(&user.role);
    let body = json!({ "user": user, "views": views, "view": View::Dashboard });
    state.session.login(user);
    Ok(body)
}

fn handle_auth_logout(state: &mut AppState, _req: &Request) -> HandlerResult {
    if let Some(user) = state.session.user() {
        tracing::info!(user = %user.name, "logout");
    }
    state.session.logout();
    Ok(json!({ "ok": true }))
}

fn handle_auth_whoami(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({
        "user": state.session.user(),
        "view": state.session.view(),
    }))
}

fn handle_view_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    let Some(user) = state.session.user() else {
        return Err(HandlerErr::new("not_authenticated", "log in first"));
    };
    Ok(json!({
        "views": access::views_for(&user.role),
        "current": state.session.view(),
    }))
}

fn handle_view_navigate(state: &mut AppState, req: &Request) -> HandlerResult {
    let raw = require_str(req, "view")?;
    let Some(view) = View::parse(raw) else {
        return Err(bad_params(format!("unknown view: {}", raw)));
    };
    state.session.navigate(view)?;
    Ok(json!({ "view": view }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "auth.options" => handle_auth_options(state, req),
        "auth.login" => handle_auth_login(state, req),
        "auth.logout" => handle_auth_logout(state, req),
        "auth.whoami" => handle_auth_whoami(state, req),
        "view.list" => handle_view_list(state, req),
        "view.navigate" => handle_view_navigate(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
