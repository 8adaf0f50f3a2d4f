use crate::access::View;
use crate::db;
use crate::ipc::helpers::{bad_params, require_str, require_view, respond, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::ledger::DEFAULT_AVERAGE_DECIMALS;
use crate::model::Semester;
use serde_json::{json, Map, Value};

#[derive(Clone, Copy)]
enum SetupSection {
    School,
    Reports,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "school" => Some(Self::School),
            "reports" => Some(Self::Reports),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::School => "setup.school",
            Self::Reports => "setup.reports",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::School => json!({
            "name": "",
            "address": "",
            "phone": "",
            "principal": "",
            "academicYear": ""
        }),
        SetupSection::Reports => json!({
            "averageDecimals": DEFAULT_AVERAGE_DECIMALS,
            "defaultSemester": 1
        }),
    }
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.chars().count() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = current
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())?;
    for (k, v) in patch {
        match section {
            SetupSection::School => match k.as_str() {
                "name" | "principal" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 120)?));
                }
                "address" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 240)?));
                }
                "phone" | "academicYear" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 40)?));
                }
                _ => return Err(format!("unknown school field: {}", k)),
            },
            SetupSection::Reports => match k.as_str() {
                "averageDecimals" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 4)?));
                }
                "defaultSemester" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 1, 2)?));
                }
                _ => return Err(format!("unknown reports field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: &rusqlite::Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // A malformed saved section falls back to defaults as a whole.
            if let Err(e) = merge_section_patch(section, &mut current, saved_obj) {
                tracing::warn!(section = section.key(), error = %e, "ignoring saved settings");
                current = default_section(section);
            }
        }
    }
    Ok(current)
}

/// Section values for readers; defaults when no workspace is open.
fn section_or_default(state: &AppState, section: SetupSection) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return default_section(section);
    };
    load_section(conn, section).unwrap_or_else(|e| {
        tracing::warn!(section = section.key(), error = %e, "failed to read settings");
        default_section(section)
    })
}

pub fn average_decimals(state: &AppState) -> usize {
    section_or_default(state, SetupSection::Reports)
        .get("averageDecimals")
        .and_then(|v| v.as_u64())
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_AVERAGE_DECIMALS)
}

/// Semester used when a report or grade request does not name one.
pub fn default_semester(state: &AppState) -> Semester {
    section_or_default(state, SetupSection::Reports)
        .get("defaultSemester")
        .and_then(|v| v.as_i64())
        .and_then(|n| Semester::try_from(n).ok())
        .unwrap_or(Semester::First)
}

pub fn school_profile(state: &AppState) -> Value {
    section_or_default(state, SetupSection::School)
}

fn handle_setup_get(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_view(state, View::Dashboard)?;
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    let db_err = |e: anyhow::Error| HandlerErr::new("db_query_failed", e.to_string());
    let school = load_section(conn, SetupSection::School).map_err(db_err)?;
    let reports = load_section(conn, SetupSection::Reports).map_err(db_err)?;
    Ok(json!({
        "school": school,
        "reports": reports,
    }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    let section_raw = require_str(req, "section")?;
    let Some(section) = SetupSection::parse(section_raw) else {
        return Err(bad_params("unknown section"));
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return Err(bad_params("patch must be an object"));
    };

    let mut current = load_section(conn, section)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;
    merge_section_patch(section, &mut current, patch_obj).map_err(bad_params)?;
    db::settings_set_json(conn, section.key(), &current)
        .map_err(|e| HandlerErr::new("db_update_failed", e.to_string()))?;
    tracing::info!(section = section.key(), "settings updated");
    Ok(json!({ "ok": true, "section": section_raw, "values": current }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "setup.get" => handle_setup_get(state, req),
        "setup.update" => handle_setup_update(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
