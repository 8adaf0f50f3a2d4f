use crate::access::View;
use crate::import;
use crate::ipc::helpers::{
    bad_params, commit, optional_str, require_str, require_view, respond, HandlerErr,
    HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{HomeroomTeacher, Student, Teacher};
use crate::mutate::{self, Batch, BulkData, Change, EditAction};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Clone, Copy)]
enum Collection {
    Students,
    Teachers,
    Homeroom,
}

impl Collection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "students" => Some(Self::Students),
            "teachers" => Some(Self::Teachers),
            "homeroomTeachers" | "homeroom" => Some(Self::Homeroom),
            _ => None,
        }
    }

    fn bulk(self, records: &[Value]) -> BulkData {
        match self {
            Self::Students => BulkData::Students(Batch::decode(records)),
            Self::Teachers => BulkData::Teachers(Batch::decode(records)),
            Self::Homeroom => BulkData::Homeroom(Batch::decode(records)),
        }
    }
}

fn require_collection(req: &Request) -> Result<Collection, HandlerErr> {
    let raw = require_str(req, "collection")?;
    Collection::parse(raw).ok_or_else(|| {
        bad_params(format!(
            "collection must be one of: students, teachers, homeroomTeachers (got {})",
            raw
        ))
    })
}

fn parse_record<T: DeserializeOwned>(req: &Request) -> Result<T, HandlerErr> {
    let Some(raw) = req.params.get("record") else {
        return Err(bad_params("missing record"));
    };
    serde_json::from_value(raw.clone()).map_err(|e| bad_params(format!("invalid record: {}", e)))
}

fn parse_edit<T: DeserializeOwned>(req: &Request, op: &str) -> Result<EditAction<T>, HandlerErr> {
    match op {
        "add" => Ok(EditAction::Add(parse_record(req)?)),
        "update" => Ok(EditAction::Update(parse_record(req)?)),
        "delete" => Ok(EditAction::Delete(require_str(req, "id")?.to_string())),
        _ => Err(bad_params(format!("unknown action: {}", op))),
    }
}

fn committed(state: &mut AppState, change: Change) -> Value {
    let action = change.action.clone();
    let details = change.details.clone();
    commit(state, change);
    json!({
        "action": action,
        "details": details,
        "historyIndex": state.book.cursor(),
    })
}

fn handle_students_list(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::Dashboard)?;
    let class = optional_str(req, "class");
    if let Some(c) = class {
        state.session.require_class(c)?;
    }
    let students: Vec<&Student> = state
        .book
        .current()
        .students
        .iter()
        .filter(|s| class.map_or(true, |c| s.class == c))
        .collect();
    Ok(json!({ "students": students }))
}

fn handle_teachers_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_view(state, View::Dashboard)?;
    Ok(json!({ "teachers": state.book.current().teachers }))
}

fn handle_homeroom_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_view(state, View::Dashboard)?;
    Ok(json!({ "homeroomTeachers": state.book.current().homeroom_teachers }))
}

fn handle_classes_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_view(state, View::Dashboard)?;
    Ok(json!({ "classes": state.book.current().classes() }))
}

fn handle_student_edit(state: &mut AppState, req: &Request, op: &str) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let action = parse_edit::<Student>(req, op)?;
    let change = mutate::apply_student(state.book.current(), action)?;
    Ok(committed(state, change))
}

fn handle_teacher_edit(state: &mut AppState, req: &Request, op: &str) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let action = parse_edit::<Teacher>(req, op)?;
    let change = mutate::apply_teacher(state.book.current(), action)?;
    Ok(committed(state, change))
}

fn handle_homeroom_edit(state: &mut AppState, req: &Request, op: &str) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let action = parse_edit::<HomeroomTeacher>(req, op)?;
    let change = mutate::apply_homeroom(state.book.current(), action)?;
    Ok(committed(state, change))
}

fn handle_students_import_text(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let Some(text) = req.params.get("text").and_then(|v| v.as_str()) else {
        return Err(bad_params("missing text"));
    };
    let change = import::import_students(state.book.current(), text)?;
    let imported = change.snapshot.students.len() - state.book.current().students.len();
    let mut body = committed(state, change);
    body["imported"] = json!(imported);
    Ok(body)
}

fn handle_bulk_replace(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let collection = require_collection(req)?;
    let Some(records) = req.params.get("records").and_then(|v| v.as_array()) else {
        return Err(bad_params("records must be an array"));
    };
    let data = collection.bulk(records);
    let change = mutate::bulk_replace(state.book.current(), data)?;
    Ok(committed(state, change))
}

fn handle_import_file(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::DataManagement)?;
    let collection = require_collection(req)?;
    let in_path = PathBuf::from(require_str(req, "inPath")?);
    let text = std::fs::read_to_string(&in_path).map_err(|e| {
        HandlerErr::new("io_failed", e.to_string())
            .with_details(json!({ "path": in_path.to_string_lossy() }))
    })?;
    let records: Value = serde_json::from_str(&text)
        .map_err(|e| bad_params(format!("file is not valid JSON: {}", e)))?;
    let Some(records) = records.as_array() else {
        return Err(bad_params("file must contain a JSON array of records"));
    };
    let data = collection.bulk(records);
    let label = data.label();
    let count = data.len();
    let mut change = mutate::bulk_replace(state.book.current(), data)?;
    change.action = format!("Upload {}", label);
    change.details = format!(
        "Uploaded {} {} from {}",
        count,
        label.to_lowercase(),
        in_path.to_string_lossy()
    );
    tracing::info!(path = %in_path.to_string_lossy(), count, "imported roster file");
    Ok(committed(state, change))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_students_list(state, req),
        "teachers.list" => handle_teachers_list(state, req),
        "homeroom.list" => handle_homeroom_list(state, req),
        "classes.list" => handle_classes_list(state, req),
        "students.add" => handle_student_edit(state, req, "add"),
        "students.update" => handle_student_edit(state, req, "update"),
        "students.delete" => handle_student_edit(state, req, "delete"),
        "teachers.add" => handle_teacher_edit(state, req, "add"),
        "teachers.update" => handle_teacher_edit(state, req, "update"),
        "teachers.delete" => handle_teacher_edit(state, req, "delete"),
        "homeroom.add" => handle_homeroom_edit(state, req, "add"),
        "homeroom.update" => handle_homeroom_edit(state, req, "update"),
        "homeroom.delete" => handle_homeroom_edit(state, req, "delete"),
        "students.importText" => handle_students_import_text(state, req),
        "roster.bulkReplace" => handle_bulk_replace(state, req),
        "roster.importFile" => handle_import_file(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
