use crate::access::{Role, User, View};
use crate::ipc::helpers::{
    bad_params, commit, parse_semester, require_str, require_view, respond, semester_or_default,
    HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{DataSnapshot, Grade, Score, Semester, SCORE_MAX};
use crate::mutate;
use serde_json::{json, Value};

/// Subjects the user may grade, read from the current roster so renames
/// made after login are honoured.
fn gradable_subjects(snapshot: &DataSnapshot, user: &User) -> Vec<String> {
    match &user.role {
        Role::Teacher { subjects } => snapshot
            .teacher(&user.id)
            .map(|t| t.subjects.clone())
            .unwrap_or_else(|| subjects.clone()),
        _ => Vec::new(),
    }
}

fn require_subject(snapshot: &DataSnapshot, user: &User, subject: &str) -> Result<(), HandlerErr> {
    if gradable_subjects(snapshot, user).iter().any(|s| s == subject) {
        return Ok(());
    }
    Err(HandlerErr::new(
        "forbidden",
        format!("{} does not teach {}", user.name, subject),
    )
    .with_details(json!({ "subject": subject })))
}

fn handle_grades_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let user = require_view(state, View::GradeInput)?;
    let class = require_str(req, "class")?;
    let subject = require_str(req, "subject")?;
    let semester = semester_or_default(state, req)?;
    let snap = state.book.current();
    require_subject(snap, &user, subject)?;

    let rows: Vec<Value> = snap
        .students
        .iter()
        .filter(|s| s.class == class)
        .map(|s| {
            let score = snap
                .grades
                .iter()
                .find(|g| {
                    g.student_id == s.student_id && g.subject == subject && g.semester == semester
                })
                .map(|g| g.score.value());
            json!({
                "studentId": s.student_id,
                "name": s.name,
                "score": score,
            })
        })
        .collect();
    Ok(json!({
        "class": class,
        "subject": subject,
        "semester": semester,
        "rows": rows,
    }))
}

fn parse_score(raw: Option<&Value>, student_id: &str) -> Result<Score, HandlerErr> {
    let Some(raw) = raw else {
        return Err(bad_params(format!("missing score for {}", student_id)));
    };
    let out_of_range = || {
        HandlerErr::new(
            "score_out_of_range",
            format!("score must be an integer between 0 and {}", SCORE_MAX),
        )
        .with_details(json!({ "studentId": student_id, "score": raw }))
    };
    let n = raw.as_i64().ok_or_else(out_of_range)?;
    Score::try_from(n).map_err(|_| out_of_range())
}

/// Builds grade records from the request. Per-record `subject` and
/// `semester` fall back to the request-level values; the class is filled in
/// from the roster when the grades are saved.
fn parse_grades(
    req: &Request,
    subject: &str,
    semester: Semester,
    teacher_id: &str,
) -> Result<Vec<Grade>, HandlerErr> {
    let Some(items) = req.params.get("grades").and_then(|v| v.as_array()) else {
        return Err(bad_params("grades must be an array"));
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let Some(student_id) = item.get("studentId").and_then(|v| v.as_str()) else {
            return Err(bad_params("each grade needs a studentId"));
        };
        let semester = match item.get("semester") {
            Some(v) => parse_semester(v)?,
            None => semester,
        };
        let str_or = |key: &str, fallback: &str| {
            item.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or(fallback)
                .trim()
                .to_string()
        };
        out.push(Grade {
            student_id: student_id.trim().to_string(),
            subject: str_or("subject", subject),
            teacher_id: teacher_id.to_string(),
            class: String::new(),
            semester,
            score: parse_score(item.get("score"), student_id)?,
        });
    }
    Ok(out)
}

fn handle_grades_save(state: &mut AppState, req: &Request) -> HandlerResult {
    let user = require_view(state, View::GradeInput)?;
    let subject = require_str(req, "subject")?;
    let class = require_str(req, "class")?;
    let semester = semester_or_default(state, req)?;
    let grades = parse_grades(req, subject, semester, &user.id)?;
    for g in &grades {
        require_subject(state.book.current(), &user, &g.subject)?;
    }
    let count = grades.len();
    let change = mutate::save_grades(state.book.current(), grades, subject, class)?;
    commit(state, change);
    Ok(json!({
        "saved": count,
        "historyIndex": state.book.cursor(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "grades.list" => handle_grades_list(state, req),
        "grades.save" => handle_grades_save(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
