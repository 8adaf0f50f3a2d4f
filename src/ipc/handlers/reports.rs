use super::setup::{average_decimals, school_profile};
use crate::access::{Role, View};
use crate::ipc::helpers::{
    optional_semester, optional_str, require_str, require_view, respond, semester_or_default,
    HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::ledger;
use crate::summary::{self, SummaryFilter};
use serde_json::json;

fn handle_dashboard(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_view(state, View::Dashboard)?;
    Ok(json!(summary::dashboard(state.book.current())))
}

fn handle_summary(state: &mut AppState, req: &Request) -> HandlerResult {
    let user = require_view(state, View::Summary)?;
    let mut filter = SummaryFilter {
        class: optional_str(req, "class").map(str::to_string),
        subject: optional_str(req, "subject").map(str::to_string),
        semester: optional_semester(req)?,
    };
    if let Role::Homeroom { class } = &user.role {
        if let Some(c) = filter.class.as_deref() {
            state.session.require_class(c)?;
        }
        filter.class.get_or_insert_with(|| class.clone());
    }
    let rows = summary::grade_summary(state.book.current(), &filter);
    Ok(json!({ "rows": rows }))
}

fn handle_report_card(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::ReportCard)?;
    let student_id = require_str(req, "studentId")?;
    let semester = semester_or_default(state, req)?;
    let snap = state.book.current();
    let Some(student) = snap.student_by_registration(student_id) else {
        return Err(HandlerErr::new("not_found", "student not found")
            .with_details(json!({ "studentId": student_id })));
    };
    state.session.require_class(&student.class)?;
    let card = summary::report_card(snap, student, semester);
    let decimals = average_decimals(state);
    Ok(json!({
        "school": school_profile(state),
        "card": card,
        "table": card.to_table(decimals),
    }))
}

fn handle_class_report_cards(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::ReportCard)?;
    let class = require_str(req, "class")?;
    let semester = semester_or_default(state, req)?;
    state.session.require_class(class)?;
    let cards = summary::class_report_cards(state.book.current(), class, semester);
    if cards.is_empty() {
        return Err(HandlerErr::new("empty_class", "class has no students")
            .with_details(json!({ "class": class })));
    }
    let decimals = average_decimals(state);
    let items: Vec<serde_json::Value> = cards
        .iter()
        .map(|c| json!({ "card": c, "table": c.to_table(decimals) }))
        .collect();
    Ok(json!({
        "school": school_profile(state),
        "class": class,
        "semester": semester,
        "cards": items,
    }))
}

fn handle_ledger(state: &mut AppState, req: &Request) -> HandlerResult {
    require_view(state, View::ReportCard)?;
    let class = require_str(req, "class")?;
    let semester = semester_or_default(state, req)?;
    state.session.require_class(class)?;
    let model = ledger::build_ledger(state.book.current(), class, semester);
    let table = model.to_table(average_decimals(state));
    Ok(json!({
        "ledger": model,
        "table": table,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "reports.dashboard" => handle_dashboard(state, req),
        "reports.summary" => handle_summary(state, req),
        "reports.reportCard" => handle_report_card(state, req),
        "reports.classReportCards" => handle_class_report_cards(state, req),
        "reports.ledger" => handle_ledger(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
