mod test_support;

use serde_json::json;
use test_support::{error_code, request_err, request_ok, spawn_sidecar};

#[test]
fn roles_see_only_their_views() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let e = request_err(&mut stdin, &mut reader, "1", "reports.dashboard", json!({}));
    assert_eq!(error_code(&e), "not_authenticated");
    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "subjects.add",
        json!({ "name": "Mantiq" }),
    );
    assert_eq!(error_code(&e), "not_authenticated");

    let options = request_ok(&mut stdin, &mut reader, "3", "auth.options", json!({}));
    assert_eq!(options["teachers"], json!([]));

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "auth.login",
        json!({ "role": "admin" }),
    );
    assert_eq!(login["user"]["role"], "admin");
    assert_eq!(login["view"], "Dashboard");
    assert_eq!(
        login["views"],
        json!(["Dashboard", "Summary", "ReportCard", "DataManagement", "History"])
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "roster.bulkReplace",
        json!({
            "collection": "teachers",
            "records": [{ "id": "T-1", "name": "Ustadz Hasan", "subjects": ["Nahwu"] }]
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "homeroom.add",
        json!({ "record": { "name": "Ustadzah Siti", "class": "1A" } }),
    );

    let nav = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "view.navigate",
        json!({ "view": "History" }),
    );
    assert_eq!(nav["view"], "History");
    let e = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "view.navigate",
        json!({ "view": "GradeInput" }),
    );
    assert_eq!(error_code(&e), "forbidden");
    let who = request_ok(&mut stdin, &mut reader, "9", "auth.whoami", json!({}));
    assert_eq!(who["view"], "History");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "auth.login",
        json!({ "role": "teacher", "teacherId": "T-1" }),
    );
    let views = request_ok(&mut stdin, &mut reader, "11", "view.list", json!({}));
    assert_eq!(
        views["views"],
        json!(["Dashboard", "GradeInput", "Summary", "ReportCard"])
    );
    assert_eq!(views["current"], "Dashboard");
    let e = request_err(
        &mut stdin,
        &mut reader,
        "12",
        "subjects.add",
        json!({ "name": "Mantiq" }),
    );
    assert_eq!(error_code(&e), "forbidden");
    let e = request_err(&mut stdin, &mut reader, "13", "history.log", json!({}));
    assert_eq!(error_code(&e), "forbidden");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "14",
        "auth.login",
        json!({ "role": "homeroom", "class": "1A" }),
    );
    let e = request_err(&mut stdin, &mut reader, "15", "history.undo", json!({}));
    assert_eq!(error_code(&e), "forbidden");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "16",
        "auth.login",
        json!({ "role": "teacher", "teacherId": "T-missing" }),
    );
    assert_eq!(error_code(&e), "not_found");

    let _ = request_ok(&mut stdin, &mut reader, "17", "auth.logout", json!({}));
    let who = request_ok(&mut stdin, &mut reader, "18", "auth.whoami", json!({}));
    assert!(who["user"].is_null());
}
