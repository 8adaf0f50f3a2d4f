mod test_support;

use serde_json::json;
use test_support::{error_code, login_admin, request_err, request_ok, spawn_sidecar};

#[test]
fn second_save_for_same_key_replaces_score() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    login_admin(&mut stdin, &mut reader);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "subjects.add",
        json!({ "name": "Matematika" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.bulkReplace",
        json!({
            "collection": "teachers",
            "records": [
                { "id": "T-mtk", "name": "Pak Rahman", "subjects": ["Matematika"] },
                { "id": "T-nhw", "name": "Ustadz Hasan", "subjects": ["Nahwu"] }
            ]
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.importText",
        json!({ "text": "Ahmad\tS001\t1A\tL\nFatimah\tS002\t1A\tP" }),
    );

    // Admins manage data but do not enter grades.
    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "grades.save",
        json!({ "subject": "Matematika", "class": "1A", "semester": 1,
                "grades": [{ "studentId": "S001", "score": 70 }] }),
    );
    assert_eq!(error_code(&e), "forbidden");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "auth.login",
        json!({ "role": "teacher", "teacherId": "T-mtk" }),
    );
    for (id, score) in [("6", 70), ("7", 95)] {
        let res = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "grades.save",
            json!({ "subject": "Matematika", "class": "1A", "semester": 1,
                    "grades": [{ "studentId": "S001", "score": score }] }),
        );
        assert_eq!(res["saved"], 1);
    }

    let list = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "grades.list",
        json!({ "class": "1A", "subject": "Matematika", "semester": 1 }),
    );
    let rows = list["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["studentId"], "S001");
    assert_eq!(rows[0]["score"], 95);
    assert!(rows[1]["score"].is_null());

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "reports.summary",
        json!({ "subject": "Matematika" }),
    );
    let rows = summary["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["teacherName"], "Pak Rahman");
}

#[test]
fn invalid_scores_and_foreign_subjects_are_rejected() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    login_admin(&mut stdin, &mut reader);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.bulkReplace",
        json!({
            "collection": "teachers",
            "records": [{ "id": "T-nhw", "name": "Ustadz Hasan", "subjects": ["Nahwu"] }]
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "role": "teacher", "teacherId": "T-nhw" }),
    );

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "grades.save",
        json!({ "subject": "Nahwu", "class": "1A", "semester": 1,
                "grades": [{ "studentId": "S001", "score": 101 }] }),
    );
    assert_eq!(error_code(&e), "score_out_of_range");
    assert_eq!(e["details"]["score"], 101);

    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "grades.save",
        json!({ "subject": "Nahwu", "class": "1A", "semester": 1,
                "grades": [{ "studentId": "S001", "score": "tinggi" }] }),
    );
    assert_eq!(error_code(&e), "score_out_of_range");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "grades.save",
        json!({ "subject": "Nahwu", "class": "1A", "semester": 3,
                "grades": [{ "studentId": "S001", "score": 80 }] }),
    );
    assert_eq!(error_code(&e), "bad_params");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "grades.save",
        json!({ "subject": "Fiqih", "class": "1A", "semester": 1,
                "grades": [{ "studentId": "S001", "score": 80 }] }),
    );
    assert_eq!(error_code(&e), "forbidden");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "grades.save",
        json!({ "subject": "Nahwu", "class": "1A", "semester": 1, "grades": [] }),
    );
    assert_eq!(error_code(&e), "bad_params");

    let status = request_ok(&mut stdin, &mut reader, "8", "history.status", json!({}));
    assert_eq!(status["depth"], 2);
}

#[test]
fn grades_follow_the_roster_class() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    login_admin(&mut stdin, &mut reader);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.bulkReplace",
        json!({
            "collection": "teachers",
            "records": [{ "id": "T-fqh", "name": "Ustadz Hasan", "subjects": ["Fiqih"] }]
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.importText",
        json!({ "text": "Ahmad\tS001\t1A\tL" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "role": "teacher", "teacherId": "T-fqh" }),
    );

    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "grades.save",
        json!({ "subject": "Fiqih", "class": "1A", "semester": 1,
                "grades": [
                    { "studentId": "GHOST", "score": 90 },
                    { "studentId": "S001", "score": 80 }
                ] }),
    );
    assert_eq!(error_code(&e), "not_found");
    assert_eq!(e["details"]["studentId"], "GHOST");

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "grades.save",
        json!({ "subject": "Fiqih", "class": "1A", "semester": 1,
                "grades": [{ "studentId": "S001", "class": "9Z", "score": 80 }] }),
    );
    assert_eq!(res["saved"], 1);

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "reports.summary",
        json!({ "subject": "Fiqih" }),
    );
    let rows = summary["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["class"], "1A");

    let ledger = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "reports.ledger",
        json!({ "class": "1A", "semester": 1 }),
    );
    let row = &ledger["ledger"]["rows"][0];
    assert_eq!(row["total"], 80);
    assert_eq!(row["missingSubjects"], json!([]));
}
