mod test_support;

use serde_json::json;
use test_support::{login_admin, request_ok, spawn_sidecar};

fn actions(log: &serde_json::Value) -> Vec<String> {
    log["entries"]
        .as_array()
        .expect("entries")
        .iter()
        .map(|e| e["action"].as_str().expect("action").to_string())
        .collect()
}

#[test]
fn undo_redo_moves_cursor_and_audits_only_real_moves() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    login_admin(&mut stdin, &mut reader);

    let status = request_ok(&mut stdin, &mut reader, "1", "history.status", json!({}));
    assert_eq!(status["depth"], 1);
    assert_eq!(status["canUndo"], false);

    let undo = request_ok(&mut stdin, &mut reader, "2", "history.undo", json!({}));
    assert_eq!(undo["changed"], false);

    for (i, name) in ["Balaghah", "Mantiq"].iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("add-{}", i),
            "subjects.add",
            json!({ "name": name }),
        );
    }

    let undo = request_ok(&mut stdin, &mut reader, "3", "history.undo", json!({}));
    assert_eq!(undo["changed"], true);
    assert_eq!(undo["cursor"], 1);
    assert_eq!(undo["canRedo"], true);
    let list = request_ok(&mut stdin, &mut reader, "4", "subjects.list", json!({}));
    let subjects = list["subjects"].as_array().expect("subjects");
    assert!(subjects.contains(&json!("Balaghah")));
    assert!(!subjects.contains(&json!("Mantiq")));

    let redo = request_ok(&mut stdin, &mut reader, "5", "history.redo", json!({}));
    assert_eq!(redo["changed"], true);
    assert_eq!(redo["cursor"], 2);
    let redo = request_ok(&mut stdin, &mut reader, "6", "history.redo", json!({}));
    assert_eq!(redo["changed"], false);

    // A new change after undo drops the redo branch.
    let _ = request_ok(&mut stdin, &mut reader, "7", "history.undo", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "subjects.add",
        json!({ "name": "Ushul Fiqih" }),
    );
    let status = request_ok(&mut stdin, &mut reader, "9", "history.status", json!({}));
    assert_eq!(status["depth"], 3);
    assert_eq!(status["canRedo"], false);
    let redo = request_ok(&mut stdin, &mut reader, "10", "history.redo", json!({}));
    assert_eq!(redo["changed"], false);

    let log = request_ok(&mut stdin, &mut reader, "11", "history.log", json!({}));
    assert_eq!(
        actions(&log),
        vec!["Add Subject", "Undo", "Redo", "Undo", "Add Subject", "Add Subject"]
    );
    assert_eq!(log["entries"][0]["user"], "Administrator");
    assert_eq!(log["entries"][0]["details"], "Added subject: Ushul Fiqih");

    let limited = request_ok(
        &mut stdin,
        &mut reader,
        "12",
        "history.log",
        json!({ "limit": 2 }),
    );
    assert_eq!(limited["total"], 6);
    assert_eq!(actions(&limited).len(), 2);
}
