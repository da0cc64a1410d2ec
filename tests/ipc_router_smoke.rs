mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{error_code, request, spawn_sidecar, temp_dir};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("asistencia-router-smoke");
    let csv_out = workspace.join("smoke-export.csv");
    let backup_out = workspace.join("smoke-backup.json");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let before = request(&mut stdin, &mut reader, "0", "students.list", json!({}));
    assert_eq!(error_code(&before), Some("no_workspace"));

    let calls: Vec<(&str, serde_json::Value)> = vec![
        ("health", json!({})),
        ("workspace.select", json!({ "path": workspace.to_string_lossy() })),
        (
            "session.login",
            json!({ "username": "admin", "password": "admin123", "clase": "Math101" }),
        ),
        ("session.get", json!({})),
        ("session.setClass", json!({ "clase": "Science202" })),
        ("config.get", json!({})),
        (
            "config.update",
            json!({ "patch": {
                "institution": "Smoke School",
                "sheetId": "smoke-sheet",
                "syncUrl": "http://127.0.0.1:1/sync",
                "autoSync": false
            } }),
        ),
        ("sheets.test", json!({})),
        ("students.list", json!({})),
        ("students.search", json!({ "query": "garc" })),
        (
            "students.create",
            json!({ "matricula": "20245555", "nombre": "Smoke Kid", "grado": "8", "grupo": "D" }),
        ),
        ("students.update", json!({ "matricula": "20245555", "patch": { "grupo": "E" } })),
        ("students.register", json!({ "matricula": "20245555" })),
        ("card.capabilities", json!({})),
        ("card.start", json!({})),
        ("card.simulate", json!({})),
        ("card.scan", json!({ "records": ["20246666:Scan Kid:7:F"] })),
        ("attendance.confirm", json!({ "estado": "Presente" })),
        ("attendance.cancel", json!({})),
        ("attendance.list", json!({ "limit": 10 })),
        ("attendance.pending", json!({})),
        ("attendance.exportCsv", json!({ "outPath": csv_out.to_string_lossy() })),
        ("sync.status", json!({})),
        ("sync.now", json!({})),
        ("stats.dashboard", json!({})),
        ("stats.week", json!({})),
        ("stats.summary", json!({})),
        ("reports.daily", json!({})),
        ("notices.drain", json!({})),
        ("backup.export", json!({ "outPath": backup_out.to_string_lossy() })),
        ("backup.import", json!({ "inPath": backup_out.to_string_lossy() })),
        ("attendance.delete", json!({ "id": 1 })),
        ("data.clear", json!({})),
        ("session.logout", json!({})),
    ];
    for (i, (method, params)) in calls.into_iter().enumerate() {
        let id = format!("{}", i + 1);
        let resp = request(&mut stdin, &mut reader, &id, method, params);
        assert_eq!(
            resp.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            resp
        );
    }

    let unknown = request(&mut stdin, &mut reader, "99", "classes.list", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_lines_get_bad_json_and_the_loop_continues() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(error_code(&value), Some("bad_json"));

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health.get("ok").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(health["result"]["nfc"].as_bool(), Some(false));

    drop(stdin);
    let _ = child.wait();
}
