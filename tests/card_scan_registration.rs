mod test_support;

use serde_json::json;
use test_support::{error_code, request, request_ok, spawn_sidecar, temp_dir};

#[test]
fn scanned_card_registers_unknown_student_then_confirms() {
    let workspace = temp_dir("asistencia-card-scan");
    let empty_backup = workspace.join("empty.json");
    std::fs::write(&empty_backup, r#"{"estudiantes": [], "registros": []}"#).expect("write backup");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "backup.import",
        json!({ "inPath": empty_backup.to_string_lossy() }),
    );
    assert_eq!(imported["students"].as_u64(), Some(0));

    let payload = json!({
        "matricula": "20240001",
        "nombre": "Juan Pérez",
        "grado": "10",
        "grupo": "A"
    })
    .to_string();
    let scan = request(
        &mut stdin,
        &mut reader,
        "3",
        "card.scan",
        json!({ "records": ["not a student", payload] }),
    );
    assert_eq!(scan["ok"].as_bool(), Some(true), "{}", scan);
    assert_eq!(scan["result"]["detected"].as_bool(), Some(true));
    assert_eq!(scan["result"]["newStudent"].as_bool(), Some(true));
    assert_eq!(scan["result"]["student"]["nombre"].as_str(), Some("Juan Pérez"));
    let kinds: Vec<&str> = scan["notices"]
        .as_array()
        .expect("notices")
        .iter()
        .filter_map(|n| n["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"student_added"), "{:?}", kinds);

    let listed = request_ok(&mut stdin, &mut reader, "4", "students.list", json!({}));
    assert_eq!(listed["count"].as_u64(), Some(1));
    assert_eq!(listed["students"][0]["matricula"].as_str(), Some("20240001"));
    assert!(listed["students"][0]["fechaRegistro"].as_str().is_some());

    let again = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "card.scan",
        json!({ "payload": "20240001:Juan Pérez:10:A" }),
    );
    assert_eq!(again["newStudent"].as_bool(), Some(false));

    let confirmed = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "attendance.confirm",
        json!({ "estado": "Tardanza", "clase": "Math101" }),
    );
    assert_eq!(confirmed["record"]["estado"].as_str(), Some("Tardanza"));
    assert_eq!(confirmed["record"]["clase"].as_str(), Some("Math101"));
    assert_eq!(confirmed["record"]["sincronizado"].as_bool(), Some(false));
    assert_eq!(confirmed["pendingCount"].as_u64(), Some(1));
    assert_eq!(confirmed["playSound"].as_bool(), Some(true));

    let twice = request(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.confirm",
        json!({ "estado": "Presente", "clase": "Math101" }),
    );
    assert_eq!(error_code(&twice), Some("no_current_student"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn unreadable_cards_are_ignored_without_error() {
    let workspace = temp_dir("asistencia-card-garbage");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let scan = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "card.scan",
        json!({ "records": ["hello", "a:b:c", [255, 254]] }),
    );
    assert_eq!(scan["detected"].as_bool(), Some(false));
    let listed = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));
    assert_eq!(listed["count"].as_u64(), Some(3));

    let bad = request(&mut stdin, &mut reader, "4", "card.scan", json!({ "records": [[300]] }));
    assert_eq!(error_code(&bad), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn missing_reader_degrades_to_a_simulated_read() {
    let workspace = temp_dir("asistencia-card-simulated");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let caps = request_ok(&mut stdin, &mut reader, "2", "card.capabilities", json!({}));
    assert_eq!(caps["mode"].as_str(), Some("simulation"));

    let started = request(&mut stdin, &mut reader, "3", "card.start", json!({}));
    assert_eq!(started["ok"].as_bool(), Some(true), "{}", started);
    assert_eq!(started["result"]["simulated"].as_bool(), Some(true));
    let drawn = started["result"]["student"]["matricula"]
        .as_str()
        .expect("simulated student")
        .to_string();
    assert!(drawn.starts_with("2024000"), "{}", drawn);

    request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "session.login",
        json!({ "username": "admin", "password": "admin123", "clase": "Math101" }),
    );
    let confirmed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.confirm",
        json!({ "estado": "Presente" }),
    );
    assert_eq!(confirmed["record"]["matricula"].as_str(), Some(drawn.as_str()));
    assert_eq!(confirmed["record"]["clase"].as_str(), Some("Math101"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
