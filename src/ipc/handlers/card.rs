use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::with_tracker;
use crate::ipc::types::{AppState, Request};
use crate::tracker::NoticeLevel;
use serde_json::{json, Value};

fn mode(state: &AppState) -> &'static str {
    if state.reader.available() {
        "device"
    } else {
        "simulation"
    }
}

/// Card records arrive as text, or as byte arrays for raw tag payloads.
fn read_card_records(params: &Value) -> Result<Vec<Vec<u8>>, HandlerErr> {
    if let Some(payload) = params.get("payload").and_then(|v| v.as_str()) {
        return Ok(vec![payload.as_bytes().to_vec()]);
    }
    let Some(records) = params.get("records").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::new("bad_params", "missing records or payload"));
    };
    records
        .iter()
        .map(|r| match r {
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            Value::Array(bytes) => bytes
                .iter()
                .map(|b| b.as_u64().filter(|n| *n <= 255).map(|n| n as u8))
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| HandlerErr::new("bad_params", "record bytes must be 0..=255")),
            // A structured record that is already JSON.
            Value::Object(_) => Ok(r.to_string().into_bytes()),
            _ => Err(HandlerErr::new(
                "bad_params",
                "records must be strings, byte arrays or objects",
            )),
        })
        .collect()
}

fn handle_card_capabilities(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(
        &req.id,
        Ok(json!({ "nfc": state.reader.available(), "mode": mode(state) })),
    )
}

/// With a reader attached the UI starts listening; without one a simulated
/// read is drawn from the roster instead.
fn handle_card_start(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.reader.available() {
        return respond(&req.id, Ok(json!({ "mode": "device", "ready": true })));
    }
    respond(
        &req.id,
        with_tracker(state, |t| {
            t.notify(
                NoticeLevel::Error,
                "nfc_unavailable",
                "NFC is not available on this device",
            );
            let student = t.simulate_card();
            Ok(json!({
                "mode": "simulation",
                "ready": true,
                "student": student,
                "simulated": true
            }))
        }),
    )
}

fn handle_card_scan(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match read_card_records(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    respond(
        &req.id,
        with_tracker(state, |t| match t.scan_card(&records)? {
            Some(outcome) => Ok(json!({
                "detected": true,
                "student": outcome.identity,
                "newStudent": outcome.new_student
            })),
            None => Ok(json!({ "detected": false })),
        }),
    )
}

fn handle_card_simulate(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(
        &req.id,
        with_tracker(state, |t| {
            if t.roster().is_empty() {
                return Err(HandlerErr::new("no_data", "the roster is empty"));
            }
            let student = t.simulate_card();
            Ok(json!({
                "detected": student.is_some(),
                "student": student,
                "simulated": true
            }))
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "card.capabilities" => Some(handle_card_capabilities(state, req)),
        "card.start" => Some(handle_card_start(state, req)),
        "card.scan" => Some(handle_card_scan(state, req)),
        "card.simulate" => Some(handle_card_simulate(state, req)),
        _ => None,
    }
}
