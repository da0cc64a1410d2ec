use crate::error::TrackerError;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::with_tracker;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(
        &req.id,
        with_tracker(state, |t| Ok(json!({ "config": t.config() }))),
    )
}

fn handle_config_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return HandlerErr::new("bad_params", "patch must be an object").response(&req.id);
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            let cfg = t.update_config(patch)?;
            log::info!("config updated: {:?}", patch.keys().collect::<Vec<_>>());
            Ok(json!({ "config": cfg }))
        }),
    )
}

/// The remote check itself is not part of this service; only the local
/// precondition (a configured sheet) is verified.
fn handle_sheets_test(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(
        &req.id,
        with_tracker(state, |t| {
            if !t.config().has_sheet() {
                return Err(TrackerError::NotConfigured("sheetId").into());
            }
            Ok(json!({
                "ok": true,
                "sheetId": t.config().sheet_id,
                "sheetName": t.config().sheet_name,
                "testedAt": chrono::Utc::now().to_rfc3339()
            }))
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "config.get" => Some(handle_config_get(state, req)),
        "config.update" => Some(handle_config_update(state, req)),
        "sheets.test" => Some(handle_sheets_test(state, req)),
        _ => None,
    }
}
