use crate::ipc::error::respond;
use crate::ipc::handlers::with_tracker;
use crate::ipc::types::{AppState, Request};
use crate::sync::Trigger;
use serde_json::json;

/// Runs on the IPC thread; the scheduler may be mid-attempt, in which case
/// this one is skipped rather than queued.
fn handle_sync_now(state: &mut AppState, req: &Request) -> serde_json::Value {
    let outcome = state.syncer.run(Trigger::Manual);
    respond(
        &req.id,
        with_tracker(state, |t| {
            let mut result = serde_json::to_value(&outcome)
                .unwrap_or_else(|_| json!({ "outcome": "unknown" }));
            result["pendingCount"] = json!(t.ledger().pending_count());
            result["lastSync"] = json!(t.last_sync());
            Ok(result)
        }),
    )
}

fn handle_sync_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_flight = state.syncer.in_flight();
    respond(
        &req.id,
        with_tracker(state, |t| {
            Ok(json!({
                "pendingCount": t.ledger().pending_count(),
                "lastSync": t.last_sync(),
                "inFlight": in_flight,
                "autoSync": t.config().auto_sync,
                "configured": t.config().has_sheet()
            }))
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "sync.now" => Some(handle_sync_now(state, req)),
        "sync.status" => Some(handle_sync_status(state, req)),
        _ => None,
    }
}
