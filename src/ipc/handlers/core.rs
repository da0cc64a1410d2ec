use crate::ipc::error::{err, ok, respond};
use crate::ipc::handlers::with_tracker;
use crate::ipc::types::{AppState, Request};
use crate::sync::lock_tracker;
use crate::tracker::Tracker;
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "nfc": state.reader.available(),
            "syncInFlight": state.syncer.in_flight(),
            "loggedIn": state.session.is_some()
        }),
    )
}

/// Open (or create) the workspace at `path` and make it the active one.
pub fn select_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let tracker = Tracker::open(path)?;
    *lock_tracker(&state.tracker) = Some(tracker);
    state.workspace = Some(path.to_path_buf());
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match select_workspace(state, &path) {
        Ok(()) => ok(&req.id, json!({ "workspacePath": path.to_string_lossy() })),
        Err(e) => {
            log::error!("failed to open workspace {}: {:#}", path.to_string_lossy(), e);
            err(&req.id, "db_open_failed", format!("{e:#}"), None)
        }
    }
}

fn handle_notices_drain(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(
        &req.id,
        with_tracker(state, |t| Ok(json!({ "notices": t.drain_notices() }))),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "notices.drain" => Some(handle_notices_drain(state, req)),
        _ => None,
    }
}
