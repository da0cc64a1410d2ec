use crate::backup;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::with_tracker;
use crate::ipc::params::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match get_required_str(&req.params, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e.response(&req.id),
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            let snapshot = t.snapshot();
            let summary = backup::export_snapshot(&snapshot, &out_path)
                .map_err(|e| HandlerErr::new("io_failed", format!("{e:#}")))?;
            log::info!("backup written to {}", summary.path.to_string_lossy());
            Ok(json!({
                "path": summary.path.to_string_lossy(),
                "students": snapshot.estudiantes.len(),
                "records": summary.rows
            }))
        }),
    )
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_path = match get_required_str(&req.params, "inPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e.response(&req.id),
    };
    let snapshot = match backup::import_snapshot(&in_path) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("backup import from {} rejected: {:#}", in_path.to_string_lossy(), e);
            return HandlerErr::new("bad_backup", format!("{e:#}")).response(&req.id);
        }
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            t.import_snapshot(snapshot)?;
            Ok(json!({
                "students": t.roster().len(),
                "records": t.ledger().records().len(),
                "pendingCount": t.ledger().pending_count()
            }))
        }),
    )
}

fn handle_data_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(
        &req.id,
        with_tracker(state, |t| {
            t.clear()?;
            Ok(json!({
                "cleared": true,
                "students": t.roster().len()
            }))
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        "data.clear" => Some(handle_data_clear(state, req)),
        _ => None,
    }
}
