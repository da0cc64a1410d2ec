use crate::backup;
use crate::error::TrackerError;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::with_tracker;
use crate::ipc::params::{
    get_optional_date, get_optional_str, get_optional_usize, get_required_i64, get_required_str,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceRecord, AttendanceStatus};
use crate::sync::Trigger;
use serde_json::json;
use std::path::PathBuf;

const MAX_LIST: usize = 10_000;

fn handle_attendance_confirm(state: &mut AppState, req: &Request) -> serde_json::Value {
    let status = match get_required_str(&req.params, "estado").and_then(|s| {
        s.parse::<AttendanceStatus>()
            .map_err(|m| {
                let allowed: Vec<&str> =
                    AttendanceStatus::ALL.iter().map(|s| s.as_str()).collect();
                HandlerErr::new("bad_params", m).with_details(json!({ "allowed": allowed }))
            })
    }) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let explicit = match get_optional_str(&req.params, "clase") {
        Ok(v) => v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        Err(e) => return e.response(&req.id),
    };
    let session_class = state.session.as_ref().map(|s| s.clase.clone());
    let Some(clase) = explicit.or(session_class) else {
        return HandlerErr::new("bad_params", "missing clase (log in or pass clase)")
            .response(&req.id);
    };

    let mut auto_sync = false;
    let resp = respond(
        &req.id,
        with_tracker(state, |t| {
            let record = t.confirm_attendance(status, &clase)?;
            auto_sync = t.config().auto_sync;
            Ok(json!({
                "record": record,
                "playSound": t.config().notify_sound,
                "pendingCount": t.ledger().pending_count()
            }))
        }),
    );
    if auto_sync {
        if let Some(scheduler) = state.scheduler.as_ref() {
            scheduler.nudge(Trigger::AfterRecord);
        }
    }
    resp
}

fn handle_attendance_cancel(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(
        &req.id,
        with_tracker(state, |t| {
            let student = t.current().cloned();
            Ok(json!({ "cancelled": t.cancel_current(), "student": student }))
        }),
    )
}

fn handle_attendance_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match get_required_i64(&req.params, "id") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            let deleted = t.delete_record(id)?;
            Ok(json!({
                "deleted": deleted,
                "pendingCount": t.ledger().pending_count()
            }))
        }),
    )
}

/// Newest first, optionally restricted to one date.
fn handle_attendance_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let limit = match get_optional_usize(&req.params, "limit", MAX_LIST) {
        Ok(v) => v.unwrap_or(MAX_LIST),
        Err(e) => return e.response(&req.id),
    };
    let date = match get_optional_date(&req.params, "date") {
        Ok(v) => v.map(|d| d.format("%Y-%m-%d").to_string()),
        Err(e) => return e.response(&req.id),
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            let records: Vec<&AttendanceRecord> = t
                .ledger()
                .records()
                .iter()
                .filter(|r| date.as_deref().map_or(true, |d| r.fecha == d))
                .take(limit)
                .collect();
            Ok(json!({
                "records": records,
                "total": t.ledger().records().len()
            }))
        }),
    )
}

fn handle_attendance_pending(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(
        &req.id,
        with_tracker(state, |t| {
            let batch = t.pending_batch();
            Ok(json!({ "pendingCount": batch.len(), "records": batch }))
        }),
    )
}

fn handle_attendance_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match get_required_str(&req.params, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e.response(&req.id),
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            let records = t.ledger().records();
            if records.is_empty() {
                return Err(TrackerError::NoData.into());
            }
            let summary = backup::export_history_csv(records, &out_path)
                .map_err(|e| HandlerErr::new("io_failed", format!("{e:#}")))?;
            log::info!(
                "exported {} records to {}",
                summary.rows,
                summary.path.to_string_lossy()
            );
            Ok(json!({
                "path": summary.path.to_string_lossy(),
                "rowsExported": summary.rows
            }))
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.confirm" => Some(handle_attendance_confirm(state, req)),
        "attendance.cancel" => Some(handle_attendance_cancel(state, req)),
        "attendance.delete" => Some(handle_attendance_delete(state, req)),
        "attendance.list" => Some(handle_attendance_list(state, req)),
        "attendance.pending" => Some(handle_attendance_pending(state, req)),
        "attendance.exportCsv" => Some(handle_attendance_export_csv(state, req)),
        _ => None,
    }
}
