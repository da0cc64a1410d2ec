use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::with_tracker;
use crate::ipc::params::get_optional_date;
use crate::ipc::types::{AppState, Request};
use crate::model::AttendanceStatus;
use crate::stats::{presence_series, StatusCounts};
use chrono::{Local, NaiveDate};
use serde_json::json;

const RECENT_ON_DASHBOARD: usize = 5;
const WEEK_DAYS: u32 = 7;

fn date_or_today(req: &Request) -> Result<NaiveDate, HandlerErr> {
    Ok(get_optional_date(&req.params, "date")?.unwrap_or_else(|| Local::now().date_naive()))
}

fn counts_json(counts: &StatusCounts) -> serde_json::Value {
    let by_status: serde_json::Map<String, serde_json::Value> = AttendanceStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), json!(counts.get(*s))))
        .collect();
    json!({
        "byStatus": by_status,
        "presente": counts.presente,
        "tardanza": counts.tardanza,
        "falta": counts.falta,
        "total": counts.total(),
        "attendanceRate": counts.attendance_rate()
    })
}

fn handle_stats_dashboard(state: &mut AppState, req: &Request) -> serde_json::Value {
    let date = match date_or_today(req) {
        Ok(d) => d.format("%Y-%m-%d").to_string(),
        Err(e) => return e.response(&req.id),
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            let ledger = t.ledger();
            let today = StatusCounts::tally(&ledger.records_on(&date));
            Ok(json!({
                "date": date,
                "totalStudents": t.roster().len(),
                "presentes": today.presente,
                "tardanzas": today.tardanza,
                "faltas": today.falta,
                "pendingCount": ledger.pending_count(),
                "recent": ledger.recent(RECENT_ON_DASHBOARD)
            }))
        }),
    )
}

fn handle_stats_week(state: &mut AppState, req: &Request) -> serde_json::Value {
    let end = match date_or_today(req) {
        Ok(d) => d,
        Err(e) => return e.response(&req.id),
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            let series = presence_series(t.ledger().records(), end, WEEK_DAYS)
                .ok_or_else(|| HandlerErr::new("bad_params", "date is out of range"))?;
            Ok(json!({ "days": series }))
        }),
    )
}

fn handle_stats_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(
        &req.id,
        with_tracker(state, |t| {
            let counts = StatusCounts::tally(t.ledger().records());
            let mut out = counts_json(&counts);
            out["totalStudents"] = json!(t.roster().len());
            Ok(out)
        }),
    )
}

fn handle_reports_daily(state: &mut AppState, req: &Request) -> serde_json::Value {
    let date = match date_or_today(req) {
        Ok(d) => d.format("%Y-%m-%d").to_string(),
        Err(e) => return e.response(&req.id),
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            let records = t.ledger().records_on(&date);
            let mut out = counts_json(&StatusCounts::tally(&records));
            out["date"] = json!(date);
            out["records"] = json!(records);
            Ok(out)
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.dashboard" => Some(handle_stats_dashboard(state, req)),
        "stats.week" => Some(handle_stats_week(state, req)),
        "stats.summary" => Some(handle_stats_summary(state, req)),
        "reports.daily" => Some(handle_reports_daily(state, req)),
        _ => None,
    }
}
