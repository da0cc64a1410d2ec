use chrono::NaiveDate;
use crate::ipc::error::HandlerErr;
use serde_json::Value;

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn get_optional_str(params: &Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        // Matriculas and grades are often typed as numbers by form code.
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(HandlerErr::new("bad_params", format!("{} must be string", key))),
    }
}

pub fn get_required_i64(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    match params.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| HandlerErr::new("bad_params", format!("missing or invalid {}", key)))
}

pub fn get_optional_usize(
    params: &Value,
    key: &str,
    max: usize,
) -> Result<Option<usize>, HandlerErr> {
    let Some(v) = params.get(key).filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let n = v.as_u64().ok_or_else(|| {
        HandlerErr::new("bad_params", format!("{} must be a non-negative integer", key))
    })?;
    Ok(Some((n as usize).min(max)))
}

/// `YYYY-MM-DD`, the same label records carry in `fecha`.
pub fn get_optional_date(params: &Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    let Some(raw) = get_optional_str(params, key)? else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|_| HandlerErr::new("bad_params", format!("{} must be YYYY-MM-DD", key)))
}
