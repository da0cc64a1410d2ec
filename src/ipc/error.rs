use crate::error::TrackerError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<TrackerError> for HandlerErr {
    fn from(e: TrackerError) -> Self {
        if let TrackerError::Storage(inner) = &e {
            log::error!("storage failure: {:#}", inner);
        }
        Self::new(e.code(), e.to_string())
    }
}

/// Wrap a handler body's result into a response line.
pub fn respond(id: &str, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => e.response(id),
    }
}
