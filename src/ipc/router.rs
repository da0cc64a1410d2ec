use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;
use crate::sync::lock_tracker;

type TryHandle = fn(&mut AppState, &Request) -> Option<serde_json::Value>;

const FAMILIES: [TryHandle; 9] = [
    handlers::core::try_handle,
    handlers::session::try_handle,
    handlers::config::try_handle,
    handlers::students::try_handle,
    handlers::card::try_handle,
    handlers::attendance::try_handle,
    handlers::sync::try_handle,
    handlers::stats::try_handle,
    handlers::backup::try_handle,
];

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    let mut resp = FAMILIES
        .iter()
        .find_map(|try_handle| try_handle(state, &req))
        .unwrap_or_else(|| {
            err(
                &req.id,
                "not_implemented",
                format!("unknown method: {}", req.method),
                None,
            )
        });
    attach_notices(state, &mut resp);
    resp
}

/// Toasts queued by this request (or by a background sync since the last
/// one) ride along on the response.
fn attach_notices(state: &AppState, resp: &mut serde_json::Value) {
    let notices = match lock_tracker(&state.tracker).as_mut() {
        Some(t) => t.drain_notices(),
        None => return,
    };
    if notices.is_empty() {
        return;
    }
    match serde_json::to_value(&notices) {
        Ok(v) => resp["notices"] = v,
        Err(e) => log::warn!("dropping {} notices: {}", notices.len(), e),
    }
}
