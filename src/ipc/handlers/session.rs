use crate::ipc::error::{ok, respond, HandlerErr};
use crate::ipc::params::{get_optional_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::session;
use serde_json::json;

fn session_login(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let clase = get_optional_str(params, "clase")?.unwrap_or_default();
    let username = get_optional_str(params, "username")?.unwrap_or_default();
    let password = get_optional_str(params, "password")?.unwrap_or_default();
    let s = session::login(&username, &password, &clase)?;
    log::info!("session opened for class {}", s.clase);
    let result = json!({ "session": s });
    state.session = Some(s);
    Ok(result)
}

fn handle_session_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, session_login(state, &req.params))
}

fn handle_session_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let was_open = state.session.take().is_some();
    ok(&req.id, json!({ "ok": true, "wasLoggedIn": was_open }))
}

fn handle_session_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "session": state.session }))
}

fn session_set_class(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let clase = get_required_str(params, "clase")?;
    let Some(s) = state.session.as_mut() else {
        return Err(HandlerErr::new("not_logged_in", "log in first"));
    };
    s.clase = clase;
    Ok(json!({ "session": s }))
}

fn handle_session_set_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, session_set_class(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_session_login(state, req)),
        "session.logout" => Some(handle_session_logout(state, req)),
        "session.get" => Some(handle_session_get(state, req)),
        "session.setClass" => Some(handle_session_set_class(state, req)),
        _ => None,
    }
}
