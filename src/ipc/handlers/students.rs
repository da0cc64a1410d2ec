use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::with_tracker;
use crate::ipc::params::{get_optional_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::roster::{NewStudent, StudentPatch};
use serde_json::json;

fn parse_new_student(params: &serde_json::Value) -> Result<NewStudent, HandlerErr> {
    Ok(NewStudent {
        matricula: get_optional_str(params, "matricula")?.unwrap_or_default(),
        nombre: get_optional_str(params, "nombre")?.unwrap_or_default(),
        grado: get_optional_str(params, "grado")?.unwrap_or_default(),
        grupo: get_optional_str(params, "grupo")?.unwrap_or_default(),
        email: get_optional_str(params, "email")?,
        telefono: get_optional_str(params, "telefono")?,
    })
}

fn parse_patch(params: &serde_json::Value) -> Result<StudentPatch, HandlerErr> {
    let Some(patch) = params.get("patch").filter(|v| v.is_object()) else {
        return Err(HandlerErr::new("bad_params", "patch must be an object"));
    };
    Ok(StudentPatch {
        nombre: get_optional_str(patch, "nombre")?,
        grado: get_optional_str(patch, "grado")?,
        grupo: get_optional_str(patch, "grupo")?,
        email: get_optional_str(patch, "email")?,
        telefono: get_optional_str(patch, "telefono")?,
    })
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(
        &req.id,
        with_tracker(state, |t| {
            Ok(json!({
                "students": t.roster().all(),
                "count": t.roster().len()
            }))
        }),
    )
}

fn handle_students_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let query = match get_optional_str(&req.params, "query") {
        Ok(q) => q.unwrap_or_default(),
        Err(e) => return e.response(&req.id),
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            let hits = t.roster().search(&query);
            Ok(json!({ "students": hits, "count": hits.len() }))
        }),
    )
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let input = match parse_new_student(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            let student = t.add_student(input)?;
            log::info!("student {} added manually", student.matricula);
            Ok(json!({ "student": student }))
        }),
    )
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let parsed = get_required_str(&req.params, "matricula")
        .and_then(|m| parse_patch(&req.params).map(|p| (m, p)));
    let (matricula, patch) = match parsed {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            let student = t.update_student(&matricula, patch)?;
            Ok(json!({ "student": student }))
        }),
    )
}

/// Put a roster student up for confirmation without a card.
fn handle_students_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let matricula = match get_required_str(&req.params, "matricula") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    respond(
        &req.id,
        with_tracker(state, |t| {
            let identity = t.present_student(&matricula)?;
            Ok(json!({ "student": identity }))
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.search" => Some(handle_students_search(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.register" => Some(handle_students_register(state, req)),
        _ => None,
    }
}
