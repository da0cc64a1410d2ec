use crate::error::TrackerError;
use serde::Serialize;
use uuid::Uuid;

const ADMIN_USER: &str = "admin";
const ADMIN_PASSWORD: &str = "admin123";

/// The operator's login and the class whose attendance is being taken.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: String,
    pub clase: String,
}

pub fn login(username: &str, password: &str, clase: &str) -> Result<Session, TrackerError> {
    let clase = clase.trim();
    if clase.is_empty() {
        return Err(TrackerError::MissingField("clase"));
    }
    if username != ADMIN_USER || password != ADMIN_PASSWORD {
        log::warn!("rejected login for {:?}", username);
        return Err(TrackerError::BadCredentials);
    }
    Ok(Session {
        token: Uuid::new_v4().to_string(),
        user: "Admin".to_string(),
        clase: clase.to_string(),
    })
}
