//! Turns raw card payloads into an identity tuple.
//!
//! A card message carries one or more records. Each record is tried as a JSON
//! identity object first, then as `matricula:nombre:grado:grupo` text. The
//! first record that resolves wins; a message where nothing resolves yields
//! `None` and is otherwise ignored.

use crate::model::CardIdentity;
use serde_json::Value;
use std::path::PathBuf;

pub const NFC_DEVICE_ENV: &str = "ASISTENCIAD_NFC_DEVICE";

pub fn resolve_message<I, B>(records: I) -> Option<CardIdentity>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    records.into_iter().find_map(|r| resolve_record(r.as_ref()))
}

pub fn resolve_record(bytes: &[u8]) -> Option<CardIdentity> {
    let text = String::from_utf8_lossy(bytes);
    serde_json::from_str::<Value>(text.trim())
        .ok()
        .and_then(|v| from_json(&v))
        .or_else(|| from_delimited(&text))
}

fn from_json(v: &Value) -> Option<CardIdentity> {
    let obj = v.as_object()?;
    let field = |key: &str| -> String {
        match obj.get(key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    };
    let matricula = field("matricula");
    if matricula.is_empty() {
        return None;
    }
    Some(CardIdentity {
        matricula,
        nombre: field("nombre"),
        grado: field("grado"),
        grupo: field("grupo"),
    })
}

fn from_delimited(text: &str) -> Option<CardIdentity> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() < 4 {
        return None;
    }
    let matricula = parts[0].trim();
    if matricula.is_empty() {
        return None;
    }
    Some(CardIdentity {
        matricula: matricula.to_string(),
        nombre: parts[1].trim().to_string(),
        grado: parts[2].trim().to_string(),
        grupo: parts[3].trim().to_string(),
    })
}

/// Whether a card reader device is attached.
pub trait CardReader: Send {
    fn available(&self) -> bool;
}

/// Reader backed by a device node named in the environment.
#[derive(Debug, Clone, Default)]
pub struct DeviceReader {
    path: Option<PathBuf>,
}

impl DeviceReader {
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os(NFC_DEVICE_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

impl CardReader for DeviceReader {
    fn available(&self) -> bool {
        self.path.as_ref().map(|p| p.exists()).unwrap_or(false)
    }
}
