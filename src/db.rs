use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub const DB_FILE: &str = "asistencia.sqlite3";

pub const KEY_STUDENTS: &str = "nfc_students";
pub const KEY_RECORDS: &str = "nfc_records";
pub const KEY_PENDING: &str = "nfc_pending";
pub const KEY_CONFIG: &str = "nfc_config";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    Ok(conn)
}

/// Whole-blob reads. Absent keys are `None`; there are no partial updates.
pub fn kv_get(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let v = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |r| {
            r.get::<_, String>(0)
        })
        .optional()?;
    Ok(v)
}

pub fn kv_set(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO kv_store(key, value, updated_at)
         VALUES(?, ?, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        (key, value),
    )?;
    Ok(())
}

pub fn kv_clear(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("DELETE FROM kv_store", [])?;
    Ok(())
}

pub fn kv_get_json<T: DeserializeOwned>(conn: &Connection, key: &str) -> anyhow::Result<Option<T>> {
    let Some(raw) = kv_get(conn, key)? else {
        return Ok(None);
    };
    let v = serde_json::from_str(&raw).with_context(|| format!("stored {} is not valid", key))?;
    Ok(Some(v))
}

pub fn kv_set_json<T: Serialize + ?Sized>(
    conn: &Connection,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    let raw =
        serde_json::to_string(value).with_context(|| format!("failed to serialize {}", key))?;
    kv_set(conn, key, &raw)
}
