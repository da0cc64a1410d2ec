use crate::config::Config;
use crate::model::{AttendanceRecord, Student};
use anyhow::Context;
use chrono::{Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "Fecha,Hora,Matrícula,Nombre,Grado,Grupo,Estado,Clase";

/// Full backup shape shared by export and import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub estudiantes: Vec<Student>,
    #[serde(default)]
    pub registros: Vec<AttendanceRecord>,
    #[serde(default)]
    pub config: Option<Config>,
    #[serde(default)]
    pub export_date: Option<String>,
}

impl Snapshot {
    pub fn capture(students: &[Student], records: &[AttendanceRecord], config: &Config) -> Self {
        Self {
            estudiantes: students.to_vec(),
            registros: records.to_vec(),
            config: Some(config.clone()),
            export_date: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn history_csv(records: &[AttendanceRecord]) -> String {
    let mut csv = String::from(CSV_HEADER);
    for r in records {
        csv.push('\n');
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}",
            csv_quote(&r.fecha),
            csv_quote(&r.hora),
            csv_quote(&r.matricula),
            csv_quote(&r.nombre),
            csv_quote(&r.grado),
            csv_quote(&r.grupo),
            r.estado,
            csv_quote(&r.clase)
        ));
    }
    csv
}

/// A directory target gets the dated default file name inside it.
fn resolve_out_path(out_path: &Path, prefix: &str, ext: &str) -> PathBuf {
    if out_path.is_dir() {
        out_path.join(format!(
            "{}_{}.{}",
            prefix,
            Local::now().format("%Y-%m-%d"),
            ext
        ))
    } else {
        out_path.to_path_buf()
    }
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))
}

pub fn export_history_csv(
    records: &[AttendanceRecord],
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let path = resolve_out_path(out_path, "asistencias", "csv");
    write_file(&path, &history_csv(records))?;
    Ok(ExportSummary {
        path,
        rows: records.len(),
    })
}

pub fn export_snapshot(snapshot: &Snapshot, out_path: &Path) -> anyhow::Result<ExportSummary> {
    let path = resolve_out_path(out_path, "backup_nfc", "json");
    let text = serde_json::to_string_pretty(snapshot).context("failed to serialize backup")?;
    write_file(&path, &text)?;
    Ok(ExportSummary {
        path,
        rows: snapshot.registros.len(),
    })
}

pub fn import_snapshot(in_path: &Path) -> anyhow::Result<Snapshot> {
    let text = std::fs::read_to_string(in_path)
        .with_context(|| format!("failed to read backup {}", in_path.to_string_lossy()))?;
    serde_json::from_str(&text).context("backup file is not a valid snapshot")
}
