//! The state handle for one open workspace: roster, ledger and config, plus
//! the store they are persisted to after every mutation.

use crate::backup::Snapshot;
use crate::card;
use crate::config::Config;
use crate::db;
use crate::error::TrackerError;
use crate::ledger::Ledger;
use crate::model::{AttendanceRecord, AttendanceStatus, CardIdentity, Student};
use crate::roster::{self, NewStudent, Roster, StudentPatch};
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Something the UI should surface as a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub kind: &'static str,
    pub message: String,
    pub at: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            kind,
            message: message.into(),
            at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub identity: CardIdentity,
    pub new_student: bool,
}

pub struct Tracker {
    workspace: PathBuf,
    conn: Connection,
    roster: Roster,
    ledger: Ledger,
    config: Config,
    current: Option<CardIdentity>,
    notices: Vec<Notice>,
    last_sync: Option<String>,
}

impl Tracker {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        let conn = db::open_db(workspace)?;
        let mut tracker = Self {
            workspace: workspace.to_path_buf(),
            conn,
            roster: Roster::default(),
            ledger: Ledger::default(),
            config: Config::default(),
            current: None,
            notices: Vec::new(),
            last_sync: None,
        };
        tracker.load()?;
        Ok(tracker)
    }

    fn load(&mut self) -> anyhow::Result<()> {
        self.config = load_or_default(&self.conn, db::KEY_CONFIG).unwrap_or_default();
        let students: Option<Vec<Student>> = load_or_default(&self.conn, db::KEY_STUDENTS);
        let seeded = students.is_none();
        self.roster = Roster::new(students.unwrap_or_else(roster::demo_students));
        let records: Vec<AttendanceRecord> =
            load_or_default(&self.conn, db::KEY_RECORDS).unwrap_or_default();
        let pending: Vec<i64> = load_or_default(&self.conn, db::KEY_PENDING).unwrap_or_default();
        self.ledger = Ledger::from_parts(records, pending);
        if seeded {
            log::info!("no stored roster; seeded {} demo students", self.roster.len());
            self.save_data()?;
        }
        log::info!(
            "workspace {} loaded: {} students, {} records, {} pending",
            self.workspace.to_string_lossy(),
            self.roster.len(),
            self.ledger.records().len(),
            self.ledger.pending_count()
        );
        Ok(())
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current(&self) -> Option<&CardIdentity> {
        self.current.as_ref()
    }

    pub fn last_sync(&self) -> Option<&str> {
        self.last_sync.as_deref()
    }

    /// Whole-collection overwrite of students, records and pending ids.
    pub fn save_data(&self) -> anyhow::Result<()> {
        db::kv_set_json(&self.conn, db::KEY_STUDENTS, self.roster.all())?;
        db::kv_set_json(&self.conn, db::KEY_RECORDS, self.ledger.records())?;
        db::kv_set_json(&self.conn, db::KEY_PENDING, self.ledger.pending_ids())?;
        Ok(())
    }

    pub fn update_config(
        &mut self,
        patch: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<&Config, TrackerError> {
        self.config
            .apply_patch(patch)
            .map_err(TrackerError::InvalidInput)?;
        db::kv_set_json(&self.conn, db::KEY_CONFIG, &self.config)?;
        self.notify(NoticeLevel::Success, "config_saved", "Configuration saved");
        Ok(&self.config)
    }

    pub fn notify(&mut self, level: NoticeLevel, kind: &'static str, message: impl Into<String>) {
        self.notices.push(Notice::new(level, kind, message));
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Resolve a card message. Unknown matriculas join the roster before the
    /// identity is offered for confirmation. Unreadable cards return `None`.
    pub fn scan_card<I, B>(&mut self, records: I) -> Result<Option<ScanOutcome>, TrackerError>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let Some(identity) = card::resolve_message(records) else {
            log::debug!("card payload not recognized; ignored");
            return Ok(None);
        };
        let new_student = self.roster.ensure(&identity);
        if new_student {
            self.save_data()?;
            self.notify(
                NoticeLevel::Info,
                "student_added",
                format!("New student added: {}", identity.nombre),
            );
            log::info!("card scan added student {}", identity.matricula);
        }
        self.current = Some(identity.clone());
        Ok(Some(ScanOutcome {
            identity,
            new_student,
        }))
    }

    /// Simulated read: a random roster student is put up for confirmation.
    pub fn simulate_card(&mut self) -> Option<CardIdentity> {
        let identity = self.roster.random()?.identity();
        self.notify(NoticeLevel::Warning, "card_simulated", "Simulated card read");
        self.current = Some(identity.clone());
        Some(identity)
    }

    pub fn present_student(&mut self, matricula: &str) -> Result<CardIdentity, TrackerError> {
        let identity = self
            .roster
            .find(matricula)
            .map(Student::identity)
            .ok_or_else(|| TrackerError::StudentNotFound(matricula.to_string()))?;
        self.current = Some(identity.clone());
        Ok(identity)
    }

    pub fn cancel_current(&mut self) -> bool {
        self.current.take().is_some()
    }

    pub fn confirm_attendance(
        &mut self,
        status: AttendanceStatus,
        class_label: &str,
    ) -> Result<AttendanceRecord, TrackerError> {
        let Some(identity) = self.current.clone() else {
            return Err(TrackerError::NoCurrentStudent);
        };
        let record = self.ledger.record_attendance(&identity, status, class_label);
        self.current = None;
        self.save_data()?;
        self.notify(
            NoticeLevel::Success,
            "attendance_recorded",
            format!("{} recorded as {}", record.nombre, record.estado),
        );
        log::info!(
            "recorded {} {} for {} ({} pending)",
            record.id,
            record.estado,
            record.matricula,
            self.ledger.pending_count()
        );
        Ok(record)
    }

    pub fn delete_record(&mut self, id: i64) -> Result<bool, TrackerError> {
        if !self.ledger.delete_record(id) {
            return Ok(false);
        }
        self.save_data()?;
        self.notify(NoticeLevel::Success, "record_deleted", "Record deleted");
        Ok(true)
    }

    pub fn add_student(&mut self, input: NewStudent) -> Result<Student, TrackerError> {
        let student = self.roster.add(input)?.clone();
        self.save_data()?;
        self.notify(
            NoticeLevel::Success,
            "student_added",
            format!("{} added", student.nombre),
        );
        Ok(student)
    }

    pub fn update_student(
        &mut self,
        matricula: &str,
        patch: StudentPatch,
    ) -> Result<Student, TrackerError> {
        let student = self.roster.update(matricula, patch)?.clone();
        self.save_data()?;
        self.notify(NoticeLevel::Success, "student_updated", "Student updated");
        Ok(student)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.roster.all(), self.ledger.records(), &self.config)
    }

    /// Replace roster, log and (when present) config with the snapshot's.
    /// Imported records not yet synced are queued again.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<(), TrackerError> {
        self.roster = Roster::new(snapshot.estudiantes);
        let requeued = self.ledger.replace(snapshot.registros);
        if let Some(cfg) = snapshot.config {
            self.config = cfg;
            db::kv_set_json(&self.conn, db::KEY_CONFIG, &self.config)?;
        }
        self.current = None;
        self.save_data()?;
        self.notify(NoticeLevel::Success, "data_imported", "Data imported");
        if requeued > 0 {
            self.notify(
                NoticeLevel::Info,
                "records_requeued",
                format!("{} unsynced records queued for sync", requeued),
            );
            log::info!("import queued {} unsynced records", requeued);
        }
        Ok(())
    }

    /// Wipe the store and reload as a fresh workspace.
    pub fn clear(&mut self) -> Result<(), TrackerError> {
        db::kv_clear(&self.conn)?;
        self.current = None;
        self.last_sync = None;
        self.notices.clear();
        self.load()?;
        log::warn!("workspace {} cleared", self.workspace.to_string_lossy());
        Ok(())
    }

    /// Snapshot the pending batch for a sync attempt.
    pub fn pending_batch(&self) -> Vec<AttendanceRecord> {
        self.ledger.pending_batch()
    }

    pub fn acknowledge_sync(&mut self, ids: &[i64]) -> anyhow::Result<usize> {
        let flagged = self.ledger.mark_synced(ids);
        self.save_data()?;
        self.last_sync = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        Ok(flagged)
    }
}

/// Corrupt blobs are logged and treated as absent.
fn load_or_default<T: DeserializeOwned>(conn: &Connection, key: &str) -> Option<T> {
    match db::kv_get_json(conn, key) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("ignoring unreadable {}: {:#}", key, e);
            None
        }
    }
}
