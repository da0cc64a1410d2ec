//! Attendance log plus the subset still waiting for remote sync.
//!
//! The log is kept most-recent-first. The pending queue holds record ids in
//! creation order and is always a subset of the ids in the log.

use crate::model::{AttendanceRecord, AttendanceStatus, CardIdentity};
use chrono::{DateTime, Local, SecondsFormat};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<AttendanceRecord>,
    pending: Vec<i64>,
}

impl Ledger {
    /// Rebuild from persisted snapshots; pending ids without a record are dropped.
    pub fn from_parts(records: Vec<AttendanceRecord>, pending: Vec<i64>) -> Self {
        let mut ledger = Self { records, pending };
        ledger.prune_pending();
        ledger
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn pending_ids(&self) -> &[i64] {
        &self.pending
    }

    pub fn record_attendance(
        &mut self,
        identity: &CardIdentity,
        status: AttendanceStatus,
        class_label: &str,
    ) -> AttendanceRecord {
        self.record_attendance_at(identity, status, class_label, Local::now())
    }

    pub fn record_attendance_at(
        &mut self,
        identity: &CardIdentity,
        status: AttendanceStatus,
        class_label: &str,
        now: DateTime<Local>,
    ) -> AttendanceRecord {
        // Ids double as identity, so two records in one millisecond must not collide.
        let mut id = now.timestamp_millis();
        if let Some(newest) = self.records.iter().map(|r| r.id).max() {
            if id <= newest {
                id = newest + 1;
            }
        }

        let record = AttendanceRecord {
            id,
            matricula: identity.matricula.clone(),
            nombre: identity.nombre.clone(),
            grado: identity.grado.clone(),
            grupo: identity.grupo.clone(),
            estado: status,
            clase: class_label.to_string(),
            fecha: date_label(&now),
            hora: now.format("%H:%M:%S").to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, false),
            sincronizado: false,
        };
        self.records.insert(0, record.clone());
        self.pending.push(id);
        record
    }

    /// Removes the record and its pending entry, if any.
    pub fn delete_record(&mut self, id: i64) -> bool {
        let Some(idx) = self.records.iter().position(|r| r.id == id) else {
            return false;
        };
        self.records.remove(idx);
        self.pending.retain(|p| *p != id);
        true
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn records_on(&self, date_label: &str) -> Vec<AttendanceRecord> {
        self.records
            .iter()
            .filter(|r| r.fecha == date_label)
            .cloned()
            .collect()
    }

    pub fn recent(&self, n: usize) -> &[AttendanceRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// Snapshot of pending records in queue order.
    pub fn pending_batch(&self) -> Vec<AttendanceRecord> {
        self.pending
            .iter()
            .filter_map(|id| self.records.iter().find(|r| r.id == *id))
            .cloned()
            .collect()
    }

    /// Acknowledge a whole batch: flag the records and drop their ids from
    /// the queue. Ids queued after the batch was taken stay pending.
    pub fn mark_synced(&mut self, ids: &[i64]) -> usize {
        let acked: HashSet<i64> = ids.iter().copied().collect();
        let mut flagged = 0;
        for r in self.records.iter_mut() {
            if acked.contains(&r.id) && !r.sincronizado {
                r.sincronizado = true;
                flagged += 1;
            }
        }
        self.pending.retain(|id| !acked.contains(id));
        flagged
    }

    /// Replace the log wholesale (backup import). Unsynced records that are
    /// not already queued join the queue oldest first; returns how many did.
    pub fn replace(&mut self, records: Vec<AttendanceRecord>) -> usize {
        self.records = records;
        self.prune_pending();
        let queued: HashSet<i64> = self.pending.iter().copied().collect();
        let mut unsynced: Vec<i64> = self
            .records
            .iter()
            .filter(|r| !r.sincronizado && !queued.contains(&r.id))
            .map(|r| r.id)
            .collect();
        unsynced.sort_unstable();
        unsynced.dedup();
        let added = unsynced.len();
        self.pending.extend(unsynced);
        added
    }

    fn prune_pending(&mut self) {
        let known: HashSet<i64> = self.records.iter().map(|r| r.id).collect();
        let mut seen = HashSet::new();
        self.pending.retain(|id| known.contains(id) && seen.insert(*id));
    }
}

pub fn date_label(now: &DateTime<Local>) -> String {
    now.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn juan() -> CardIdentity {
        CardIdentity {
            matricula: "20240001".into(),
            nombre: "Juan Pérez".into(),
            grado: "10".into(),
            grupo: "A".into(),
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 4, h, m, s)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn log_is_most_recent_first_and_counts_calls() {
        let mut l = Ledger::default();
        for i in 0..5 {
            l.record_attendance_at(&juan(), AttendanceStatus::Presente, "Math101", at(8, i, 0));
        }
        assert_eq!(l.records().len(), 5);
        assert_eq!(l.pending_count(), 5);
        let ids: Vec<i64> = l.records().iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(ids, sorted);
        // Queue keeps creation order.
        assert_eq!(l.pending_ids().first(), ids.last());
    }

    #[test]
    fn same_millisecond_records_get_distinct_ids() {
        let mut l = Ledger::default();
        let a = l.record_attendance_at(&juan(), AttendanceStatus::Presente, "X", at(9, 0, 0));
        let b = l.record_attendance_at(&juan(), AttendanceStatus::Tardanza, "X", at(9, 0, 0));
        assert_eq!(b.id, a.id + 1);
    }

    #[test]
    fn record_fields_follow_the_clock() {
        let mut l = Ledger::default();
        let r = l.record_attendance_at(&juan(), AttendanceStatus::Falta, "Math101", at(7, 5, 9));
        assert_eq!(r.fecha, "2024-03-04");
        assert_eq!(r.hora, "07:05:09");
        assert_eq!(r.clase, "Math101");
        assert!(!r.sincronizado);
        assert!(r.timestamp.starts_with("2024-03-04T07:05:09"));
    }

    #[test]
    fn delete_prunes_pending_and_is_noop_when_absent() {
        let mut l = Ledger::default();
        let a = l.record_attendance_at(&juan(), AttendanceStatus::Presente, "X", at(8, 0, 0));
        let b = l.record_attendance_at(&juan(), AttendanceStatus::Presente, "X", at(8, 1, 0));
        assert!(l.delete_record(a.id));
        assert_eq!(l.records().len(), 1);
        assert_eq!(l.pending_ids(), &[b.id]);
        assert!(!l.delete_record(a.id));
        assert!(!l.delete_record(12345));
        assert_eq!(l.records().len(), 1);
    }

    #[test]
    fn mark_synced_keeps_later_records_pending() {
        let mut l = Ledger::default();
        l.record_attendance_at(&juan(), AttendanceStatus::Presente, "X", at(8, 0, 0));
        let batch = l.pending_batch();
        let late = l.record_attendance_at(&juan(), AttendanceStatus::Tardanza, "X", at(8, 20, 0));

        let ids: Vec<i64> = batch.iter().map(|r| r.id).collect();
        assert_eq!(l.mark_synced(&ids), 1);
        assert_eq!(l.pending_ids(), &[late.id]);
        for r in l.records() {
            assert_eq!(r.sincronizado, r.id != late.id);
        }
    }

    #[test]
    fn records_on_filters_by_date_in_log_order() {
        let mut l = Ledger::default();
        let day1 = Local.with_ymd_and_hms(2024, 3, 3, 8, 0, 0).single().expect("time");
        l.record_attendance_at(&juan(), AttendanceStatus::Presente, "X", day1);
        let a = l.record_attendance_at(&juan(), AttendanceStatus::Presente, "X", at(8, 0, 0));
        let b = l.record_attendance_at(&juan(), AttendanceStatus::Falta, "X", at(9, 0, 0));
        let on = l.records_on("2024-03-04");
        assert_eq!(on.iter().map(|r| r.id).collect::<Vec<_>>(), vec![b.id, a.id]);
        assert!(l.records_on("2000-01-01").is_empty());
    }

    #[test]
    fn from_parts_drops_dangling_and_duplicate_pending() {
        let mut l = Ledger::default();
        let a = l.record_attendance_at(&juan(), AttendanceStatus::Presente, "X", at(8, 0, 0));
        let rebuilt = Ledger::from_parts(l.records().to_vec(), vec![a.id, 42, a.id]);
        assert_eq!(rebuilt.pending_ids(), &[a.id]);
    }

    #[test]
    fn replace_queues_unsynced_records_once() {
        let mut source = Ledger::default();
        let a = source.record_attendance_at(&juan(), AttendanceStatus::Presente, "X", at(8, 0, 0));
        let b = source.record_attendance_at(&juan(), AttendanceStatus::Falta, "X", at(8, 5, 0));
        let c = source.record_attendance_at(&juan(), AttendanceStatus::Tardanza, "X", at(8, 9, 0));
        source.mark_synced(&[b.id]);

        let mut l = Ledger::default();
        let stale = l.record_attendance_at(&juan(), AttendanceStatus::Presente, "Y", at(7, 0, 0));
        assert_eq!(l.replace(source.records().to_vec()), 2);
        assert!(!l.pending_ids().contains(&stale.id));
        assert_eq!(l.pending_ids(), &[a.id, c.id]);

        assert_eq!(l.replace(l.records().to_vec()), 0);
        assert_eq!(l.pending_ids(), &[a.id, c.id]);
    }
}
