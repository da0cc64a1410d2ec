use crate::model::{AttendanceRecord, AttendanceStatus};
use chrono::{Days, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub presente: usize,
    pub tardanza: usize,
    pub falta: usize,
}

impl StatusCounts {
    pub fn tally<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AttendanceRecord>,
    {
        let mut c = Self::default();
        for r in records {
            match r.estado {
                AttendanceStatus::Presente => c.presente += 1,
                AttendanceStatus::Tardanza => c.tardanza += 1,
                AttendanceStatus::Falta => c.falta += 1,
            }
        }
        c
    }

    pub fn total(&self) -> usize {
        self.presente + self.tardanza + self.falta
    }

    /// Share of Presente over all records, percent with one decimal.
    pub fn attendance_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let pct = self.presente as f64 * 100.0 / total as f64;
        (pct * 10.0).round() / 10.0
    }

    pub fn get(&self, status: AttendanceStatus) -> usize {
        match status {
            AttendanceStatus::Presente => self.presente,
            AttendanceStatus::Tardanza => self.tardanza,
            AttendanceStatus::Falta => self.falta,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPoint {
    pub fecha: String,
    pub presentes: usize,
}

/// Presente counts for the `days` dates ending at `end`, oldest first.
/// `None` when the window reaches before the earliest representable date.
pub fn presence_series(
    records: &[AttendanceRecord],
    end: NaiveDate,
    days: u32,
) -> Option<Vec<DayPoint>> {
    (0..u64::from(days))
        .rev()
        .map(|back| {
            let fecha = end
                .checked_sub_days(Days::new(back))?
                .format("%Y-%m-%d")
                .to_string();
            let presentes = records
                .iter()
                .filter(|r| r.fecha == fecha && r.estado == AttendanceStatus::Presente)
                .count();
            Some(DayPoint { fecha, presentes })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(fecha: &str, estado: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: 0,
            matricula: "1".into(),
            nombre: "Uno".into(),
            grado: "9".into(),
            grupo: "A".into(),
            estado,
            clase: "X".into(),
            fecha: fecha.into(),
            hora: "08:00:00".into(),
            timestamp: String::new(),
            sincronizado: false,
        }
    }

    #[test]
    fn rate_rounds_to_one_decimal() {
        let rs = vec![
            rec("2024-03-04", AttendanceStatus::Presente),
            rec("2024-03-04", AttendanceStatus::Tardanza),
            rec("2024-03-04", AttendanceStatus::Falta),
        ];
        let c = StatusCounts::tally(&rs);
        assert_eq!(c.total(), 3);
        assert_eq!(c.attendance_rate(), 33.3);
        assert_eq!(StatusCounts::default().attendance_rate(), 0.0);
    }

    #[test]
    fn series_covers_seven_days_oldest_first() {
        let rs = vec![
            rec("2024-03-04", AttendanceStatus::Presente),
            rec("2024-03-04", AttendanceStatus::Presente),
            rec("2024-02-28", AttendanceStatus::Presente),
            rec("2024-03-01", AttendanceStatus::Falta),
        ];
        let end = NaiveDate::from_ymd_opt(2024, 3, 4).expect("date");
        let s = presence_series(&rs, end, 7).expect("series");
        assert_eq!(s.len(), 7);
        assert_eq!(s[0].fecha, "2024-02-27");
        assert_eq!(s[1].presentes, 1);
        assert_eq!(s[3].presentes, 0);
        assert_eq!(s[6], DayPoint { fecha: "2024-03-04".into(), presentes: 2 });
    }

    #[test]
    fn series_before_the_calendar_start_is_none() {
        let end = NaiveDate::MIN + Days::new(3);
        assert!(presence_series(&[], end, 7).is_none());
        let s = presence_series(&[], end, 4).expect("series");
        assert_eq!(s[0].fecha, NaiveDate::MIN.format("%Y-%m-%d").to_string());
    }
}
