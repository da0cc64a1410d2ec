use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Attendance status chosen at confirmation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Presente,
    Tardanza,
    Falta,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 3] = [
        AttendanceStatus::Presente,
        AttendanceStatus::Tardanza,
        AttendanceStatus::Falta,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Presente => "Presente",
            AttendanceStatus::Tardanza => "Tardanza",
            AttendanceStatus::Falta => "Falta",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Presente" => Ok(AttendanceStatus::Presente),
            "Tardanza" => Ok(AttendanceStatus::Tardanza),
            "Falta" => Ok(AttendanceStatus::Falta),
            other => Err(format!(
                "estado must be one of Presente, Tardanza, Falta (got {:?})",
                other
            )),
        }
    }
}

/// The identity tuple read from a card (or drawn from the roster).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardIdentity {
    pub matricula: String,
    pub nombre: String,
    pub grado: String,
    pub grupo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub matricula: String,
    pub nombre: String,
    pub grado: String,
    pub grupo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    pub fecha_registro: String,
}

impl Student {
    pub fn identity(&self) -> CardIdentity {
        CardIdentity {
            matricula: self.matricula.clone(),
            nombre: self.nombre.clone(),
            grado: self.grado.clone(),
            grupo: self.grupo.clone(),
        }
    }
}

/// One confirmed card read. Only `sincronizado` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub matricula: String,
    pub nombre: String,
    pub grado: String,
    pub grupo: String,
    pub estado: AttendanceStatus,
    pub clase: String,
    pub fecha: String,
    pub hora: String,
    pub timestamp: String,
    pub sincronizado: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_only_the_three_labels() {
        assert_eq!(
            "Tardanza".parse::<AttendanceStatus>(),
            Ok(AttendanceStatus::Tardanza)
        );
        assert_eq!(
            " Falta ".parse::<AttendanceStatus>(),
            Ok(AttendanceStatus::Falta)
        );
        assert!("presente".parse::<AttendanceStatus>().is_err());
        assert!("Ausente".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn student_serializes_with_camel_case_field_names() {
        let s = Student {
            id: "1".into(),
            matricula: "1".into(),
            nombre: "Ana".into(),
            grado: "9".into(),
            grupo: "B".into(),
            email: None,
            telefono: Some("555".into()),
            fecha_registro: "2024-01-01T00:00:00Z".into(),
        };
        let v = serde_json::to_value(&s).expect("serialize");
        assert_eq!(v["fechaRegistro"], "2024-01-01T00:00:00Z");
        assert_eq!(v["telefono"], "555");
        assert!(v.get("email").is_none());
    }
}
