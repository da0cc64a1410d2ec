use crate::error::TrackerError;
use crate::model::{CardIdentity, Student};
use chrono::{SecondsFormat, Utc};
use rand::seq::SliceRandom;

/// Fields accepted from manual entry.
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub matricula: String,
    pub nombre: String,
    pub grado: String,
    pub grupo: String,
    pub email: Option<String>,
    pub telefono: Option<String>,
}

/// Blank text fields mean "keep the current value".
#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub nombre: Option<String>,
    pub grado: Option<String>,
    pub grupo: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new(students: Vec<Student>) -> Self {
        Self { students }
    }

    pub fn all(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn find(&self, matricula: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.matricula == matricula)
    }

    pub fn add(&mut self, input: NewStudent) -> Result<&Student, TrackerError> {
        let matricula = required(&input.matricula, "matricula")?;
        let nombre = required(&input.nombre, "nombre")?;
        let grado = required(&input.grado, "grado")?;
        let grupo = required(&input.grupo, "grupo")?;
        if self.find(&matricula).is_some() {
            return Err(TrackerError::DuplicateMatricula(matricula));
        }
        self.students.push(Student {
            id: matricula.clone(),
            matricula,
            nombre,
            grado,
            grupo,
            email: non_blank(input.email),
            telefono: non_blank(input.telefono),
            fecha_registro: now_iso(),
        });
        Ok(&self.students[self.students.len() - 1])
    }

    /// Card path: create the student if the matricula is new. Returns true
    /// when the roster grew.
    pub fn ensure(&mut self, identity: &CardIdentity) -> bool {
        if self.find(&identity.matricula).is_some() {
            return false;
        }
        self.students.push(Student {
            id: identity.matricula.clone(),
            matricula: identity.matricula.clone(),
            nombre: identity.nombre.clone(),
            grado: identity.grado.clone(),
            grupo: identity.grupo.clone(),
            email: None,
            telefono: None,
            fecha_registro: now_iso(),
        });
        true
    }

    pub fn update(
        &mut self,
        matricula: &str,
        patch: StudentPatch,
    ) -> Result<&Student, TrackerError> {
        let student = self
            .students
            .iter_mut()
            .find(|s| s.matricula == matricula)
            .ok_or_else(|| TrackerError::StudentNotFound(matricula.to_string()))?;
        if let Some(v) = non_blank(patch.nombre) {
            student.nombre = v;
        }
        if let Some(v) = non_blank(patch.grado) {
            student.grado = v;
        }
        if let Some(v) = non_blank(patch.grupo) {
            student.grupo = v;
        }
        if let Some(v) = patch.email {
            student.email = non_blank(Some(v));
        }
        if let Some(v) = patch.telefono {
            student.telefono = non_blank(Some(v));
        }
        Ok(&*student)
    }

    pub fn search(&self, query: &str) -> Vec<&Student> {
        let q = query.trim().to_lowercase();
        self.students
            .iter()
            .filter(|s| {
                q.is_empty()
                    || [
                        Some(s.matricula.as_str()),
                        Some(s.nombre.as_str()),
                        Some(s.grado.as_str()),
                        Some(s.grupo.as_str()),
                        s.email.as_deref(),
                        s.telefono.as_deref(),
                    ]
                    .into_iter()
                    .flatten()
                    .any(|f| f.to_lowercase().contains(&q))
            })
            .collect()
    }

    pub fn random(&self) -> Option<&Student> {
        self.students.choose(&mut rand::thread_rng())
    }
}

/// The three sample students a fresh workspace starts with.
pub fn demo_students() -> Vec<Student> {
    let registered = now_iso();
    [
        ("20240001", "Juan Pérez", "10", "A", "juan@ejemplo.com", "5551234567"),
        ("20240002", "María García", "11", "B", "maria@ejemplo.com", "5557654321"),
        ("20240003", "Carlos López", "9", "C", "carlos@ejemplo.com", "5559876543"),
    ]
    .into_iter()
    .map(|(matricula, nombre, grado, grupo, email, telefono)| Student {
        id: matricula.to_string(),
        matricula: matricula.to_string(),
        nombre: nombre.to_string(),
        grado: grado.to_string(),
        grupo: grupo.to_string(),
        email: Some(email.to_string()),
        telefono: Some(telefono.to_string()),
        fecha_registro: registered.clone(),
    })
    .collect()
}

fn required(v: &str, field: &'static str) -> Result<String, TrackerError> {
    let t = v.trim();
    if t.is_empty() {
        return Err(TrackerError::MissingField(field));
    }
    Ok(t.to_string())
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
