use thiserror::Error;

/// Input and state errors surfaced to the UI. None of them end the session.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("student {0} already exists")]
    DuplicateMatricula(String),
    #[error("student {0} not found")]
    StudentNotFound(String),
    #[error("wrong username or password")]
    BadCredentials,
    #[error("no student card is waiting for confirmation")]
    NoCurrentStudent,
    #[error("no records to export")]
    NoData,
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl TrackerError {
    pub fn code(&self) -> &'static str {
        match self {
            TrackerError::MissingField(_) | TrackerError::InvalidInput(_) => "bad_params",
            TrackerError::DuplicateMatricula(_) => "duplicate",
            TrackerError::StudentNotFound(_) => "not_found",
            TrackerError::BadCredentials => "bad_credentials",
            TrackerError::NoCurrentStudent => "no_current_student",
            TrackerError::NoData => "no_data",
            TrackerError::NotConfigured(_) => "not_configured",
            TrackerError::Storage(_) => "db_update_failed",
        }
    }
}
