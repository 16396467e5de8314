//! Domain error types.

/// Top-level error type for salestrack.
#[derive(Debug, thiserror::Error)]
pub enum SalesTrackError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("week {week} is out of range for {year} (1-{max})")]
    InvalidWeek { year: i32, week: u32, max: u32 },

    #[error("invalid record in {source_name}: {reason}")]
    InvalidRecord { source_name: String, reason: String },

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("unknown user {user_id}")]
    UnknownUser { user_id: String },

    #[error("nothing to export: {table} is empty")]
    EmptyExport { table: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SalesTrackError {
    pub(crate) fn invalid_record(source_name: &str, reason: impl Into<String>) -> Self {
        SalesTrackError::InvalidRecord {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&SalesTrackError> for std::process::ExitCode {
    fn from(err: &SalesTrackError) -> Self {
        let code: u8 = match err {
            SalesTrackError::Io(_) => 1,
            SalesTrackError::ConfigParse { .. }
            | SalesTrackError::ConfigMissing { .. }
            | SalesTrackError::ConfigInvalid { .. } => 2,
            SalesTrackError::Database { .. } | SalesTrackError::DatabaseQuery { .. } => 3,
            SalesTrackError::InvalidWeek { .. } | SalesTrackError::InvalidRecord { .. } => 4,
            SalesTrackError::Forbidden { .. } | SalesTrackError::UnknownUser { .. } => 5,
            SalesTrackError::EmptyExport { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
