//! Error types for option parsing, catalog access and persistence.

use thiserror::Error;

/// Errors produced while validating the raw option map of a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionsError {
    /// One or more required keys are absent.
    #[error("required options missing: {}", missing.join(", "))]
    MissingOptions { missing: Vec<String> },

    /// A key is present but its value cannot be coerced.
    #[error("invalid option value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl OptionsError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        OptionsError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Malformed catalog records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid clock time {value:?} in time slot of lecture {lecture}")]
    InvalidTime { lecture: i64, value: String },

    #[error("time slot of lecture {lecture} ends at or before it starts ({start}-{end})")]
    EmptySlot { lecture: i64, start: String, end: String },

    #[error("lecture {lecture} references unknown course {course}")]
    UnknownCourse { lecture: i64, course: i64 },

    #[error("evaluation rate {rate} of lecture {lecture} is above 5")]
    RateOutOfRange { lecture: i64, rate: u8 },

    #[error("unknown student {0}")]
    UnknownStudent(i64),
}

/// Failures of the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Top level error of a recommendation run.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RecommendError {
    /// True for errors caused by the caller's request rather than the data.
    pub fn is_validation(&self) -> bool {
        matches!(self, RecommendError::Options(_))
    }
}
