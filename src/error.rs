//! Error types shared by the store and the attendance core.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Input that could not be interpreted. The only error the pure core raises.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid attendance status `{0}`, expected `present` or `absent`")]
    InvalidStatus(String),

    #[error("invalid range `{0}`, expected `today`, `week` or `month`")]
    InvalidRange(String),

    #[error("a date range needs both --start and --end, or --range")]
    MissingRange,
}

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("attendance already recorded for student {student_id} on {date}")]
    Conflict { student_id: Uuid, date: NaiveDate },

    #[error("grade code `{code}` is already in use")]
    DuplicateGrade { code: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl AttendanceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AttendanceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;
