// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Task title must not be empty")]
    EmptyTitle,

    #[error("Invalid importance: {0} (expected 1..=3)")]
    InvalidImportance(i64),

    #[error("Invalid recurrence weekday: {0} (expected 1=Mon..7=Sun)")]
    InvalidWeekday(u8),

    #[error("Invalid recurrence month day: {0} (expected 1..=31, or 32 for last day)")]
    InvalidMonthDay(u8),

    #[error("Unknown {field} value: {value:?}")]
    UnknownValue { field: &'static str, value: String },

    #[error("Schema drift: missing fields {missing:?}, unknown fields {unknown:?}")]
    SchemaDrift {
        missing: Vec<String>,
        unknown: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, DomainError>;
