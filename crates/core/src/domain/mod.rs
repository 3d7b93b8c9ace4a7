// Domain Layer - Pure business logic and entities

pub mod attributes;
pub mod due_date;
pub mod error;
pub mod projection;
pub mod recurrence;
pub mod schema;
pub mod task;

// Re-exports
pub use attributes::{
    Category, EnergyLevel, Importance, RecurrencePattern, SourceSystem, TaskType, Urgency,
};
pub use due_date::{due_date_text, is_due_today, DueDateStyle};
pub use error::DomainError;
pub use projection::{PhoneTaskRow, WatchTaskRow};
pub use schema::{Platform, TASK_FIELDS};
pub use task::{Task, TaskId, LAST_DAY_OF_MONTH};
