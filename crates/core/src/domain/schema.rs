// Canonical Task Schema
//
// Single field list shared by the JSON wire shape, the SQLite table and every
// client platform. Records produced elsewhere are checked against it so a
// drifting copy of the model is caught at the boundary instead of silently
// losing fields.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::error::{DomainError, Result};
use super::task::Task;

/// Every field of [`Task`], in declaration order
pub const TASK_FIELDS: [&str; 25] = [
    "id",
    "title",
    "is_completed",
    "importance",
    "tags",
    "due_date",
    "created_at",
    "sort_order",
    "estimated_duration",
    "urgency",
    "task_type",
    "recurrence_pattern",
    "recurrence_weekdays",
    "recurrence_month_day",
    "recurrence_group_id",
    "description",
    "is_next_up",
    "next_up_sort_order",
    "assigned_focus_block_id",
    "reschedule_count",
    "completed_at",
    "external_id",
    "source_system",
    "ai_score",
    "ai_energy_level",
];

/// Fields whose value is supplied by the caller instead of a default
const IDENTITY_FIELDS: [&str; 3] = ["id", "title", "created_at"];

/// Client platforms that display tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Phone,
    Desktop,
    Watch,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Phone, Platform::Desktop, Platform::Watch];

    /// Quick-capture a title-only task on this platform.
    ///
    /// All platforms share `Task::new`; the platform only decides how the
    /// task is shown later.
    pub fn capture(self, id: impl Into<String>, created_at: i64, title: &str) -> Task {
        tracing::debug!(platform = ?self, "Quick capture");
        Task::new(id, created_at, title.trim())
    }
}

/// Default value of every non-identity field for a freshly captured task
pub fn default_record() -> Map<String, Value> {
    let mut record = match serde_json::to_value(Task::new("", 0, "")) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for field in IDENTITY_FIELDS {
        record.remove(field);
    }
    record
}

/// Check that a serialized task record carries exactly the canonical fields.
pub fn verify_record(record: &Value) -> Result<()> {
    let Value::Object(map) = record else {
        return Err(DomainError::SchemaDrift {
            missing: TASK_FIELDS.iter().map(|f| f.to_string()).collect(),
            unknown: Vec::new(),
        });
    };
    verify_field_names(map.keys().map(String::as_str))
}

/// Check a set of field (or column) names against the canonical schema.
pub fn verify_field_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let present: BTreeSet<&str> = names.into_iter().collect();
    let canonical: BTreeSet<&str> = TASK_FIELDS.iter().copied().collect();

    let missing: Vec<String> = canonical
        .difference(&present)
        .map(|f| f.to_string())
        .collect();
    let unknown: Vec<String> = present
        .difference(&canonical)
        .map(|f| f.to_string())
        .collect();

    if missing.is_empty() && unknown.is_empty() {
        Ok(())
    } else {
        Err(DomainError::SchemaDrift { missing, unknown })
    }
}
