// Task Domain Model
//
// The one and only task schema. Phone, desktop and watch clients all project
// from this struct; none of them defines its own copy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::attributes::{
    Category, EnergyLevel, Importance, RecurrencePattern, SourceSystem, TaskType, Urgency,
};
use super::error::{DomainError, Result};

/// Task ID (UUID v4 string)
pub type TaskId = String;

/// Day-of-month value meaning "last day of the month"
pub const LAST_DAY_OF_MONTH: u8 = 32;

/// Task Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    // Identity
    pub id: TaskId,
    pub title: String,
    pub is_completed: bool,

    // Eisenhower attributes (None = to be defined)
    pub importance: Option<Importance>,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: i64, // epoch ms
    pub sort_order: i64,
    pub estimated_duration: Option<u32>, // minutes
    pub urgency: Option<Urgency>,
    pub task_type: Option<TaskType>,

    // Recurrence
    pub recurrence_pattern: RecurrencePattern,
    pub recurrence_weekdays: Option<Vec<u8>>, // 1=Mon .. 7=Sun
    pub recurrence_month_day: Option<u8>,     // 1..=31, 32 = last day
    pub recurrence_group_id: Option<String>,

    pub description: Option<String>,

    // Planning
    pub is_next_up: bool,
    pub next_up_sort_order: Option<i64>,
    pub assigned_focus_block_id: Option<String>,
    pub reschedule_count: u32,
    pub completed_at: Option<i64>, // epoch ms

    // Sync
    pub external_id: Option<String>,
    pub source_system: SourceSystem,

    // AI enrichment
    pub ai_score: Option<i32>,
    pub ai_energy_level: Option<EnergyLevel>,
}

impl Task {
    /// Create a TBD task: only a title, every other attribute unset.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique task ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `title` - Task title
    pub fn new(id: impl Into<String>, created_at: i64, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            is_completed: false,
            importance: None,
            tags: Vec::new(),
            due_date: None,
            created_at,
            sort_order: 0,
            estimated_duration: None,
            urgency: None,
            task_type: None,
            recurrence_pattern: RecurrencePattern::Never,
            recurrence_weekdays: None,
            recurrence_month_day: None,
            recurrence_group_id: None,
            description: None,
            is_next_up: false,
            next_up_sort_order: None,
            assigned_focus_block_id: None,
            reschedule_count: 0,
            completed_at: None,
            external_id: None,
            source_system: SourceSystem::Local,
            ai_score: None,
            ai_energy_level: None,
        }
    }

    /// Task still misses importance, urgency or duration
    pub fn is_tbd(&self) -> bool {
        self.importance.is_none() || self.urgency.is_none() || self.estimated_duration.is_none()
    }

    pub fn category(&self) -> Option<Category> {
        self.task_type.map(TaskType::category)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_pattern.is_recurring()
    }

    /// Recurring instances due after today stay hidden until their day comes.
    pub fn is_visible_in_backlog(&self, today: NaiveDate) -> bool {
        if !self.is_recurring() {
            return true;
        }
        match self.due_date {
            Some(due) => due <= today,
            None => true,
        }
    }

    /// Mark as completed with explicit timestamp.
    ///
    /// Returns `false` (and changes nothing) when already completed.
    pub fn mark_complete(&mut self, now_millis: i64) -> bool {
        if self.is_completed {
            return false;
        }
        self.is_completed = true;
        self.completed_at = Some(now_millis);
        self.is_next_up = false;
        self.next_up_sort_order = None;
        self.assigned_focus_block_id = None;
        true
    }

    /// Reopen a completed task. Returns `false` when already open.
    pub fn mark_incomplete(&mut self) -> bool {
        if !self.is_completed {
            return false;
        }
        self.is_completed = false;
        self.completed_at = None;
        true
    }

    /// Stage or unstage for "Next Up".
    ///
    /// Staging appends to the end of the list; unstaging also drops a stale
    /// focus block assignment.
    pub fn set_next_up(&mut self, is_next_up: bool) {
        self.is_next_up = is_next_up;
        if is_next_up {
            if self.next_up_sort_order.is_none() {
                self.next_up_sort_order = Some(i64::MAX);
            }
        } else {
            self.next_up_sort_order = None;
            self.assigned_focus_block_id = None;
        }
    }

    /// Assign to a focus block. Moving between two different blocks counts as a reschedule.
    pub fn assign_focus_block(&mut self, focus_block_id: Option<String>) {
        if let (Some(old), Some(new)) = (&self.assigned_focus_block_id, &focus_block_id) {
            if old != new {
                self.reschedule_count += 1;
            }
        }
        self.assigned_focus_block_id = focus_block_id;
    }

    // Safe setters: an unset value never overwrites a set one.

    pub fn safe_set_importance(&mut self, value: Option<Importance>) {
        if value.is_some() || self.importance.is_none() {
            self.importance = value;
        }
    }

    pub fn safe_set_urgency(&mut self, value: Option<Urgency>) {
        if value.is_some() || self.urgency.is_none() {
            self.urgency = value;
        }
    }

    pub fn safe_set_duration(&mut self, value: Option<u32>) {
        if value.is_some() || self.estimated_duration.is_none() {
            self.estimated_duration = value;
        }
    }

    pub fn safe_set_task_type(&mut self, value: Option<TaskType>) {
        if value.is_some() || self.task_type.is_none() {
            self.task_type = value;
        }
    }

    /// Check field ranges that the type system does not cover
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::EmptyTitle);
        }
        validate_recurrence(
            self.recurrence_weekdays.as_deref(),
            self.recurrence_month_day,
        )
    }
}

/// Validate recurrence weekday and month-day values
pub fn validate_recurrence(weekdays: Option<&[u8]>, month_day: Option<u8>) -> Result<()> {
    if let Some(days) = weekdays {
        if let Some(&bad) = days.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(DomainError::InvalidWeekday(bad));
        }
    }
    if let Some(day) = month_day {
        if !(1..=LAST_DAY_OF_MONTH).contains(&day) {
            return Err(DomainError::InvalidMonthDay(day));
        }
    }
    Ok(())
}
