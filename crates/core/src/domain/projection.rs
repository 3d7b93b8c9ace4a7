// Platform Projections
//
// Read-only views over the canonical Task. A platform picks what to show and
// how to format it; it never stores fields or defaults of its own.

use chrono::NaiveDate;

use super::attributes::Category;
use super::due_date::{due_date_text, DueDateStyle};
use super::task::Task;

/// Backlog row on phone and desktop
#[derive(Debug, Clone, Copy)]
pub struct PhoneTaskRow<'a> {
    task: &'a Task,
    today: NaiveDate,
}

impl<'a> PhoneTaskRow<'a> {
    pub fn new(task: &'a Task, today: NaiveDate) -> Self {
        Self { task, today }
    }

    pub fn id(&self) -> &'a str {
        &self.task.id
    }

    pub fn title(&self) -> &'a str {
        &self.task.title
    }

    pub fn tags(&self) -> &'a [String] {
        &self.task.tags
    }

    pub fn category(&self) -> Option<Category> {
        self.task.category()
    }

    /// Italic placeholder rows for tasks still to be defined
    pub fn is_tbd(&self) -> bool {
        self.task.is_tbd()
    }

    pub fn importance_label(&self) -> Option<&'static str> {
        self.task.importance.map(|i| i.display_name())
    }

    pub fn duration_label(&self) -> Option<String> {
        self.task.estimated_duration.map(|m| format!("{m} min"))
    }

    pub fn due_text(&self) -> Option<String> {
        self.task
            .due_date
            .map(|due| due_date_text(due, self.today, DueDateStyle::Compact))
    }

    /// Detail sheet variant with full weekday / medium date
    pub fn due_text_full(&self) -> Option<String> {
        self.task
            .due_date
            .map(|due| due_date_text(due, self.today, DueDateStyle::Full))
    }
}

/// Compact row on the watch
#[derive(Debug, Clone, Copy)]
pub struct WatchTaskRow<'a> {
    task: &'a Task,
    today: NaiveDate,
}

impl<'a> WatchTaskRow<'a> {
    pub fn new(task: &'a Task, today: NaiveDate) -> Self {
        Self { task, today }
    }

    pub fn id(&self) -> &'a str {
        &self.task.id
    }

    pub fn title(&self) -> &'a str {
        &self.task.title
    }

    pub fn is_completed(&self) -> bool {
        self.task.is_completed
    }

    pub fn is_next_up(&self) -> bool {
        self.task.is_next_up
    }

    pub fn due_text(&self) -> Option<String> {
        self.task
            .due_date
            .map(|due| due_date_text(due, self.today, DueDateStyle::Compact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Importance, TaskType};

    #[test]
    fn test_rows_read_through_to_the_task() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let mut task = Task::new("id-1", 1, "Rechnung");
        task.importance = Some(Importance::High);
        task.task_type = Some(TaskType::Income);
        task.estimated_duration = Some(45);
        task.due_date = today.succ_opt();

        let phone = PhoneTaskRow::new(&task, today);
        let watch = WatchTaskRow::new(&task, today);

        assert_eq!(phone.title(), watch.title());
        assert_eq!(phone.id(), "id-1");
        assert_eq!(phone.due_text(), watch.due_text());
        assert_eq!(phone.due_text().as_deref(), Some("Morgen"));
        assert_eq!(phone.importance_label(), Some("Hoch"));
        assert_eq!(phone.duration_label().as_deref(), Some("45 min"));
        assert_eq!(phone.category().map(|c| c.title), Some("Earn"));
        assert!(phone.is_tbd());
        assert!(!watch.is_completed());
    }
}
