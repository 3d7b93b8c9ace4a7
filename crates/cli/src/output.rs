// Table views for terminal output

use chrono::NaiveDate;
use tabled::Tabled;

use focusblox_core::application::{DurationSource, PlanItem};
use focusblox_core::domain::{due_date_text, DueDateStyle, PhoneTaskRow, Task, WatchTaskRow};

const NONE: &str = "-";

#[derive(Tabled)]
pub struct TaskView {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Importance")]
    importance: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

impl TaskView {
    pub fn new(task: &Task, today: NaiveDate) -> Self {
        let row = PhoneTaskRow::new(task, today);
        let title = if row.is_tbd() {
            format!("{} (TBD)", row.title())
        } else {
            row.title().to_string()
        };

        Self {
            id: row.id().to_string(),
            title,
            importance: row.importance_label().unwrap_or(NONE).to_string(),
            duration: row.duration_label().unwrap_or_else(|| NONE.to_string()),
            due: row.due_text().unwrap_or_else(|| NONE.to_string()),
            category: row.category().map_or(NONE, |c| c.title).to_string(),
            tags: row.tags().join(", "),
        }
    }
}

/// Minimal view used with `--watch`
#[derive(Tabled)]
pub struct WatchView {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Next Up")]
    next_up: String,
    #[tabled(rename = "Due")]
    due: String,
}

impl WatchView {
    pub fn new(task: &Task, today: NaiveDate) -> Self {
        let row = WatchTaskRow::new(task, today);
        Self {
            id: row.id().to_string(),
            title: row.title().to_string(),
            next_up: if row.is_next_up() { "●" } else { "" }.to_string(),
            due: row.due_text().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct CompletedView {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Completed")]
    completed: String,
}

impl CompletedView {
    pub fn new(item: &PlanItem) -> Self {
        let completed = item
            .completed_at
            .and_then(chrono::DateTime::from_timestamp_millis)
            .map(|at| {
                at.with_timezone(&chrono::Local)
                    .format("%d.%m.%Y %H:%M")
                    .to_string()
            })
            .unwrap_or_else(|| NONE.to_string());

        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            completed,
        }
    }
}

#[derive(Tabled)]
pub struct PlanView {
    #[tabled(rename = "Rank")]
    rank: i64,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Score")]
    score: u8,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Block")]
    block: String,
}

impl PlanView {
    pub fn new(item: &PlanItem, today: NaiveDate) -> Self {
        let duration = match item.duration_source {
            DurationSource::Manual => format!("{} min", item.effective_duration),
            DurationSource::Parsed => format!("{} min (#)", item.effective_duration),
            DurationSource::Default => format!("{} min (default)", item.effective_duration),
        };

        Self {
            rank: item.rank,
            id: item.id.clone(),
            title: item.title.clone(),
            score: item.priority_score,
            tier: item.priority_tier.label().to_string(),
            duration,
            due: item
                .due_date
                .map(|due| due_date_text(due, today, DueDateStyle::Full))
                .unwrap_or_else(|| NONE.to_string()),
            block: item
                .assigned_focus_block_id
                .clone()
                .unwrap_or_else(|| NONE.to_string()),
        }
    }
}
