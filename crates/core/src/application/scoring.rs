// Priority Scoring
//
// Deterministic 0-100 score: Eisenhower (0-50) + deadline (0-25)
// + neglect (0-15) + completeness (0-5) + Next Up bonus (5).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Importance, Task, TaskType, Urgency};
use crate::port::time_provider::local_date;

pub const MAX_SCORE: u8 = 100;
pub const NEXT_UP_BONUS: u8 = 5;

/// Priority bucket derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    DoNow,
    PlanSoon,
    Eventually,
    Someday,
}

impl PriorityTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            60.. => PriorityTier::DoNow,
            35..=59 => PriorityTier::PlanSoon,
            10..=34 => PriorityTier::Eventually,
            _ => PriorityTier::Someday,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriorityTier::DoNow => "Sofort erledigen",
            PriorityTier::PlanSoon => "Bald einplanen",
            PriorityTier::Eventually => "Bei Gelegenheit",
            PriorityTier::Someday => "Irgendwann",
        }
    }
}

/// Full score for `task` as of `today`, capped at 100
pub fn calculate_score(task: &Task, today: NaiveDate) -> u8 {
    let total = eisenhower_score(task.importance, task.urgency)
        + deadline_score(task.due_date, today)
        + neglect_score(local_date(task.created_at), task.reschedule_count, today)
        + completeness_score(
            task.importance,
            task.urgency,
            task.estimated_duration,
            task.task_type,
        )
        + if task.is_next_up { NEXT_UP_BONUS } else { 0 };
    total.min(MAX_SCORE)
}

/// Importance x urgency matrix (0-50)
pub fn eisenhower_score(importance: Option<Importance>, urgency: Option<Urgency>) -> u8 {
    match (importance, urgency) {
        (Some(Importance::High), Some(Urgency::Urgent)) => 50,
        (Some(Importance::High), Some(Urgency::NotUrgent)) => 38,
        (Some(Importance::Medium), Some(Urgency::Urgent)) => 35,
        (Some(Importance::Low), Some(Urgency::Urgent)) => 30,
        (Some(Importance::Medium), Some(Urgency::NotUrgent)) => 20,
        (Some(Importance::Low), Some(Urgency::NotUrgent)) => 10,
        (None, Some(Urgency::Urgent)) => 25,
        (None, Some(Urgency::NotUrgent)) => 8,
        (Some(_), None) => 15,
        (None, None) => 0,
    }
}

/// Deadline pressure (0-25); overdue counts as due today
pub fn deadline_score(due_date: Option<NaiveDate>, today: NaiveDate) -> u8 {
    let Some(due) = due_date else {
        return 0;
    };
    match (due - today).num_days() {
        ..=0 => 25,
        1 => 22,
        2..=3 => 18,
        4..=7 => 12,
        8..=14 => 6,
        15..=30 => 3,
        _ => 0,
    }
}

/// Age (0-10, full after 30 days) plus reschedules (0-5)
pub fn neglect_score(created_on: NaiveDate, reschedule_count: u32, today: NaiveDate) -> u8 {
    let days_old = (today - created_on).num_days().max(0);
    let age = (days_old * 10 / 30).min(10) as u8;
    let reschedules = reschedule_count.min(5) as u8;
    age + reschedules
}

/// One point per filled attribute, plus one when all four are set (0-5)
pub fn completeness_score(
    importance: Option<Importance>,
    urgency: Option<Urgency>,
    duration: Option<u32>,
    task_type: Option<TaskType>,
) -> u8 {
    let filled = [
        importance.is_some(),
        urgency.is_some(),
        duration.is_some(),
        task_type.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count() as u8;

    if filled == 4 {
        5
    } else {
        filled
    }
}
