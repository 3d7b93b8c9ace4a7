// Recurrence Rules
//
// Computes the due date of the next instance of a recurring task and builds
// that instance from the completed one.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

use super::attributes::RecurrencePattern;
use super::task::{Task, LAST_DAY_OF_MONTH};

/// Calculate the next due date after `base`.
///
/// Returns `None` for non-recurring tasks.
///
/// * `weekdays` - selection for weekly/biweekly (1=Mon .. 7=Sun)
/// * `month_day` - day for month-based patterns (1..=31, 32 = last day)
pub fn next_due_date(
    pattern: RecurrencePattern,
    weekdays: Option<&[u8]>,
    month_day: Option<u8>,
    base: NaiveDate,
) -> Option<NaiveDate> {
    match pattern {
        RecurrencePattern::Never => None,
        RecurrencePattern::Daily => base.checked_add_days(Days::new(1)),
        RecurrencePattern::Weekdays => next_matching_day(base, |d| {
            !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
        }),
        RecurrencePattern::Weekends => next_matching_day(base, |d| {
            matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
        }),
        RecurrencePattern::Weekly => next_selected_weekday(base, weekdays, 0)
            .or_else(|| base.checked_add_days(Days::new(7))),
        RecurrencePattern::Biweekly => next_selected_weekday(base, weekdays, 1)
            .or_else(|| base.checked_add_days(Days::new(14))),
        RecurrencePattern::Monthly => add_months(base, 1, month_day),
        RecurrencePattern::Quarterly => add_months(base, 3, month_day),
        RecurrencePattern::Semiannually => add_months(base, 6, month_day),
        RecurrencePattern::Yearly => add_months(base, 12, month_day),
    }
}

/// Build the next instance of a completed recurring task.
///
/// Copies the task's attributes into a fresh, incomplete task due on the next
/// date of the series. The series id is assigned lazily: a completed task
/// without one starts a series named after its own id.
pub fn next_instance(
    completed: &mut Task,
    new_id: impl Into<String>,
    now_millis: i64,
    today: NaiveDate,
) -> Option<Task> {
    if !completed.is_recurring() {
        return None;
    }

    let base = completed.due_date.unwrap_or(today);
    let due_date = next_due_date(
        completed.recurrence_pattern,
        completed.recurrence_weekdays.as_deref(),
        completed.recurrence_month_day,
        base,
    );

    let group_id = completed
        .recurrence_group_id
        .get_or_insert_with(|| completed.id.clone())
        .clone();

    let mut instance = Task::new(new_id, now_millis, completed.title.clone());
    instance.importance = completed.importance;
    instance.tags = completed.tags.clone();
    instance.due_date = due_date;
    instance.estimated_duration = completed.estimated_duration;
    instance.urgency = completed.urgency;
    instance.task_type = completed.task_type;
    instance.recurrence_pattern = completed.recurrence_pattern;
    instance.recurrence_weekdays = completed.recurrence_weekdays.clone();
    instance.recurrence_month_day = completed.recurrence_month_day;
    instance.recurrence_group_id = Some(group_id);
    instance.description = completed.description.clone();
    instance.source_system = completed.source_system;
    Some(instance)
}

/// First day strictly after `base` matching the predicate (within one week)
fn next_matching_day(base: NaiveDate, matches: impl Fn(NaiveDate) -> bool) -> Option<NaiveDate> {
    (1..=7)
        .filter_map(|n| base.checked_add_days(Days::new(n)))
        .find(|d| matches(*d))
}

/// Next selected weekday after `base`; `extra_weeks` adds whole weeks (biweekly = 1).
fn next_selected_weekday(
    base: NaiveDate,
    weekdays: Option<&[u8]>,
    extra_weeks: u64,
) -> Option<NaiveDate> {
    let mut selected: Vec<u8> = weekdays?
        .iter()
        .copied()
        .filter(|d| (1..=7).contains(d))
        .collect();
    selected.sort_unstable();
    selected.dedup();

    let current = base.weekday().number_from_monday() as u64;

    let days_ahead = match selected.iter().map(|&d| u64::from(d)).find(|&d| d > current) {
        Some(later_this_week) => later_this_week - current,
        // Wrap around into the next cycle
        None => 7 - current + u64::from(*selected.first()?),
    };

    base.checked_add_days(Days::new(days_ahead + extra_weeks * 7))
}

/// Move `base` forward by whole months, clamping the day to the target month
fn add_months(base: NaiveDate, months: u32, month_day: Option<u8>) -> Option<NaiveDate> {
    let first_of_target = base
        .with_day(1)?
        .checked_add_months(Months::new(months))?;
    let last_day = days_in_month(first_of_target)?;

    let day = match month_day {
        Some(LAST_DAY_OF_MONTH) => last_day,
        Some(d) => u32::from(d).min(last_day),
        None => base.day().min(last_day),
    };

    first_of_target.with_day(day)
}

fn days_in_month(first_of_month: NaiveDate) -> Option<u32> {
    let first_of_next = first_of_month.checked_add_months(Months::new(1))?;
    first_of_next.pred_opt().map(|d| d.day())
}
