// Due Date Text
//
// Relative, German-localized due date labels shared by every task list.

use chrono::{Datelike, NaiveDate, Weekday};

/// Display style for due-date text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DueDateStyle {
    /// Abbreviated weekday + short date, used in compact rows
    #[default]
    Compact,
    /// Full weekday + medium date, used in detail views
    Full,
}

/// Format a due date relative to `today`.
///
/// Returns "Heute", "Morgen", a weekday name for the rest of the current
/// (Monday-based) week, or a formatted date.
pub fn due_date_text(due: NaiveDate, today: NaiveDate, style: DueDateStyle) -> String {
    if due == today {
        return "Heute".to_string();
    }
    if today.succ_opt() == Some(due) {
        return "Morgen".to_string();
    }
    if due.iso_week() == today.iso_week() {
        return weekday_name(due.weekday(), style).to_string();
    }
    match style {
        DueDateStyle::Compact => due.format("%d.%m.%y").to_string(),
        DueDateStyle::Full => due.format("%d.%m.%Y").to_string(),
    }
}

pub fn is_due_today(due: NaiveDate, today: NaiveDate) -> bool {
    due == today
}

fn weekday_name(weekday: Weekday, style: DueDateStyle) -> &'static str {
    match (style, weekday) {
        (DueDateStyle::Compact, Weekday::Mon) => "Mo.",
        (DueDateStyle::Compact, Weekday::Tue) => "Di.",
        (DueDateStyle::Compact, Weekday::Wed) => "Mi.",
        (DueDateStyle::Compact, Weekday::Thu) => "Do.",
        (DueDateStyle::Compact, Weekday::Fri) => "Fr.",
        (DueDateStyle::Compact, Weekday::Sat) => "Sa.",
        (DueDateStyle::Compact, Weekday::Sun) => "So.",
        (DueDateStyle::Full, Weekday::Mon) => "Montag",
        (DueDateStyle::Full, Weekday::Tue) => "Dienstag",
        (DueDateStyle::Full, Weekday::Wed) => "Mittwoch",
        (DueDateStyle::Full, Weekday::Thu) => "Donnerstag",
        (DueDateStyle::Full, Weekday::Fri) => "Freitag",
        (DueDateStyle::Full, Weekday::Sat) => "Samstag",
        (DueDateStyle::Full, Weekday::Sun) => "Sonntag",
    }
}
