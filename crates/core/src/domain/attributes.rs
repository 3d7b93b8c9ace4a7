// Task Attribute Types
//
// Every enum here is stored as text (or a small integer for Importance) both in
// JSON and in SQLite. The text values are shared by every platform.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::DomainError;

/// Implements Display and FromStr through the enum's `as_str` / `ALL` table.
macro_rules! text_enum {
    ($ty:ty, $field:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| DomainError::UnknownValue {
                        field: $field,
                        value: s.to_string(),
                    })
            }
        }
    };
}

/// Importance for the Eisenhower matrix (1=low, 2=medium, 3=high)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Importance {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Importance {
    pub const ALL: [Importance; 3] = [Importance::Low, Importance::Medium, Importance::High];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Importance::Low => "Niedrig",
            Importance::Medium => "Mittel",
            Importance::High => "Hoch",
        }
    }
}

impl TryFrom<i64> for Importance {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Importance::Low),
            2 => Ok(Importance::Medium),
            3 => Ok(Importance::High),
            other => Err(DomainError::InvalidImportance(other)),
        }
    }
}

impl TryFrom<u8> for Importance {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Importance::try_from(i64::from(value))
    }
}

impl From<Importance> for u8 {
    fn from(value: Importance) -> Self {
        value.value()
    }
}

/// Urgency for the Eisenhower matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Urgent,
    NotUrgent,
}

impl Urgency {
    pub const ALL: [Urgency; 2] = [Urgency::Urgent, Urgency::NotUrgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Urgent => "urgent",
            Urgency::NotUrgent => "not_urgent",
        }
    }
}

text_enum!(Urgency, "urgency");

/// Life-area classification of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Income,
    Maintenance,
    Recharge,
    Learning,
    GivingBack,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::Income,
        TaskType::Maintenance,
        TaskType::Recharge,
        TaskType::Learning,
        TaskType::GivingBack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Income => "income",
            TaskType::Maintenance => "maintenance",
            TaskType::Recharge => "recharge",
            TaskType::Learning => "learning",
            TaskType::GivingBack => "giving_back",
        }
    }

    /// Display category (title + color) shown next to the task
    pub fn category(self) -> Category {
        match self {
            TaskType::Income => Category::new("Earn", "green"),
            TaskType::Maintenance => Category::new("Essentials", "orange"),
            TaskType::Recharge => Category::new("Self Care", "cyan"),
            TaskType::Learning => Category::new("Learn", "purple"),
            TaskType::GivingBack => Category::new("Social", "pink"),
        }
    }
}

text_enum!(TaskType, "task_type");

/// Presentation category derived from a TaskType
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub title: &'static str,
    pub color: &'static str,
}

impl Category {
    const fn new(title: &'static str, color: &'static str) -> Self {
        Self { title, color }
    }
}

/// Backend a task record originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSystem {
    #[default]
    Local,
    Notion,
    Todoist,
}

impl SourceSystem {
    pub const ALL: [SourceSystem; 3] = [
        SourceSystem::Local,
        SourceSystem::Notion,
        SourceSystem::Todoist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceSystem::Local => "local",
            SourceSystem::Notion => "notion",
            SourceSystem::Todoist => "todoist",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SourceSystem::Local => "Lokale Tasks",
            SourceSystem::Notion => "Notion",
            SourceSystem::Todoist => "Todoist",
        }
    }
}

text_enum!(SourceSystem, "source_system");

/// How a task repeats after completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    #[default]
    #[serde(rename = "none")]
    Never,
    Daily,
    Weekdays,
    Weekends,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Semiannually,
    Yearly,
}

impl RecurrencePattern {
    pub const ALL: [RecurrencePattern; 10] = [
        RecurrencePattern::Never,
        RecurrencePattern::Daily,
        RecurrencePattern::Weekdays,
        RecurrencePattern::Weekends,
        RecurrencePattern::Weekly,
        RecurrencePattern::Biweekly,
        RecurrencePattern::Monthly,
        RecurrencePattern::Quarterly,
        RecurrencePattern::Semiannually,
        RecurrencePattern::Yearly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecurrencePattern::Never => "none",
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekdays => "weekdays",
            RecurrencePattern::Weekends => "weekends",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Biweekly => "biweekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Quarterly => "quarterly",
            RecurrencePattern::Semiannually => "semiannually",
            RecurrencePattern::Yearly => "yearly",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RecurrencePattern::Never => "Nie",
            RecurrencePattern::Daily => "Täglich",
            RecurrencePattern::Weekdays => "An Wochentagen",
            RecurrencePattern::Weekends => "An Wochenenden",
            RecurrencePattern::Weekly => "Wöchentlich",
            RecurrencePattern::Biweekly => "Alle 2 Wochen",
            RecurrencePattern::Monthly => "Monatlich",
            RecurrencePattern::Quarterly => "Alle 3 Monate",
            RecurrencePattern::Semiannually => "Alle 6 Monate",
            RecurrencePattern::Yearly => "Jährlich",
        }
    }

    pub fn is_recurring(self) -> bool {
        self != RecurrencePattern::Never
    }

    /// Whether this pattern reads `recurrence_weekdays`
    pub fn requires_weekdays(self) -> bool {
        matches!(self, RecurrencePattern::Weekly | RecurrencePattern::Biweekly)
    }

    /// Whether this pattern reads `recurrence_month_day`
    pub fn requires_month_day(self) -> bool {
        matches!(
            self,
            RecurrencePattern::Monthly
                | RecurrencePattern::Quarterly
                | RecurrencePattern::Semiannually
                | RecurrencePattern::Yearly
        )
    }
}

text_enum!(RecurrencePattern, "recurrence_pattern");

/// Energy level estimated by the AI enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    High,
    Low,
}

impl EnergyLevel {
    pub const ALL: [EnergyLevel; 2] = [EnergyLevel::High, EnergyLevel::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            EnergyLevel::High => "high",
            EnergyLevel::Low => "low",
        }
    }
}

text_enum!(EnergyLevel, "ai_energy_level");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_values_round_trip_through_from_str() {
        for pattern in RecurrencePattern::ALL {
            assert_eq!(pattern.as_str().parse::<RecurrencePattern>().unwrap(), pattern);
        }
        for task_type in TaskType::ALL {
            assert_eq!(task_type.to_string().parse::<TaskType>().unwrap(), task_type);
        }
    }

    #[test]
    fn test_unknown_text_is_rejected() {
        let err = "sometimes".parse::<RecurrencePattern>().unwrap_err();
        assert_eq!(
            err,
            DomainError::UnknownValue {
                field: "recurrence_pattern",
                value: "sometimes".to_string()
            }
        );
    }

    #[test]
    fn test_serde_matches_stored_text() {
        assert_eq!(
            serde_json::to_value(RecurrencePattern::Never).unwrap(),
            serde_json::json!("none")
        );
        assert_eq!(
            serde_json::to_value(TaskType::GivingBack).unwrap(),
            serde_json::json!("giving_back")
        );
        assert_eq!(
            serde_json::to_value(Urgency::NotUrgent).unwrap(),
            serde_json::json!("not_urgent")
        );
        assert_eq!(serde_json::to_value(Importance::High).unwrap(), serde_json::json!(3));
    }

    #[test]
    fn test_importance_range() {
        assert!(Importance::try_from(0i64).is_err());
        assert_eq!(Importance::try_from(2i64).unwrap(), Importance::Medium);
        assert!(serde_json::from_value::<Importance>(serde_json::json!(4)).is_err());
    }

    #[test]
    fn test_category_is_derived_from_task_type() {
        let category = TaskType::Maintenance.category();
        assert_eq!(category.title, "Essentials");
        assert_eq!(category.color, "orange");
    }
}
