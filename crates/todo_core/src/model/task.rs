//! Task domain model.
//!
//! # Responsibility
//! - Define the to-do record shared by list, detail and reminder flows.
//! - Provide validation and small lifecycle helpers.
//!
//! # Invariants
//! - `title` and `category` are never blank once persisted.
//! - `due_at_ms == 0` means the task has no due time.
//! - `lead_minutes` never exceeds [`MAX_LEAD_MINUTES`].

use super::now_epoch_ms;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned task identifier. Also used as the reminder alarm key.
pub type TaskId = i64;

/// Category assigned to tasks created without an explicit one.
pub const DEFAULT_CATEGORY: &str = "General";
/// Reminder lead time used when the caller does not pick one.
pub const DEFAULT_LEAD_MINUTES: u32 = 15;
/// Upper bound for reminder lead time (one week).
pub const MAX_LEAD_MINUTES: u32 = 7 * 24 * 60;

/// A user-created to-do item with an optional due time and reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// `0` until the task is persisted.
    pub id: TaskId,
    pub title: String,
    pub description: String,
    /// Creation time in epoch milliseconds.
    pub created_at_ms: i64,
    /// Due time in epoch milliseconds, `0` when unset.
    pub due_at_ms: i64,
    pub is_completed: bool,
    pub notification_enabled: bool,
    /// Minutes before `due_at_ms` at which the reminder fires.
    pub lead_minutes: u32,
    pub category: String,
    /// Maintained by the attachment repository, not by callers.
    pub has_attachments: bool,
}

/// Validation errors for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    BlankTitle,
    BlankCategory,
    NegativeDueTime(i64),
    LeadTimeTooLong(u32),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::BlankCategory => write!(f, "task category must not be blank"),
            Self::NegativeDueTime(value) => {
                write!(f, "task due time must not be negative, got {value}")
            }
            Self::LeadTimeTooLong(value) => write!(
                f,
                "reminder lead time {value} exceeds maximum of {MAX_LEAD_MINUTES} minutes"
            ),
        }
    }
}

impl Error for TaskValidationError {}

impl Task {
    /// Creates an unsaved task with default reminder settings.
    ///
    /// Notifications start enabled with a 15 minute lead time, the task has
    /// no due time and belongs to [`DEFAULT_CATEGORY`].
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: String::new(),
            created_at_ms: now_epoch_ms(),
            due_at_ms: 0,
            is_completed: false,
            notification_enabled: true,
            lead_minutes: DEFAULT_LEAD_MINUTES,
            category: DEFAULT_CATEGORY.to_string(),
            has_attachments: false,
        }
    }

    /// Validates record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::BlankTitle);
        }
        if self.category.trim().is_empty() {
            return Err(TaskValidationError::BlankCategory);
        }
        if self.due_at_ms < 0 {
            return Err(TaskValidationError::NegativeDueTime(self.due_at_ms));
        }
        if self.lead_minutes > MAX_LEAD_MINUTES {
            return Err(TaskValidationError::LeadTimeTooLong(self.lead_minutes));
        }
        Ok(())
    }

    /// Returns whether a due time is set.
    pub fn has_due_time(&self) -> bool {
        self.due_at_ms > 0
    }

    /// Returns whether the task is past due at `now_ms`.
    pub fn is_overdue(&self, now_ms: i64) -> bool {
        self.has_due_time() && self.due_at_ms < now_ms
    }

    /// Flips the completion flag and returns the new value.
    pub fn toggle_completed(&mut self) -> bool {
        self.is_completed = !self.is_completed;
        self.is_completed
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskValidationError, DEFAULT_CATEGORY, MAX_LEAD_MINUTES};

    #[test]
    fn new_task_uses_reminder_defaults() {
        let task = Task::new("buy milk");
        assert_eq!(task.id, 0);
        assert!(task.notification_enabled);
        assert_eq!(task.lead_minutes, 15);
        assert_eq!(task.category, DEFAULT_CATEGORY);
        assert!(!task.has_due_time());
        assert!(task.created_at_ms > 0);
    }

    #[test]
    fn validate_rejects_blank_title_and_category() {
        let blank = Task::new("   ");
        assert_eq!(blank.validate(), Err(TaskValidationError::BlankTitle));

        let mut no_category = Task::new("ok");
        no_category.category = " ".to_string();
        assert_eq!(
            no_category.validate(),
            Err(TaskValidationError::BlankCategory)
        );
    }

    #[test]
    fn validate_rejects_out_of_range_times() {
        let mut task = Task::new("ok");
        task.due_at_ms = -1;
        assert!(matches!(
            task.validate(),
            Err(TaskValidationError::NegativeDueTime(-1))
        ));

        task.due_at_ms = 10;
        task.lead_minutes = MAX_LEAD_MINUTES + 1;
        assert!(matches!(
            task.validate(),
            Err(TaskValidationError::LeadTimeTooLong(_))
        ));
    }

    #[test]
    fn overdue_requires_due_time_in_the_past() {
        let mut task = Task::new("ok");
        assert!(!task.is_overdue(1_000));

        task.due_at_ms = 500;
        assert!(task.is_overdue(1_000));
        assert!(!task.is_overdue(500));
    }

    #[test]
    fn toggle_completed_flips_flag() {
        let mut task = Task::new("ok");
        assert!(task.toggle_completed());
        assert!(!task.toggle_completed());
    }
}
