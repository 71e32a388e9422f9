//! Notification content and action handling inputs.

use super::due::time_until_due_label;
use crate::model::task::{Task, TaskId};
use serde::{Deserialize, Serialize};

const BODY_DESCRIPTION_MAX_CHARS: usize = 100;

/// Text the platform shows when a reminder fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    /// Also the platform notification id.
    pub task_id: TaskId,
    pub title: String,
    pub body: String,
}

impl NotificationContent {
    /// Builds reminder text for `task` as seen at `now_ms`.
    ///
    /// The body joins the (truncated) description with the time-until-due
    /// label, or falls back to `Due: <label>` for blank descriptions.
    pub fn for_task(task: &Task, now_ms: i64) -> Self {
        let label = time_until_due_label(task.due_at_ms, now_ms);
        let description = task.description.trim();
        let body = if description.is_empty() {
            format!("Due: {label}")
        } else {
            format!("{} • {label}", truncate_chars(description, BODY_DESCRIPTION_MAX_CHARS))
        };

        Self {
            task_id: task.id,
            title: format!("Reminder: {}", task.title),
            body,
        }
    }
}

/// Buttons offered on a reminder notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    /// Mark the task completed and drop its alarm.
    Complete,
    /// Push the due time back and re-arm the alarm.
    Snooze,
}

impl NotificationAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "complete" => Some(Self::Complete),
            "snooze" => Some(Self::Snooze),
            _ => None,
        }
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::{NotificationAction, NotificationContent};
    use crate::model::task::Task;
    use crate::reminder::due::HOUR_MS;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn content_without_description_uses_due_label() {
        let mut task = Task::new("Pay rent");
        task.id = 3;
        task.due_at_ms = NOW + 2 * HOUR_MS;

        let content = NotificationContent::for_task(&task, NOW);
        assert_eq!(content.task_id, 3);
        assert_eq!(content.title, "Reminder: Pay rent");
        assert_eq!(content.body, "Due: In 2 hours");
    }

    #[test]
    fn content_truncates_long_descriptions() {
        let mut task = Task::new("Read");
        task.due_at_ms = NOW + HOUR_MS;
        task.description = "ж".repeat(150);

        let content = NotificationContent::for_task(&task, NOW);
        let (description, label) = content.body.split_once(" • ").unwrap();
        assert_eq!(description.chars().count(), 103);
        assert!(description.ends_with("..."));
        assert_eq!(label, "In 1 hour");
    }

    #[test]
    fn action_parse_is_case_insensitive() {
        assert_eq!(
            NotificationAction::parse(" Complete "),
            Some(NotificationAction::Complete)
        );
        assert_eq!(
            NotificationAction::parse("SNOOZE"),
            Some(NotificationAction::Snooze)
        );
        assert_eq!(NotificationAction::parse("dismiss"), None);
    }
}
