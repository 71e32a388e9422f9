//! Reminder plan computation.

use super::due::fire_time;
use crate::model::task::{Task, TaskId};
use serde::{Deserialize, Serialize};

/// One alarm the platform should register.
///
/// `task_id` is the alarm key: registering another plan for the same task
/// replaces this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPlan {
    pub task_id: TaskId,
    pub fire_at_ms: i64,
    pub due_at_ms: i64,
    pub title: String,
    pub description: String,
}

/// Computes the reminder plan for `task` at `now_ms`.
///
/// Returns `None` when notifications are disabled, the task is completed,
/// no due time is set, or the fire time is not in the future.
pub fn plan_for_task(task: &Task, now_ms: i64) -> Option<ReminderPlan> {
    if !task.notification_enabled || task.is_completed || task.due_at_ms <= 0 {
        return None;
    }

    let fire_at_ms = fire_time(task.due_at_ms, task.lead_minutes);
    if fire_at_ms <= now_ms {
        return None;
    }

    Some(ReminderPlan {
        task_id: task.id,
        fire_at_ms,
        due_at_ms: task.due_at_ms,
        title: task.title.clone(),
        description: task.description.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::plan_for_task;
    use crate::model::task::Task;
    use crate::reminder::due::MINUTE_MS;

    const NOW: i64 = 1_700_000_000_000;

    fn due_task(due_at_ms: i64, lead_minutes: u32) -> Task {
        let mut task = Task::new("water plants");
        task.id = 7;
        task.due_at_ms = due_at_ms;
        task.lead_minutes = lead_minutes;
        task
    }

    #[test]
    fn plans_future_fire_time() {
        let task = due_task(NOW + 60 * MINUTE_MS, 15);
        let plan = plan_for_task(&task, NOW).expect("future reminder should be planned");
        assert_eq!(plan.task_id, 7);
        assert_eq!(plan.fire_at_ms, NOW + 45 * MINUTE_MS);
        assert_eq!(plan.due_at_ms, task.due_at_ms);
    }

    #[test]
    fn skips_fire_time_in_the_past_or_now() {
        let task = due_task(NOW + 10 * MINUTE_MS, 15);
        assert!(plan_for_task(&task, NOW).is_none());

        let task = due_task(NOW + 15 * MINUTE_MS, 15);
        assert!(plan_for_task(&task, NOW).is_none());
    }

    #[test]
    fn skips_disabled_completed_and_undated_tasks() {
        let mut disabled = due_task(NOW + 60 * MINUTE_MS, 0);
        disabled.notification_enabled = false;
        assert!(plan_for_task(&disabled, NOW).is_none());

        let mut completed = due_task(NOW + 60 * MINUTE_MS, 0);
        completed.is_completed = true;
        assert!(plan_for_task(&completed, NOW).is_none());

        let undated = due_task(0, 0);
        assert!(plan_for_task(&undated, NOW).is_none());
    }
}
