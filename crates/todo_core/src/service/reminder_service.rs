//! Reminder use-case service.
//!
//! # Responsibility
//! - Keep platform alarms in step with task edits.
//! - Rebuild every alarm after a device reboot.
//! - Resolve alarm fires and notification actions against storage.
//!
//! # Invariants
//! - Every reschedule cancels the task key first, so stale alarms never
//!   survive an edit that disables the reminder.
//! - Only metadata (task id, times) is logged, never task text.

use crate::model::task::{Task, TaskId};
use crate::reminder::due::{MINUTE_MS, SNOOZE_MINUTES};
use crate::reminder::{
    plan_for_task, AlarmScheduler, NotificationAction, NotificationContent, ReminderPlan,
    SchedulerError,
};
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ReminderResult<T> = Result<T, ReminderError>;

/// Reminder service failures.
#[derive(Debug)]
pub enum ReminderError {
    Scheduler(SchedulerError),
    Repo(RepoError),
}

impl Display for ReminderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduler(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReminderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Scheduler(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<SchedulerError> for ReminderError {
    fn from(value: SchedulerError) -> Self {
        Self::Scheduler(value)
    }
}

impl From<RepoError> for ReminderError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Reminder orchestration over an [`AlarmScheduler`] backend.
pub struct ReminderService<S: AlarmScheduler> {
    scheduler: S,
}

impl<S: AlarmScheduler> ReminderService<S> {
    pub fn new(scheduler: S) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Registers the task alarm when a plan exists.
    ///
    /// Returns the registered plan, or `None` when nothing needs to fire.
    pub fn schedule_task(&self, task: &Task, now_ms: i64) -> ReminderResult<Option<ReminderPlan>> {
        let Some(plan) = plan_for_task(task, now_ms) else {
            return Ok(None);
        };
        self.scheduler.schedule(&plan)?;
        info!(
            "event=reminder_schedule module=reminder status=ok task_id={} fire_at_ms={}",
            plan.task_id, plan.fire_at_ms
        );
        Ok(Some(plan))
    }

    /// Unregisters the task alarm. Unknown keys are fine.
    pub fn cancel_task(&self, task_id: TaskId) -> ReminderResult<()> {
        self.scheduler.cancel(task_id)?;
        info!("event=reminder_cancel module=reminder status=ok task_id={task_id}");
        Ok(())
    }

    /// Cancels then re-plans the alarm after any task edit.
    pub fn reschedule_task(
        &self,
        task: &Task,
        now_ms: i64,
    ) -> ReminderResult<Option<ReminderPlan>> {
        self.cancel_task(task.id)?;
        self.schedule_task(task, now_ms)
    }

    /// Schedules every enabled, incomplete task in `tasks`.
    ///
    /// Returns how many alarms were registered.
    pub fn reschedule_all(&self, tasks: &[Task], now_ms: i64) -> ReminderResult<usize> {
        let mut scheduled = 0;
        for task in tasks
            .iter()
            .filter(|task| task.notification_enabled && !task.is_completed)
        {
            if self.schedule_task(task, now_ms)?.is_some() {
                scheduled += 1;
            }
        }
        info!(
            "event=reminder_reschedule_all module=reminder status=ok candidates={} scheduled={scheduled}",
            tasks.len()
        );
        Ok(scheduled)
    }

    /// Boot recovery: rebuilds alarms from stored reminder candidates.
    pub fn restore_after_boot<R: TaskRepository>(
        &self,
        repo: &R,
        now_ms: i64,
    ) -> ReminderResult<usize> {
        let tasks = repo.tasks_for_notification(now_ms)?;
        self.reschedule_all(&tasks, now_ms)
    }

    /// Resolves an alarm fire into notification content.
    ///
    /// Returns `None` when the task was deleted, completed or had its
    /// reminder disabled after the alarm was registered.
    pub fn on_alarm_fired<R: TaskRepository>(
        &self,
        repo: &R,
        task_id: TaskId,
        now_ms: i64,
    ) -> ReminderResult<Option<NotificationContent>> {
        let Some(task) = repo.get_task(task_id)? else {
            warn!("event=reminder_fire module=reminder status=skip task_id={task_id} reason=missing");
            return Ok(None);
        };
        if !should_notify(&task) {
            info!("event=reminder_fire module=reminder status=skip task_id={task_id} reason=inactive");
            return Ok(None);
        }
        Ok(Some(NotificationContent::for_task(&task, now_ms)))
    }

    /// Applies a notification button press.
    ///
    /// Returns the updated task, or `None` when the task is gone or
    /// already completed.
    pub fn handle_action<R: TaskRepository>(
        &self,
        repo: &R,
        task_id: TaskId,
        action: NotificationAction,
        now_ms: i64,
    ) -> ReminderResult<Option<Task>> {
        let Some(mut task) = repo.get_task(task_id)? else {
            return Ok(None);
        };
        if task.is_completed {
            return Ok(None);
        }

        match action {
            NotificationAction::Complete => {
                repo.set_completed(task_id, true)?;
                task.is_completed = true;
                self.cancel_task(task_id)?;
            }
            NotificationAction::Snooze => {
                task.due_at_ms = snoozed_due_time(task.due_at_ms);
                repo.update_task(&task)?;
                self.reschedule_task(&task, now_ms)?;
            }
        }

        info!(
            "event=reminder_action module=reminder status=ok task_id={task_id} action={action:?}"
        );
        Ok(Some(task))
    }
}

/// Whether a fired alarm should still surface a notification.
pub fn should_notify(task: &Task) -> bool {
    task.notification_enabled && !task.is_completed
}

fn snoozed_due_time(due_at_ms: i64) -> i64 {
    due_at_ms.saturating_add(i64::from(SNOOZE_MINUTES) * MINUTE_MS)
}

#[cfg(test)]
mod tests {
    use super::{should_notify, snoozed_due_time};
    use crate::model::task::Task;

    #[test]
    fn snooze_adds_fifteen_minutes() {
        assert_eq!(snoozed_due_time(1_000), 1_000 + 15 * 60 * 1000);
    }

    #[test]
    fn should_notify_requires_enabled_incomplete_task() {
        let mut task = Task::new("x");
        assert!(should_notify(&task));
        task.notification_enabled = false;
        assert!(!should_notify(&task));
        task.notification_enabled = true;
        task.is_completed = true;
        assert!(!should_notify(&task));
    }
}
