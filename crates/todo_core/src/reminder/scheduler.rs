//! Platform alarm seam and in-process implementations.
//!
//! # Responsibility
//! - Abstract one-shot alarm registration keyed by task id.
//! - Provide an in-memory registry and a command recorder for shells that
//!   apply alarms themselves (mobile FFI).
//!
//! # Invariants
//! - `schedule` for an already-registered key replaces the previous alarm.
//! - `cancel` for an unknown key is a no-op.

use super::plan::ReminderPlan;
use crate::model::task::TaskId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

/// Failure reported by an alarm backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerError {
    pub message: String,
}

impl SchedulerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "alarm scheduler failed: {}", self.message)
    }
}

impl Error for SchedulerError {}

/// One-shot alarm backend keyed by task id.
pub trait AlarmScheduler {
    fn schedule(&self, plan: &ReminderPlan) -> Result<(), SchedulerError>;
    fn cancel(&self, task_id: TaskId) -> Result<(), SchedulerError>;
}

impl<S: AlarmScheduler + ?Sized> AlarmScheduler for &S {
    fn schedule(&self, plan: &ReminderPlan) -> Result<(), SchedulerError> {
        (**self).schedule(plan)
    }

    fn cancel(&self, task_id: TaskId) -> Result<(), SchedulerError> {
        (**self).cancel(task_id)
    }
}

/// Keyed alarm registry held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryAlarmScheduler {
    alarms: Mutex<BTreeMap<TaskId, ReminderPlan>>,
}

impl InMemoryAlarmScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the registered plan for `task_id`, if any.
    pub fn scheduled(&self, task_id: TaskId) -> Option<ReminderPlan> {
        self.lock().ok()?.get(&task_id).cloned()
    }

    /// Returns all registered plans ordered by task id.
    pub fn plans(&self) -> Vec<ReminderPlan> {
        self.lock()
            .map(|alarms| alarms.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|alarms| alarms.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<TaskId, ReminderPlan>>, SchedulerError> {
        self.alarms
            .lock()
            .map_err(|_| SchedulerError::new("alarm registry lock poisoned"))
    }
}

impl AlarmScheduler for InMemoryAlarmScheduler {
    fn schedule(&self, plan: &ReminderPlan) -> Result<(), SchedulerError> {
        self.lock()?.insert(plan.task_id, plan.clone());
        Ok(())
    }

    fn cancel(&self, task_id: TaskId) -> Result<(), SchedulerError> {
        self.lock()?.remove(&task_id);
        Ok(())
    }
}

/// Alarm mutation the platform shell must apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlarmCommand {
    Schedule(ReminderPlan),
    Cancel { task_id: TaskId },
}

/// Records alarm mutations in call order instead of applying them.
#[derive(Debug, Default)]
pub struct RecordingAlarmScheduler {
    commands: Mutex<Vec<AlarmCommand>>,
}

impl RecordingAlarmScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains recorded commands in call order.
    pub fn take_commands(&self) -> Vec<AlarmCommand> {
        self.commands
            .lock()
            .map(|mut commands| std::mem::take(&mut *commands))
            .unwrap_or_default()
    }

    fn push(&self, command: AlarmCommand) -> Result<(), SchedulerError> {
        self.commands
            .lock()
            .map_err(|_| SchedulerError::new("alarm command log lock poisoned"))?
            .push(command);
        Ok(())
    }
}

impl AlarmScheduler for RecordingAlarmScheduler {
    fn schedule(&self, plan: &ReminderPlan) -> Result<(), SchedulerError> {
        self.push(AlarmCommand::Schedule(plan.clone()))
    }

    fn cancel(&self, task_id: TaskId) -> Result<(), SchedulerError> {
        self.push(AlarmCommand::Cancel { task_id })
    }
}

#[cfg(test)]
mod tests {
    use super::{AlarmCommand, AlarmScheduler, InMemoryAlarmScheduler, RecordingAlarmScheduler};
    use crate::reminder::plan::ReminderPlan;

    fn plan(task_id: i64, fire_at_ms: i64) -> ReminderPlan {
        ReminderPlan {
            task_id,
            fire_at_ms,
            due_at_ms: fire_at_ms + 1,
            title: "t".to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn in_memory_schedule_replaces_by_key() {
        let scheduler = InMemoryAlarmScheduler::new();
        scheduler.schedule(&plan(1, 100)).unwrap();
        scheduler.schedule(&plan(1, 200)).unwrap();
        scheduler.schedule(&plan(2, 300)).unwrap();

        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.scheduled(1).unwrap().fire_at_ms, 200);
    }

    #[test]
    fn in_memory_cancel_unknown_key_is_noop() {
        let scheduler = InMemoryAlarmScheduler::new();
        scheduler.cancel(42).unwrap();
        assert!(scheduler.is_empty());
    }

    #[test]
    fn recorder_keeps_call_order_and_drains() {
        let recorder = RecordingAlarmScheduler::new();
        recorder.cancel(5).unwrap();
        recorder.schedule(&plan(5, 100)).unwrap();

        let commands = recorder.take_commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], AlarmCommand::Cancel { task_id: 5 });
        assert!(matches!(&commands[1], AlarmCommand::Schedule(p) if p.fire_at_ms == 100));
        assert!(recorder.take_commands().is_empty());
    }

    #[test]
    fn alarm_command_serializes_with_kind_tag() {
        let json = serde_json::to_value(AlarmCommand::Cancel { task_id: 9 }).unwrap();
        assert_eq!(json["kind"], "cancel");
        assert_eq!(json["task_id"], 9);
    }
}
