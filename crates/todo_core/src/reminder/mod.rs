//! Reminder planning for task due times.
//!
//! # Responsibility
//! - Compute when a task reminder should fire.
//! - Define the platform alarm seam ([`AlarmScheduler`]) keyed by task id.
//! - Shape notification content and notification actions.
//!
//! # Invariants
//! - At most one alarm exists per task id; scheduling replaces.
//! - Fire times at or before "now" are never registered.
//! - Completed or notification-disabled tasks never get an alarm.

pub mod due;
pub mod notification;
pub mod plan;
pub mod scheduler;

pub use notification::{NotificationAction, NotificationContent};
pub use plan::{plan_for_task, ReminderPlan};
pub use scheduler::{
    AlarmCommand, AlarmScheduler, InMemoryAlarmScheduler, RecordingAlarmScheduler,
    SchedulerError,
};
