//! Core domain logic for the to-do app.
//! This crate is the single source of truth for tasks, attachments,
//! reminders and user preferences.

pub mod db;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod service;
pub mod storage;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::attachment::{Attachment, AttachmentId, AttachmentValidationError, FileType};
pub use model::now_epoch_ms;
pub use model::task::{Task, TaskId, TaskValidationError};
pub use reminder::{
    plan_for_task, AlarmCommand, AlarmScheduler, InMemoryAlarmScheduler, NotificationAction,
    NotificationContent, RecordingAlarmScheduler, ReminderPlan, SchedulerError,
};
pub use repo::attachment_repo::{AttachmentRepository, SqliteAttachmentRepository};
pub use repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
pub use repo::task_repo::{
    SqliteTaskRepository, TaskListQuery, TaskRepository, TaskSortOrder, TaskStatusFilter,
};
pub use repo::{RepoError, RepoResult};
pub use service::attachment_service::{AttachmentService, AttachmentServiceError};
pub use service::reminder_service::{
    should_notify, ReminderError, ReminderResult, ReminderService,
};
pub use service::settings_service::{Settings, SettingsError, SettingsService, ThemeMode};
pub use service::task_service::{TaskDefaults, TaskDraft, TaskService, TaskServiceError};
pub use storage::{format_file_size, AttachmentStore, StorageError, StoredFile};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns the schema version this build migrates databases to.
pub fn schema_version() -> u32 {
    db::migrations::latest_version()
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping, schema_version};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn schema_version_counts_registered_migrations() {
        assert_eq!(schema_version(), 2);
    }
}
