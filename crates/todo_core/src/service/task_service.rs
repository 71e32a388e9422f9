//! Task use-case service.
//!
//! # Responsibility
//! - Provide create/edit/complete/browse entry points for tasks.
//! - Apply user defaults (category, lead time) to new tasks.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Returned tasks are read back from storage after writes.

use crate::model::task::{Task, TaskId, DEFAULT_CATEGORY, DEFAULT_LEAD_MINUTES};
use crate::repo::task_repo::{TaskListQuery, TaskRepository, TaskSortOrder, TaskStatusFilter};
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    TaskNotFound(TaskId),
    Repo(RepoError),
    /// Write succeeded but read-back did not find the row.
    InconsistentState(&'static str),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Values applied when a draft leaves a field unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefaults {
    pub category: String,
    pub lead_minutes: u32,
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            lead_minutes: DEFAULT_LEAD_MINUTES,
        }
    }
}

/// Input for creating one task.
///
/// Defaults match [`Task::new`]: reminders enabled, no due time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    /// Epoch milliseconds, `0` for no due time.
    pub due_at_ms: i64,
    /// Falls back to [`TaskDefaults::category`] when `None` or blank.
    pub category: Option<String>,
    pub notification_enabled: bool,
    /// Falls back to [`TaskDefaults::lead_minutes`] when `None`.
    pub lead_minutes: Option<u32>,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            due_at_ms: 0,
            category: None,
            notification_enabled: true,
            lead_minutes: None,
        }
    }
}

/// Task service facade over repository implementations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a task from `draft`, filling unset fields from `defaults`.
    pub fn create_task(
        &self,
        draft: &TaskDraft,
        defaults: &TaskDefaults,
    ) -> Result<Task, TaskServiceError> {
        let mut task = Task::new(draft.title.trim());
        task.description = draft.description.trim().to_string();
        task.due_at_ms = draft.due_at_ms;
        task.notification_enabled = draft.notification_enabled;
        task.lead_minutes = draft.lead_minutes.unwrap_or(defaults.lead_minutes);
        task.category = draft
            .category
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.category.as_str())
            .to_string();

        let id = self.repo.create_task(&task)?;
        info!("event=task_create module=service status=ok task_id={id}");
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::InconsistentState(
                "created task not found in read-back",
            ))
    }

    /// Replaces editable task fields and returns the stored task.
    pub fn update_task(&self, task: &Task) -> Result<Task, TaskServiceError> {
        self.repo.update_task(task)?;
        self.repo
            .get_task(task.id)?
            .ok_or(TaskServiceError::InconsistentState(
                "updated task not found in read-back",
            ))
    }

    pub fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.repo.get_task(id)
    }

    /// Deletes a task row; attachment rows cascade.
    pub fn delete_task(&self, id: TaskId) -> Result<(), TaskServiceError> {
        self.repo.delete_task(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    /// Sets the completion flag explicitly.
    pub fn set_completed(&self, id: TaskId, completed: bool) -> Result<Task, TaskServiceError> {
        self.repo.set_completed(id, completed)?;
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    /// Flips the completion flag and returns the stored task.
    pub fn toggle_completed(&self, id: TaskId) -> Result<Task, TaskServiceError> {
        let mut task = self
            .repo
            .get_task(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))?;
        let completed = task.toggle_completed();
        self.set_completed(id, completed)
    }

    pub fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        self.repo.list_tasks(query)
    }

    /// Substring search over title and description, earliest due first.
    ///
    /// Blank input lists every task.
    pub fn search_tasks(&self, text: &str) -> RepoResult<Vec<Task>> {
        self.repo.list_tasks(&TaskListQuery {
            text: Some(text.to_string()),
            ..TaskListQuery::default()
        })
    }

    /// Lists tasks the way the main screen shows them.
    pub fn filtered_tasks(
        &self,
        show_completed: bool,
        category: Option<&str>,
        sort: TaskSortOrder,
    ) -> RepoResult<Vec<Task>> {
        let status = if show_completed {
            TaskStatusFilter::All
        } else {
            TaskStatusFilter::Incomplete
        };
        self.repo.list_tasks(&TaskListQuery {
            status,
            category: category.map(str::to_string),
            sort,
            ..TaskListQuery::default()
        })
    }

    pub fn list_categories(&self) -> RepoResult<Vec<String>> {
        self.repo.list_categories()
    }

    pub fn incomplete_count(&self) -> RepoResult<u64> {
        self.repo.incomplete_count()
    }

    pub fn tasks_for_notification(&self, now_ms: i64) -> RepoResult<Vec<Task>> {
        self.repo.tasks_for_notification(now_ms)
    }

    /// Borrow the underlying repository for composition with other
    /// services.
    pub fn repo(&self) -> &R {
        &self.repo
    }
}
