//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, filter, search and reminder-candidate queries over
//!   the `tasks` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `has_attachments` is owned by the attachment repository; task
//!   updates never overwrite it.

use super::{bool_to_int, ensure_table_ready, int_to_bool, RepoError, RepoResult};
use crate::model::task::{Task, TaskId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    created_at,
    due_at,
    is_completed,
    notification_enabled,
    lead_minutes,
    category,
    has_attachments
FROM tasks";

const TASK_COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "created_at",
    "due_at",
    "is_completed",
    "notification_enabled",
    "lead_minutes",
    "category",
    "has_attachments",
];

/// Completion-state filter for task lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskStatusFilter {
    #[default]
    All,
    Incomplete,
    Completed,
}

/// Ordering applied to task lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskSortOrder {
    /// Earliest due time first.
    #[default]
    DueTime,
    /// Newest task first.
    CreationTime,
}

impl TaskSortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DueTime => "due_time",
            Self::CreationTime => "creation_time",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "due_time" => Some(Self::DueTime),
            "creation_time" => Some(Self::CreationTime),
            _ => None,
        }
    }
}

/// Query options for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub status: TaskStatusFilter,
    /// Exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring over title and description.
    pub text: Option<String>,
    pub sort: TaskSortOrder,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for task operations.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Hard-deletes a task; attachment rows go with it.
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    fn set_completed(&self, id: TaskId, completed: bool) -> RepoResult<()>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    fn list_categories(&self) -> RepoResult<Vec<String>>;
    fn incomplete_count(&self) -> RepoResult<u64>;
    /// Enabled, incomplete tasks whose due time is after `now_ms`.
    fn tasks_for_notification(&self, now_ms: i64) -> RepoResult<Vec<Task>>;
}

/// SQLite-backed task repository.
#[derive(Clone, Copy)]
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "tasks", TASK_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                title,
                description,
                created_at,
                due_at,
                is_completed,
                notification_enabled,
                lead_minutes,
                category,
                has_attachments
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0);",
            params![
                task.title.as_str(),
                task.description.as_str(),
                task.created_at_ms,
                task.due_at_ms,
                bool_to_int(task.is_completed),
                bool_to_int(task.notification_enabled),
                i64::from(task.lead_minutes),
                task.category.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                due_at = ?3,
                is_completed = ?4,
                notification_enabled = ?5,
                lead_minutes = ?6,
                category = ?7
             WHERE id = ?8;",
            params![
                task.title.as_str(),
                task.description.as_str(),
                task.due_at_ms,
                bool_to_int(task.is_completed),
                bool_to_int(task.notification_enabled),
                i64::from(task.lead_minutes),
                task.category.as_str(),
                task.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::TaskNotFound(task.id));
        }

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn set_completed(&self, id: TaskId, completed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET is_completed = ?1 WHERE id = ?2;",
            params![bool_to_int(completed), id],
        )?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match query.status {
            TaskStatusFilter::All => {}
            TaskStatusFilter::Incomplete => sql.push_str(" AND is_completed = 0"),
            TaskStatusFilter::Completed => sql.push_str(" AND is_completed = 1"),
        }

        if let Some(category) = query.category.as_ref() {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.clone()));
        }

        if let Some(text) = query.text.as_deref().map(str::trim) {
            if !text.is_empty() {
                let pattern = like_pattern(text);
                sql.push_str(
                    " AND (title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')",
                );
                bind_values.push(Value::Text(pattern.clone()));
                bind_values.push(Value::Text(pattern));
            }
        }

        match query.sort {
            TaskSortOrder::DueTime => sql.push_str(" ORDER BY due_at ASC, id ASC"),
            TaskSortOrder::CreationTime => sql.push_str(" ORDER BY created_at DESC, id DESC"),
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn list_categories(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT category FROM tasks ORDER BY category ASC;")?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(row.get(0)?);
        }
        Ok(categories)
    }

    fn incomplete_count(&self) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE is_completed = 0;",
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative task count `{count}`")))
    }

    fn tasks_for_notification(&self, now_ms: i64) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE notification_enabled = 1
               AND is_completed = 0
               AND due_at > ?1
             ORDER BY due_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([now_ms])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let lead_raw: i64 = row.get("lead_minutes")?;
    let lead_minutes = u32::try_from(lead_raw).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid lead time `{lead_raw}` in tasks.lead_minutes"
        ))
    })?;

    let task = Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        created_at_ms: row.get("created_at")?,
        due_at_ms: row.get("due_at")?,
        is_completed: int_to_bool(row.get("is_completed")?, "tasks.is_completed")?,
        notification_enabled: int_to_bool(
            row.get("notification_enabled")?,
            "tasks.notification_enabled",
        )?,
        lead_minutes,
        category: row.get("category")?,
        has_attachments: int_to_bool(row.get("has_attachments")?, "tasks.has_attachments")?,
    };
    task.validate()?;
    Ok(task)
}

/// Wraps user text into a `LIKE` substring pattern with `\` escaping.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::{like_pattern, TaskSortOrder};

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("milk"), "%milk%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn sort_order_labels_roundtrip() {
        for order in [TaskSortOrder::DueTime, TaskSortOrder::CreationTime] {
            assert_eq!(TaskSortOrder::parse(order.as_str()), Some(order));
        }
        assert_eq!(TaskSortOrder::parse("priority"), None);
    }
}
