//! Attachment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist attachment rows linked to tasks.
//! - Keep `tasks.has_attachments` in sync with attachment rows.
//!
//! # Invariants
//! - Insert and delete update the owning task flag in the same transaction.
//! - Attachment lists are ordered by `created_at ASC, id ASC`.
//! - This repository never touches files on disk; see
//!   [`crate::storage::file_store`].

use super::{ensure_table_ready, RepoError, RepoResult};
use crate::model::attachment::{Attachment, AttachmentId, FileType};
use crate::model::task::TaskId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ATTACHMENT_SELECT_SQL: &str = "SELECT
    id,
    task_id,
    file_name,
    file_path,
    file_type,
    file_size,
    created_at
FROM attachments";

const ATTACHMENT_COLUMNS: &[&str] = &[
    "id",
    "task_id",
    "file_name",
    "file_path",
    "file_type",
    "file_size",
    "created_at",
];

/// Repository interface for attachment operations.
pub trait AttachmentRepository {
    fn create_attachment(&self, attachment: &Attachment) -> RepoResult<AttachmentId>;
    fn get_attachment(&self, id: AttachmentId) -> RepoResult<Option<Attachment>>;
    /// Deletes one attachment row and returns it, so callers can remove
    /// the stored file afterwards.
    fn delete_attachment(&self, id: AttachmentId) -> RepoResult<Attachment>;
    fn list_for_task(
        &self,
        task_id: TaskId,
        file_type: Option<FileType>,
    ) -> RepoResult<Vec<Attachment>>;
    fn count_for_task(&self, task_id: TaskId) -> RepoResult<u64>;
    fn file_paths_for_task(&self, task_id: TaskId) -> RepoResult<Vec<String>>;
}

/// SQLite-backed attachment repository.
#[derive(Clone, Copy)]
pub struct SqliteAttachmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttachmentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "attachments", ATTACHMENT_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl AttachmentRepository for SqliteAttachmentRepository<'_> {
    fn create_attachment(&self, attachment: &Attachment) -> RepoResult<AttachmentId> {
        attachment.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        if !task_exists(&tx, attachment.task_id)? {
            return Err(RepoError::TaskNotFound(attachment.task_id));
        }

        tx.execute(
            "INSERT INTO attachments (
                task_id,
                file_name,
                file_path,
                file_type,
                file_size,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                attachment.task_id,
                attachment.file_name.as_str(),
                attachment.file_path.as_str(),
                attachment.file_type.as_str(),
                attachment.file_size,
                attachment.created_at_ms,
            ],
        )?;
        let id = tx.last_insert_rowid();
        refresh_attachment_flag(&tx, attachment.task_id)?;
        tx.commit()?;

        Ok(id)
    }

    fn get_attachment(&self, id: AttachmentId) -> RepoResult<Option<Attachment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ATTACHMENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_attachment_row(row)?));
        }
        Ok(None)
    }

    fn delete_attachment(&self, id: AttachmentId) -> RepoResult<Attachment> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = {
            let mut stmt = tx.prepare(&format!("{ATTACHMENT_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            match rows.next()? {
                Some(row) => parse_attachment_row(row)?,
                None => return Err(RepoError::AttachmentNotFound(id)),
            }
        };

        tx.execute("DELETE FROM attachments WHERE id = ?1;", [id])?;
        refresh_attachment_flag(&tx, existing.task_id)?;
        tx.commit()?;

        Ok(existing)
    }

    fn list_for_task(
        &self,
        task_id: TaskId,
        file_type: Option<FileType>,
    ) -> RepoResult<Vec<Attachment>> {
        let mut sql = format!("{ATTACHMENT_SELECT_SQL} WHERE task_id = ?");
        let mut bind_values = vec![Value::Integer(task_id)];
        if let Some(file_type) = file_type {
            sql.push_str(" AND file_type = ?");
            bind_values.push(Value::Text(file_type.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut attachments = Vec::new();
        while let Some(row) = rows.next()? {
            attachments.push(parse_attachment_row(row)?);
        }
        Ok(attachments)
    }

    fn count_for_task(&self, task_id: TaskId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM attachments WHERE task_id = ?1;",
            [task_id],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative attachment count `{count}`")))
    }

    fn file_paths_for_task(&self, task_id: TaskId) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT file_path FROM attachments WHERE task_id = ?1 ORDER BY created_at ASC, id ASC;",
        )?;
        let mut rows = stmt.query([task_id])?;
        let mut paths = Vec::new();
        while let Some(row) = rows.next()? {
            paths.push(row.get(0)?);
        }
        Ok(paths)
    }
}

fn task_exists(conn: &Connection, task_id: TaskId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1);",
        [task_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn refresh_attachment_flag(conn: &Connection, task_id: TaskId) -> RepoResult<()> {
    conn.execute(
        "UPDATE tasks
         SET has_attachments = EXISTS(SELECT 1 FROM attachments WHERE task_id = ?1)
         WHERE id = ?1;",
        [task_id],
    )?;
    Ok(())
}

fn parse_attachment_row(row: &Row<'_>) -> RepoResult<Attachment> {
    let type_text: String = row.get("file_type")?;
    let file_type = FileType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid file type `{type_text}` in attachments.file_type"
        ))
    })?;

    let attachment = Attachment {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        file_name: row.get("file_name")?,
        file_path: row.get("file_path")?,
        file_type,
        file_size: row.get("file_size")?,
        created_at_ms: row.get("created_at")?,
    };
    attachment.validate()?;
    Ok(attachment)
}
