//! Attachment use-case service.
//!
//! # Responsibility
//! - Pair attachment rows with stored file copies.
//! - Remove stored files when attachments or their tasks are deleted.
//!
//! # Invariants
//! - A stored copy whose row failed to insert is removed again.
//! - Rows are deleted before files; a leftover file is logged and later
//!   reclaimed by [`AttachmentStore::cleanup_older_than`].

use crate::model::attachment::{Attachment, AttachmentId, FileType};
use crate::model::task::TaskId;
use crate::repo::attachment_repo::AttachmentRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::{RepoError, RepoResult};
use crate::storage::{AttachmentStore, StorageError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Service error for attachment use-cases.
#[derive(Debug)]
pub enum AttachmentServiceError {
    TaskNotFound(TaskId),
    AttachmentNotFound(AttachmentId),
    Storage(StorageError),
    Repo(RepoError),
}

impl Display for AttachmentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::AttachmentNotFound(id) => write!(f, "attachment not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AttachmentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AttachmentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            RepoError::AttachmentNotFound(id) => Self::AttachmentNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<StorageError> for AttachmentServiceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Attachment service over repositories and a file store.
pub struct AttachmentService<'store, A: AttachmentRepository, T: TaskRepository> {
    attachments: A,
    tasks: T,
    store: &'store AttachmentStore,
}

impl<'store, A: AttachmentRepository, T: TaskRepository> AttachmentService<'store, A, T> {
    pub fn new(attachments: A, tasks: T, store: &'store AttachmentStore) -> Self {
        Self {
            attachments,
            tasks,
            store,
        }
    }

    /// Copies `source` into the store and links it to `task_id`.
    pub fn attach_file(
        &self,
        task_id: TaskId,
        source: &Path,
        original_name: &str,
    ) -> Result<Attachment, AttachmentServiceError> {
        if self.tasks.get_task(task_id)?.is_none() {
            return Err(AttachmentServiceError::TaskNotFound(task_id));
        }

        let stored = self.store.import_file(source, original_name)?;
        let mut attachment = Attachment::new(
            task_id,
            stored.file_name.clone(),
            stored.path.to_string_lossy().into_owned(),
            i64::try_from(stored.file_size).unwrap_or(i64::MAX),
        );
        attachment.file_type = stored.file_type;

        match self.attachments.create_attachment(&attachment) {
            Ok(id) => {
                attachment.id = id;
                info!(
                    "event=attachment_add module=service status=ok task_id={task_id} attachment_id={id}"
                );
                Ok(attachment)
            }
            Err(err) => {
                if let Err(cleanup_err) = self.store.delete_file(&stored.path) {
                    warn!(
                        "event=attachment_add module=service status=warn task_id={task_id} error_code=orphan_cleanup_failed error={cleanup_err}"
                    );
                }
                Err(err.into())
            }
        }
    }

    pub fn get_attachment(&self, id: AttachmentId) -> RepoResult<Option<Attachment>> {
        self.attachments.get_attachment(id)
    }

    pub fn list_attachments(
        &self,
        task_id: TaskId,
        file_type: Option<FileType>,
    ) -> RepoResult<Vec<Attachment>> {
        self.attachments.list_for_task(task_id, file_type)
    }

    pub fn attachment_count(&self, task_id: TaskId) -> RepoResult<u64> {
        self.attachments.count_for_task(task_id)
    }

    /// Deletes the attachment row, then its stored file.
    pub fn remove_attachment(
        &self,
        id: AttachmentId,
    ) -> Result<Attachment, AttachmentServiceError> {
        let removed = self.attachments.delete_attachment(id)?;
        self.remove_stored_file(&removed.file_path);
        info!(
            "event=attachment_remove module=service status=ok task_id={} attachment_id={id}",
            removed.task_id
        );
        Ok(removed)
    }

    /// Deletes a task with its attachment rows and stored files.
    ///
    /// Returns how many stored files were actually removed.
    pub fn delete_task_with_files(&self, task_id: TaskId) -> Result<usize, AttachmentServiceError> {
        let paths = self.attachments.file_paths_for_task(task_id)?;
        self.tasks.delete_task(task_id)?;

        let removed = paths
            .iter()
            .filter(|path| self.remove_stored_file(path))
            .count();
        info!(
            "event=task_delete module=service status=ok task_id={task_id} files_removed={removed}"
        );
        Ok(removed)
    }

    fn remove_stored_file(&self, path: &str) -> bool {
        match self.store.delete_file(Path::new(path)) {
            Ok(existed) => existed,
            Err(err) => {
                warn!(
                    "event=attachment_file_delete module=service status=warn error_code=file_delete_failed error={err}"
                );
                false
            }
        }
    }
}
