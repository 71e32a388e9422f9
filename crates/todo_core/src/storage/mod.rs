//! On-device file storage for task attachments.
//!
//! # Responsibility
//! - Copy user-picked files into an app-owned directory.
//! - Enforce per-type size limits and remove files when attachments go.
//!
//! # Invariants
//! - Every stored file lives under the store root.
//! - Stored file names are unique and never derived from user text beyond
//!   a sanitized extension.

pub mod file_store;

pub use file_store::{
    format_file_size, AttachmentStore, StorageError, StorageResult, StoredFile,
    MAX_FILE_SIZE_BYTES, MAX_IMAGE_SIZE_BYTES,
};
