//! Attachment domain model.
//!
//! # Responsibility
//! - Describe a file stored on device and linked to one task.
//! - Classify files into coarse types used for filtering and size limits.
//!
//! # Invariants
//! - Every attachment belongs to exactly one task; deleting the task
//!   deletes the attachment row.
//! - `file_type` is derived from the file name extension at import time.

use super::now_epoch_ms;
use super::task::TaskId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Storage-assigned attachment identifier.
pub type AttachmentId = i64;

/// Coarse file classification derived from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Image,
    Document,
    Video,
    Audio,
    Other,
}

impl FileType {
    /// Classifies a file by its extension (case-insensitive).
    ///
    /// Files without an extension are [`FileType::Other`].
    pub fn from_file_name(file_name: &str) -> Self {
        let extension = file_extension(file_name).to_ascii_lowercase();
        match extension.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg" => Self::Image,
            "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "txt" | "rtf" | "odt" => {
                Self::Document
            }
            "mp4" | "avi" | "mkv" | "mov" | "wmv" | "flv" | "webm" => Self::Video,
            "mp3" | "wav" | "flac" | "aac" | "ogg" | "wma" => Self::Audio,
            _ => Self::Other,
        }
    }

    /// Stable storage label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Other => "other",
        }
    }

    /// Parses a storage label produced by [`FileType::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(Self::Image),
            "document" => Some(Self::Document),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl Display for FileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the extension of `file_name` without the dot, or `""`.
pub fn file_extension(file_name: &str) -> &str {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
}

/// A file linked to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// `0` until the attachment is persisted.
    pub id: AttachmentId,
    pub task_id: TaskId,
    /// Display name chosen by the user (original file name).
    pub file_name: String,
    /// Absolute path of the stored copy.
    pub file_path: String,
    pub file_type: FileType,
    /// Size in bytes.
    pub file_size: i64,
    pub created_at_ms: i64,
}

/// Validation errors for attachment records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentValidationError {
    BlankFileName,
    BlankFilePath,
    NegativeFileSize(i64),
}

impl Display for AttachmentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankFileName => write!(f, "attachment file name must not be blank"),
            Self::BlankFilePath => write!(f, "attachment file path must not be blank"),
            Self::NegativeFileSize(value) => {
                write!(f, "attachment file size must not be negative, got {value}")
            }
        }
    }
}

impl Error for AttachmentValidationError {}

impl Attachment {
    /// Creates an unsaved attachment; the type is derived from `file_name`.
    pub fn new(
        task_id: TaskId,
        file_name: impl Into<String>,
        file_path: impl Into<String>,
        file_size: i64,
    ) -> Self {
        let file_name = file_name.into();
        let file_type = FileType::from_file_name(&file_name);
        Self {
            id: 0,
            task_id,
            file_name,
            file_path: file_path.into(),
            file_type,
            file_size,
            created_at_ms: now_epoch_ms(),
        }
    }

    pub fn validate(&self) -> Result<(), AttachmentValidationError> {
        if self.file_name.trim().is_empty() {
            return Err(AttachmentValidationError::BlankFileName);
        }
        if self.file_path.trim().is_empty() {
            return Err(AttachmentValidationError::BlankFilePath);
        }
        if self.file_size < 0 {
            return Err(AttachmentValidationError::NegativeFileSize(self.file_size));
        }
        Ok(())
    }

    pub fn is_image(&self) -> bool {
        self.file_type == FileType::Image
    }
}

#[cfg(test)]
mod tests {
    use super::{file_extension, Attachment, AttachmentValidationError, FileType};

    #[test]
    fn classifies_known_extensions_case_insensitively() {
        assert_eq!(FileType::from_file_name("photo.JPG"), FileType::Image);
        assert_eq!(FileType::from_file_name("report.docx"), FileType::Document);
        assert_eq!(FileType::from_file_name("clip.webm"), FileType::Video);
        assert_eq!(FileType::from_file_name("voice.ogg"), FileType::Audio);
        assert_eq!(FileType::from_file_name("archive.zip"), FileType::Other);
        assert_eq!(FileType::from_file_name("README"), FileType::Other);
    }

    #[test]
    fn extension_ignores_leading_dot_files() {
        assert_eq!(file_extension("notes.tar.gz"), "gz");
        assert_eq!(file_extension(".hidden"), "");
        assert_eq!(file_extension(""), "");
    }

    #[test]
    fn file_type_labels_roundtrip() {
        for kind in [
            FileType::Image,
            FileType::Document,
            FileType::Video,
            FileType::Audio,
            FileType::Other,
        ] {
            assert_eq!(FileType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FileType::parse("binary"), None);
    }

    #[test]
    fn validate_rejects_blank_and_negative_values() {
        let attachment = Attachment::new(1, "a.png", "", 10);
        assert_eq!(
            attachment.validate(),
            Err(AttachmentValidationError::BlankFilePath)
        );

        let attachment = Attachment::new(1, "a.png", "/tmp/a.png", -1);
        assert_eq!(
            attachment.validate(),
            Err(AttachmentValidationError::NegativeFileSize(-1))
        );

        let attachment = Attachment::new(1, "a.png", "/tmp/a.png", 10);
        assert!(attachment.is_image());
        assert!(attachment.validate().is_ok());
    }

    #[test]
    fn serializes_file_type_as_snake_case() {
        let attachment = Attachment::new(3, "doc.pdf", "/tmp/doc.pdf", 42);
        let json = serde_json::to_value(&attachment).expect("attachment should serialize");
        assert_eq!(json["file_type"], "document");
        assert_eq!(json["task_id"], 3);
    }
}
