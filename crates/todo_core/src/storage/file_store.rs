//! Filesystem-backed attachment store.

use crate::model::attachment::{file_extension, FileType};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Size limit for non-image attachments (10 MiB).
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
/// Size limit for image attachments (5 MiB).
pub const MAX_IMAGE_SIZE_BYTES: u64 = 5 * 1024 * 1024;

const IMAGES_DIR: &str = "images";
const DOCUMENTS_DIR: &str = "documents";
const FILES_DIR: &str = "files";

static SAFE_EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{1,10}$").expect("valid extension regex"));

pub type StorageResult<T> = Result<T, StorageError>;

/// Attachment storage failures.
#[derive(Debug)]
pub enum StorageError {
    /// Source path does not exist or is not a regular file.
    SourceMissing(PathBuf),
    /// File exceeds the limit for its type.
    FileTooLarge {
        file_type: FileType,
        size: u64,
        max: u64,
    },
    /// Original name is blank.
    InvalidFileName(String),
    /// Path points outside the store root.
    OutsideStore(PathBuf),
    Io {
        path: PathBuf,
        source: io::Error,
    },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceMissing(path) => write!(f, "source file not found: {}", path.display()),
            Self::FileTooLarge {
                file_type,
                size,
                max,
            } => write!(
                f,
                "{file_type} file is too large: {} exceeds {}",
                format_file_size(*size),
                format_file_size(*max)
            ),
            Self::InvalidFileName(name) => write!(f, "invalid file name: `{name}`"),
            Self::OutsideStore(path) => {
                write!(f, "path is outside the attachment store: {}", path.display())
            }
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Result of importing one file into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Original display name.
    pub file_name: String,
    /// Absolute path of the stored copy.
    pub path: PathBuf,
    pub file_type: FileType,
    pub file_size: u64,
}

/// App-owned directory holding attachment copies.
///
/// Layout: `<root>/images`, `<root>/documents`, `<root>/files`.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copies `source` into the store under a fresh unique name.
    ///
    /// # Errors
    /// - `InvalidFileName` for blank `original_name`.
    /// - `SourceMissing` when `source` is not a readable regular file.
    /// - `FileTooLarge` when the per-type limit is exceeded.
    pub fn import_file(&self, source: &Path, original_name: &str) -> StorageResult<StoredFile> {
        let original_name = original_name.trim();
        if original_name.is_empty() {
            return Err(StorageError::InvalidFileName(original_name.to_string()));
        }

        let metadata = match fs::metadata(source) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(StorageError::SourceMissing(source.to_path_buf())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::SourceMissing(source.to_path_buf()));
            }
            Err(err) => return Err(io_error(source)(err)),
        };

        let file_type = FileType::from_file_name(original_name);
        let file_size = metadata.len();
        let max = max_size_for(file_type);
        if file_size > max {
            return Err(StorageError::FileTooLarge {
                file_type,
                size: file_size,
                max,
            });
        }

        let target_dir = self.root.join(subdir_for(file_type));
        fs::create_dir_all(&target_dir).map_err(io_error(&target_dir))?;
        let target = target_dir.join(unique_file_name(original_name));
        fs::copy(source, &target).map_err(io_error(&target))?;

        info!(
            "event=attachment_import module=storage status=ok file_type={} size_bytes={}",
            file_type, file_size
        );

        Ok(StoredFile {
            file_name: original_name.to_string(),
            path: target,
            file_type,
            file_size,
        })
    }

    /// Removes one stored file.
    ///
    /// Returns `Ok(false)` when the file was already gone.
    pub fn delete_file(&self, path: &Path) -> StorageResult<bool> {
        let escapes_root = path
            .components()
            .any(|component| component == Component::ParentDir);
        if escapes_root || !path.starts_with(&self.root) {
            return Err(StorageError::OutsideStore(path.to_path_buf()));
        }

        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_error(path)(err)),
        }
    }

    /// Whether `path` exists, is a file and can be opened for reading.
    pub fn is_accessible(&self, path: &Path) -> bool {
        path.is_file() && fs::File::open(path).is_ok()
    }

    /// Total size of every stored file in bytes.
    pub fn total_size(&self) -> StorageResult<u64> {
        if !self.root.exists() {
            return Ok(0);
        }
        directory_size(&self.root)
    }

    /// Deletes stored files older than `max_age` and prunes empty
    /// subdirectories. Returns how many files were removed.
    pub fn cleanup_older_than(&self, max_age: Duration) -> StorageResult<usize> {
        if !self.root.exists() {
            return Ok(0);
        }
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let removed = cleanup_directory(&self.root, cutoff)?;
        info!("event=attachment_cleanup module=storage status=ok removed={removed}");
        Ok(removed)
    }
}

/// Formats a byte count with binary units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{size:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

fn max_size_for(file_type: FileType) -> u64 {
    match file_type {
        FileType::Image => MAX_IMAGE_SIZE_BYTES,
        _ => MAX_FILE_SIZE_BYTES,
    }
}

fn subdir_for(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Image => IMAGES_DIR,
        FileType::Document => DOCUMENTS_DIR,
        FileType::Video | FileType::Audio | FileType::Other => FILES_DIR,
    }
}

fn unique_file_name(original_name: &str) -> String {
    let stem = format!("file_{}", Uuid::new_v4().simple());
    let extension = file_extension(original_name);
    if SAFE_EXTENSION_RE.is_match(extension) {
        format!("{stem}.{}", extension.to_ascii_lowercase())
    } else {
        stem
    }
}

fn directory_size(dir: &Path) -> StorageResult<u64> {
    let mut total = 0;
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        let metadata = entry.metadata().map_err(io_error(&path))?;
        if metadata.is_dir() {
            total += directory_size(&path)?;
        } else {
            total += metadata.len();
        }
    }
    Ok(total)
}

fn cleanup_directory(dir: &Path, cutoff: SystemTime) -> StorageResult<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        let metadata = entry.metadata().map_err(io_error(&path))?;
        if metadata.is_dir() {
            removed += cleanup_directory(&path, cutoff)?;
            let is_empty = fs::read_dir(&path)
                .map_err(io_error(&path))?
                .next()
                .is_none();
            if is_empty {
                if let Err(err) = fs::remove_dir(&path) {
                    warn!(
                        "event=attachment_cleanup module=storage status=warn error_code=rmdir_failed error={err}"
                    );
                }
            }
            continue;
        }

        let modified = metadata.modified().map_err(io_error(&path))?;
        if modified < cutoff {
            fs::remove_file(&path).map_err(io_error(&path))?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::{format_file_size, unique_file_name, AttachmentStore, StorageError};
    use crate::model::attachment::FileType;
    use std::fs;
    use std::time::Duration;

    #[test]
    fn format_file_size_uses_binary_units() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
    }

    #[test]
    fn unique_names_keep_safe_extension_only() {
        let name = unique_file_name("Photo.JPG");
        assert!(name.starts_with("file_"));
        assert!(name.ends_with(".jpg"));

        let name = unique_file_name("weird.ex t");
        assert!(!name.contains('.'));
        assert_ne!(unique_file_name("a.txt"), unique_file_name("a.txt"));
    }

    #[test]
    fn import_copies_into_type_subdirectory() {
        let source_dir = tempfile::tempdir().unwrap();
        let store_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("scan.pdf");
        fs::write(&source, b"%PDF-1.7").unwrap();

        let store = AttachmentStore::new(store_dir.path());
        let stored = store.import_file(&source, "scan.pdf").unwrap();

        assert_eq!(stored.file_type, FileType::Document);
        assert_eq!(stored.file_size, 8);
        assert!(stored.path.starts_with(store_dir.path().join("documents")));
        assert_eq!(fs::read(&stored.path).unwrap(), b"%PDF-1.7");
        assert!(source.exists());
        assert_eq!(store.total_size().unwrap(), 8);
    }

    #[test]
    fn import_rejects_missing_source_and_blank_name() {
        let store_dir = tempfile::tempdir().unwrap();
        let store = AttachmentStore::new(store_dir.path());
        let missing = store_dir.path().join("nope.txt");

        assert!(matches!(
            store.import_file(&missing, "nope.txt"),
            Err(StorageError::SourceMissing(_))
        ));
        assert!(matches!(
            store.import_file(&missing, "  "),
            Err(StorageError::InvalidFileName(_))
        ));
    }

    #[test]
    fn import_enforces_image_size_limit() {
        let source_dir = tempfile::tempdir().unwrap();
        let store_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("big.png");
        let file = fs::File::create(&source).unwrap();
        file.set_len(super::MAX_IMAGE_SIZE_BYTES + 1).unwrap();

        let store = AttachmentStore::new(store_dir.path());
        let err = store.import_file(&source, "big.png").unwrap_err();
        assert!(matches!(
            err,
            StorageError::FileTooLarge {
                file_type: FileType::Image,
                ..
            }
        ));

        // Same bytes are fine under the generic document limit.
        assert!(store.import_file(&source, "big.txt").is_ok());
    }

    #[test]
    fn delete_is_idempotent_and_scoped_to_root() {
        let source_dir = tempfile::tempdir().unwrap();
        let store_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("a.txt");
        fs::write(&source, b"abc").unwrap();

        let store = AttachmentStore::new(store_dir.path());
        let stored = store.import_file(&source, "a.txt").unwrap();
        assert!(store.is_accessible(&stored.path));

        assert!(store.delete_file(&stored.path).unwrap());
        assert!(!store.delete_file(&stored.path).unwrap());
        assert!(!store.is_accessible(&stored.path));

        assert!(matches!(
            store.delete_file(&source),
            Err(StorageError::OutsideStore(_))
        ));
        assert!(source.exists());
    }

    #[test]
    fn delete_rejects_parent_dir_escape_from_root() {
        let outer_dir = tempfile::tempdir().unwrap();
        let root = outer_dir.path().join("store");
        fs::create_dir_all(&root).unwrap();
        let victim = outer_dir.path().join("keep.txt");
        fs::write(&victim, b"keep").unwrap();

        let store = AttachmentStore::new(&root);
        let sneaky = root.join("..").join("keep.txt");
        assert!(matches!(
            store.delete_file(&sneaky),
            Err(StorageError::OutsideStore(_))
        ));
        assert!(victim.exists());
    }

    #[test]
    fn cleanup_removes_stale_files_and_empty_dirs() {
        let source_dir = tempfile::tempdir().unwrap();
        let store_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("old.mp3");
        fs::write(&source, b"id3").unwrap();

        let store = AttachmentStore::new(store_dir.path());
        let stored = store.import_file(&source, "old.mp3").unwrap();

        assert_eq!(store.cleanup_older_than(Duration::from_secs(3600)).unwrap(), 0);
        assert!(stored.path.exists());

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.cleanup_older_than(Duration::ZERO).unwrap(), 1);
        assert!(!stored.path.exists());
        assert!(!store_dir.path().join("files").exists());
        assert!(store_dir.path().exists());
    }
}
