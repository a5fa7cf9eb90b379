use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// One file selected for upload.
///
/// Items compare by their generated id, so two selections of the same path are
/// still distinct items within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadItem {
    id: Uuid,
    name: String,
    path: PathBuf,
}

impl UploadItem {
    /// Build an item from a path; the display name is the file name component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let name = if name.is_empty() {
            path.to_string_lossy().to_string()
        } else {
            name
        };
        Self {
            id: Uuid::new_v4(),
            name,
            path,
        }
    }

    /// Build an item with an explicit display name.
    pub fn named(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PartialEq for UploadItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UploadItem {}

impl std::hash::Hash for UploadItem {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Closed set of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// File exceeds an external size limit
    SizeError,
    /// File fails an external content or type check
    ValidError,
    /// Anything else; assumed transient
    OtherError,
}

impl ErrorKind {
    pub const SIZE_DISCRIMINATOR: &'static str = "SizeError";
    pub const VALID_DISCRIMINATOR: &'static str = "ValidError";

    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::OtherError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::SizeError => "SizeError",
            ErrorKind::ValidError => "ValidError",
            ErrorKind::OtherError => "OtherError",
        };
        f.write_str(s)
    }
}

/// Failure raised by an upload capability.
///
/// `discriminator` is the only field used for classification; `message` is
/// carried through to the user for size and validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct UploadFailure {
    pub discriminator: Option<String>,
    pub message: String,
}

impl UploadFailure {
    pub fn new(discriminator: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            discriminator: discriminator.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn size(message: impl Into<String>) -> Self {
        Self::new(Some(ErrorKind::SIZE_DISCRIMINATOR), message)
    }

    pub fn valid(message: impl Into<String>) -> Self {
        Self::new(Some(ErrorKind::VALID_DISCRIMINATOR), message)
    }

    /// A failure with no recognised discriminator.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

/// A classified per-item failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub kind: ErrorKind,
    pub message: String,
    pub item: UploadItem,
}

impl FailedUpload {
    pub fn file_name(&self) -> &str {
        self.item.name()
    }
}

/// Result of one upload attempt for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success(UploadItem),
    Failure(FailedUpload),
}

impl UploadOutcome {
    pub fn item(&self) -> &UploadItem {
        match self {
            UploadOutcome::Success(item) => item,
            UploadOutcome::Failure(failure) => &failure.item,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success(_))
    }

    pub fn as_failure(&self) -> Option<&FailedUpload> {
        match self {
            UploadOutcome::Failure(failure) => Some(failure),
            UploadOutcome::Success(_) => None,
        }
    }
}

/// Items eligible for resubmission. Only ever built from retryable failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrySet {
    items: Vec<UploadItem>,
}

impl RetrySet {
    /// Collect the items of the retryable failures, in order.
    pub fn from_failures<'a>(failures: impl IntoIterator<Item = &'a FailedUpload>) -> Self {
        let items = failures
            .into_iter()
            .filter(|f| f.kind.is_retryable())
            .map(|f| f.item.clone())
            .collect();
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|i| i.name().to_string()).collect()
    }

    pub fn into_items(self) -> Vec<UploadItem> {
        self.items
    }
}
