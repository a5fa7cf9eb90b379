//! Batch media-upload orchestration.
//!
//! Submits a batch of files one at a time through an [`UploadCapability`],
//! classifies what failed, and reports failures either directly or grouped by
//! kind. Retryable failures come back with a [`RetryAction`] scoped to exactly
//! the files that can plausibly succeed on resubmission.

pub mod config;
pub mod errors;
pub mod messages;
pub mod uploader;

pub use errors::{AppError, AppResult};
pub use messages::{MessageCatalog, MessageId, MessageProvider};
pub use uploader::{
    BatchResult, CycleSummary, ErrorKind, NotificationRequest, Notifier, Orchestrator, RetryAction,
    RetrySet, UploadCapability, UploadFailure, UploadItem, UploadOutcome,
};
