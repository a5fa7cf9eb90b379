// Uploader module - orchestrates batch uploads
//
// Items flow leaves-first: classifier -> invoker -> accumulator -> notifications,
// with retry actions looping back into the orchestrator.

pub mod accumulator;
pub mod classifier;
pub mod http_client;
pub mod invoker;
pub mod notifications;
pub mod orchestrator;
pub mod progress_tracker;
pub mod retry;
pub mod types;

pub use accumulator::{run_batch, BatchResult};
pub use classifier::classify;
pub use http_client::HttpUploader;
pub use invoker::{UploadCapability, UploadInvoker};
pub use notifications::{
    ChannelNotifier, LogNotifier, NotificationAggregator, NotificationRequest, Notifier, Severity,
};
pub use orchestrator::{CycleSummary, Orchestrator, OrchestratorBuilder};
pub use retry::RetryAction;
pub use types::{ErrorKind, FailedUpload, RetrySet, UploadFailure, UploadItem, UploadOutcome};
