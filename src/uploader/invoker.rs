use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::messages::{MessageId, MessageProvider};

use super::classifier::classify;
use super::types::{ErrorKind, FailedUpload, UploadFailure, UploadItem, UploadOutcome};

/// External capability that uploads exactly one file.
#[async_trait]
pub trait UploadCapability: Send + Sync {
    async fn upload_file(&self, item: &UploadItem) -> Result<(), UploadFailure>;
}

/// Wraps an [`UploadCapability`] so every call ends in an [`UploadOutcome`].
#[derive(Clone)]
pub struct UploadInvoker {
    capability: Arc<dyn UploadCapability>,
    messages: Arc<dyn MessageProvider>,
}

impl UploadInvoker {
    pub fn new(capability: Arc<dyn UploadCapability>, messages: Arc<dyn MessageProvider>) -> Self {
        Self {
            capability,
            messages,
        }
    }

    pub async fn invoke(&self, item: &UploadItem) -> UploadOutcome {
        let attempt = AssertUnwindSafe(self.capability.upload_file(item)).catch_unwind();

        let failure = match attempt.await {
            Ok(Ok(())) => {
                log::debug!("Uploaded {}", item.name());
                return UploadOutcome::Success(item.clone());
            }
            Ok(Err(failure)) => failure,
            Err(_) => {
                log::error!("Upload capability panicked while uploading {}", item.name());
                UploadFailure::other("upload capability panicked")
            }
        };

        let kind = classify(&failure);
        let message = match kind {
            ErrorKind::OtherError => {
                log::warn!(
                    "Upload of {} failed ({}), reporting generic failure",
                    item.name(),
                    failure.message
                );
                self.messages.message(MessageId::GenericFailure)
            }
            ErrorKind::SizeError | ErrorKind::ValidError => {
                log::warn!("Upload of {} rejected as {}: {}", item.name(), kind, failure.message);
                failure.message
            }
        };

        UploadOutcome::Failure(FailedUpload {
            kind,
            message,
            item: item.clone(),
        })
    }
}
