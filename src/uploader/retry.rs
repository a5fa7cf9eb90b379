use std::fmt;

use super::orchestrator::{CycleSummary, Orchestrator};
use super::types::RetrySet;

/// Resubmits a fixed set of items as a brand new cycle.
///
/// The set is captured when the action is built and never changes. Nothing is
/// counted between attempts; invoking the action again starts another fresh cycle.
#[derive(Clone)]
pub struct RetryAction {
    orchestrator: Orchestrator,
    retry_set: RetrySet,
}

impl RetryAction {
    pub(crate) fn new(orchestrator: Orchestrator, retry_set: RetrySet) -> Self {
        Self {
            orchestrator,
            retry_set,
        }
    }

    pub fn retry_set(&self) -> &RetrySet {
        &self.retry_set
    }

    /// Run the retry cycle. The single/multi rule is re-evaluated against the set size.
    pub async fn invoke(&self) -> Option<CycleSummary> {
        log::info!(
            "Retrying upload of {} file(s): {}",
            self.retry_set.len(),
            self.retry_set.names().join(", ")
        );
        self.orchestrator.retry(self.retry_set.clone()).await
    }
}

impl fmt::Debug for RetryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAction")
            .field("retry_set", &self.retry_set.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploader::invoker::UploadCapability;
    use crate::uploader::notifications::{Notifier, NotificationRequest};
    use crate::uploader::types::{UploadFailure, UploadItem};
    use crate::errors::AppResult;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FlakyCapability {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl UploadCapability for FlakyCapability {
        async fn upload_file(&self, item: &UploadItem) -> Result<(), UploadFailure> {
            let mut calls = self.calls.lock().unwrap();
            let seen_before = calls.iter().any(|c| c == item.name());
            calls.push(item.name().to_string());
            if seen_before {
                Ok(())
            } else {
                Err(UploadFailure::other("503 Service Unavailable"))
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<NotificationRequest>>,
    }

    impl Notifier for Recorder {
        fn notify(&self, request: NotificationRequest) -> AppResult<()> {
            self.requests.lock().unwrap().push(request);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_retry_runs_fresh_cycle_over_subset() {
        let capability = Arc::new(FlakyCapability::default());
        let recorder = Arc::new(Recorder::default());
        let orchestrator = Orchestrator::builder(capability.clone(), recorder.clone()).build();

        let a = UploadItem::from_path("a.gif");
        let summary = orchestrator.submit(vec![a.clone()]).await;
        assert_eq!(summary.dispatched, 1);

        let action = recorder.requests.lock().unwrap()[0]
            .retry_action
            .clone()
            .expect("retry expected");
        assert_eq!(action.retry_set().items(), &[a.clone()]);

        let retried = action.invoke().await.expect("non-empty retry runs a cycle");
        assert!(retried.result.all_succeeded());
        assert_ne!(retried.cycle_id, summary.cycle_id);
        assert_eq!(*capability.calls.lock().unwrap(), vec!["a.gif", "a.gif"]);
        assert_eq!(recorder.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_debug_lists_names() {
        let orchestrator = Orchestrator::builder(
            Arc::new(FlakyCapability::default()),
            Arc::new(Recorder::default()),
        )
        .build();
        let set = RetrySet::from_failures(&[crate::uploader::types::FailedUpload {
            kind: crate::uploader::types::ErrorKind::OtherError,
            message: "x".into(),
            item: UploadItem::from_path("z.png"),
        }]);
        let action = orchestrator.retry_action(set);
        assert!(format!("{:?}", action).contains("z.png"));
    }
}
