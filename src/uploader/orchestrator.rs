use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::messages::{MessageCatalog, MessageProvider};

use super::accumulator::{run_batch, BatchResult};
use super::invoker::{UploadCapability, UploadInvoker};
use super::notifications::{safe_dispatch, NotificationAggregator, Notifier};
use super::retry::RetryAction;
use super::types::{RetrySet, UploadItem};

/// What one orchestration cycle did.
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub cycle_id: Uuid,
    pub result: BatchResult,
    /// Notifications the notifier accepted
    pub dispatched: usize,
}

/// Drives upload cycles: accumulate, aggregate, dispatch.
///
/// Cloning is cheap; every collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct Orchestrator {
    invoker: UploadInvoker,
    aggregator: NotificationAggregator,
    notifier: Arc<dyn Notifier>,
}

pub struct OrchestratorBuilder {
    capability: Arc<dyn UploadCapability>,
    notifier: Arc<dyn Notifier>,
    messages: Arc<dyn MessageProvider>,
    collapse_lone_failure: bool,
}

impl OrchestratorBuilder {
    pub fn messages(mut self, messages: Arc<dyn MessageProvider>) -> Self {
        self.messages = messages;
        self
    }

    pub fn collapse_lone_failure(mut self, collapse: bool) -> Self {
        self.collapse_lone_failure = collapse;
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator {
            invoker: UploadInvoker::new(self.capability, self.messages.clone()),
            aggregator: NotificationAggregator::new(self.messages, self.collapse_lone_failure),
            notifier: self.notifier,
        }
    }
}

impl Orchestrator {
    pub fn builder(
        capability: Arc<dyn UploadCapability>,
        notifier: Arc<dyn Notifier>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            capability,
            notifier,
            messages: Arc::new(MessageCatalog::new()),
            collapse_lone_failure: true,
        }
    }

    /// Build with the message overrides and aggregation policy from `config`.
    pub fn from_config(
        config: &Config,
        capability: Arc<dyn UploadCapability>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let messages = MessageCatalog::from_config(config);
        Self::builder(capability, notifier)
            .messages(Arc::new(messages))
            .collapse_lone_failure(config.collapse_lone_failure)
            .build()
    }

    /// Run one full cycle over `items` and dispatch the resulting notifications.
    pub async fn submit(&self, items: Vec<UploadItem>) -> CycleSummary {
        let cycle_id = Uuid::new_v4();
        let tag = cycle_id.to_string();
        let is_single_item_batch = items.len() == 1;

        log::info!("[{}] Starting upload cycle for {} file(s)", tag, items.len());

        let result = run_batch(&self.invoker, &items, &tag).await;
        let notifications =
            self.aggregator
                .aggregate(&result, is_single_item_batch, |set| self.retry_action(set));

        let dispatched = notifications
            .into_iter()
            .map(|request| safe_dispatch(self.notifier.as_ref(), request))
            .filter(|delivered| *delivered)
            .count();

        if dispatched > 0 {
            log::info!("[{}] Dispatched {} notification(s)", tag, dispatched);
        }

        CycleSummary {
            cycle_id,
            result,
            dispatched,
        }
    }

    /// Start a new cycle over `retry_set`. An empty set does nothing.
    pub async fn retry(&self, retry_set: RetrySet) -> Option<CycleSummary> {
        if retry_set.is_empty() {
            log::debug!("Retry requested with no eligible files, skipping");
            return None;
        }
        Some(self.submit(retry_set.into_items()).await)
    }

    /// Bind `retry_set` to a fresh-cycle action on this orchestrator.
    pub fn retry_action(&self, retry_set: RetrySet) -> RetryAction {
        RetryAction::new(self.clone(), retry_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppResult;
    use crate::uploader::notifications::NotificationRequest;
    use crate::uploader::types::UploadFailure;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct AlwaysFails;

    #[async_trait]
    impl UploadCapability for AlwaysFails {
        async fn upload_file(&self, _item: &UploadItem) -> Result<(), UploadFailure> {
            Err(UploadFailure::other("offline"))
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        count: Mutex<usize>,
    }

    impl Notifier for CountingNotifier {
        fn notify(&self, _request: NotificationRequest) -> AppResult<()> {
            *self.count.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_empty_retry_set_is_noop() {
        let notifier = Arc::new(CountingNotifier::default());
        let orchestrator = Orchestrator::builder(Arc::new(AlwaysFails), notifier.clone()).build();

        assert!(orchestrator.retry(RetrySet::default()).await.is_none());
        assert_eq!(*notifier.count.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_dispatches_nothing() {
        let notifier = Arc::new(CountingNotifier::default());
        let orchestrator = Orchestrator::builder(Arc::new(AlwaysFails), notifier.clone()).build();

        let summary = orchestrator.submit(Vec::new()).await;
        assert!(summary.result.is_empty());
        assert_eq!(summary.dispatched, 0);
        assert_eq!(*notifier.count.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_multi_batch_of_failures_caps_at_one_per_kind() {
        let notifier = Arc::new(CountingNotifier::default());
        let orchestrator = Orchestrator::builder(Arc::new(AlwaysFails), notifier.clone()).build();

        let items = (0..5)
            .map(|i| UploadItem::from_path(format!("img{}.png", i)))
            .collect();
        let summary = orchestrator.submit(items).await;

        assert_eq!(summary.result.other_failures().len(), 5);
        assert_eq!(summary.dispatched, 1);
    }

    #[tokio::test]
    async fn test_from_config_applies_message_overrides() {
        let mut config = Config::default();
        config.messages.insert(
            crate::messages::MessageId::GenericFailure,
            "Upload failed, try again".to_string(),
        );
        let orchestrator = Orchestrator::from_config(
            &config,
            Arc::new(AlwaysFails),
            Arc::new(CountingNotifier::default()),
        );

        let summary = orchestrator.submit(vec![UploadItem::from_path("a.png")]).await;
        assert_eq!(summary.result.other_failures()[0].message, "Upload failed, try again");
    }

    struct AlwaysTooLarge;

    #[async_trait]
    impl UploadCapability for AlwaysTooLarge {
        async fn upload_file(&self, _item: &UploadItem) -> Result<(), UploadFailure> {
            Err(UploadFailure::size("Files must be under 10MB"))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        requests: Mutex<Vec<NotificationRequest>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, request: NotificationRequest) -> AppResult<()> {
            self.requests.lock().unwrap().push(request);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_from_config_aggregate_size_message_matches_direct() {
        let mut config = Config::default();
        config.size_error_message = "Files must be under 10MB".to_string();
        let notifier = Arc::new(RecordingNotifier::default());
        let orchestrator =
            Orchestrator::from_config(&config, Arc::new(AlwaysTooLarge), notifier.clone());

        orchestrator
            .submit(vec![UploadItem::from_path("a.png"), UploadItem::from_path("b.png")])
            .await;

        let requests = notifier.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].is_aggregate);
        assert_eq!(requests[0].message, "Files must be under 10MB");
    }
}
