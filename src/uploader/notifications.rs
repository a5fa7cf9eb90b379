use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::errors::{AppError, AppResult};
use crate::messages::{MessageId, MessageProvider};

use super::accumulator::BatchResult;
use super::retry::RetryAction;
use super::types::{ErrorKind, FailedUpload, RetrySet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

/// A status report handed to the notification capability.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRequest {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub message: String,
    pub affected: Vec<String>,
    pub is_aggregate: bool,
    pub raised_at: DateTime<Utc>,
    #[serde(skip)]
    pub retry_action: Option<RetryAction>,
}

impl NotificationRequest {
    pub fn has_retry(&self) -> bool {
        self.retry_action.is_some()
    }
}

/// Sink for notifications. Rendering is entirely the implementor's concern.
pub trait Notifier: Send + Sync {
    fn notify(&self, request: NotificationRequest) -> AppResult<()>;
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, request: NotificationRequest) -> AppResult<()> {
        log::error!(
            "{} [{}]{}",
            request.message,
            request.affected.join(", "),
            if request.has_retry() { " (retry available)" } else { "" }
        );
        Ok(())
    }
}

/// Forwards notifications over a channel so the caller can act on retry actions.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<NotificationRequest>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, request: NotificationRequest) -> AppResult<()> {
        self.tx
            .send(request)
            .map_err(|_| AppError::notification_failed("notification receiver was dropped"))
    }
}

/// Deliver a notification, logging instead of propagating delivery errors.
pub fn safe_dispatch(notifier: &dyn Notifier, request: NotificationRequest) -> bool {
    let message = request.message.clone();
    match notifier.notify(request) {
        Ok(()) => {
            log::debug!("Dispatched notification '{}'", message);
            true
        }
        Err(e) => {
            log::warn!("Failed to dispatch notification '{}' (non-critical): {}", message, e);
            false
        }
    }
}

/// Turns a [`BatchResult`] into notification requests.
#[derive(Clone)]
pub struct NotificationAggregator {
    messages: Arc<dyn MessageProvider>,
    collapse_lone_failure: bool,
}

impl NotificationAggregator {
    pub fn new(messages: Arc<dyn MessageProvider>, collapse_lone_failure: bool) -> Self {
        Self {
            messages,
            collapse_lone_failure,
        }
    }

    /// Build the notifications for one cycle.
    ///
    /// Single-item batches (and, when collapsing is enabled, multi-item batches
    /// with exactly one failure) get a direct report. Otherwise one aggregate
    /// report per non-empty partition, ordered other, size, valid. `make_retry`
    /// is only called with a non-empty set.
    pub fn aggregate<F>(
        &self,
        result: &BatchResult,
        is_single_item_batch: bool,
        make_retry: F,
    ) -> Vec<NotificationRequest>
    where
        F: Fn(RetrySet) -> RetryAction,
    {
        let direct = is_single_item_batch
            || (self.collapse_lone_failure && result.failure_count() == 1);

        if direct {
            return result
                .failures()
                .next()
                .map(|failure| self.direct(failure, &make_retry))
                .into_iter()
                .collect();
        }

        let partitions = [
            (MessageId::AggregateFailure, ErrorKind::OtherError, result.other_failures()),
            (MessageId::SizeAggregate, ErrorKind::SizeError, result.size_failures()),
            (MessageId::ValidAggregate, ErrorKind::ValidError, result.valid_failures()),
        ];

        partitions
            .into_iter()
            .filter(|(_, _, failures)| !failures.is_empty())
            .map(|(message_id, kind, failures)| {
                let retry_set = RetrySet::from_failures(failures);
                NotificationRequest {
                    severity: Severity::Error,
                    kind,
                    message: self.messages.message(message_id),
                    affected: failures.iter().map(|f| f.file_name().to_string()).collect(),
                    is_aggregate: true,
                    raised_at: Utc::now(),
                    retry_action: retry_action_for(retry_set, &make_retry),
                }
            })
            .collect()
    }

    fn direct<F>(&self, failure: &FailedUpload, make_retry: &F) -> NotificationRequest
    where
        F: Fn(RetrySet) -> RetryAction,
    {
        NotificationRequest {
            severity: Severity::Error,
            kind: failure.kind,
            message: failure.message.clone(),
            affected: vec![failure.file_name().to_string()],
            is_aggregate: false,
            raised_at: Utc::now(),
            retry_action: retry_action_for(
                RetrySet::from_failures(std::iter::once(failure)),
                make_retry,
            ),
        }
    }
}

fn retry_action_for<F>(retry_set: RetrySet, make_retry: &F) -> Option<RetryAction>
where
    F: Fn(RetrySet) -> RetryAction,
{
    if retry_set.is_empty() {
        None
    } else {
        Some(make_retry(retry_set))
    }
}
