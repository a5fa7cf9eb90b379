use super::invoker::UploadInvoker;
use super::progress_tracker::CycleProgress;
use super::types::{ErrorKind, FailedUpload, RetrySet, UploadItem, UploadOutcome};

/// Every outcome of one cycle, in input order, plus the failures split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    outcomes: Vec<UploadOutcome>,
    size_failures: Vec<FailedUpload>,
    valid_failures: Vec<FailedUpload>,
    other_failures: Vec<FailedUpload>,
}

impl BatchResult {
    /// Fold an ordered list of outcomes into a result. Partition order follows input order.
    pub fn from_outcomes(outcomes: Vec<UploadOutcome>) -> Self {
        let (size_failures, valid_failures, other_failures) = outcomes
            .iter()
            .filter_map(UploadOutcome::as_failure)
            .fold(
                (Vec::new(), Vec::new(), Vec::new()),
                |(mut size, mut valid, mut other), failure| {
                    match failure.kind {
                        ErrorKind::SizeError => size.push(failure.clone()),
                        ErrorKind::ValidError => valid.push(failure.clone()),
                        ErrorKind::OtherError => other.push(failure.clone()),
                    }
                    (size, valid, other)
                },
            );

        Self {
            outcomes,
            size_failures,
            valid_failures,
            other_failures,
        }
    }

    pub fn outcomes(&self) -> &[UploadOutcome] {
        &self.outcomes
    }

    pub fn size_failures(&self) -> &[FailedUpload] {
        &self.size_failures
    }

    pub fn valid_failures(&self) -> &[FailedUpload] {
        &self.valid_failures
    }

    pub fn other_failures(&self) -> &[FailedUpload] {
        &self.other_failures
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailedUpload> {
        self.outcomes.iter().filter_map(UploadOutcome::as_failure)
    }

    pub fn successes(&self) -> impl Iterator<Item = &UploadItem> {
        self.outcomes.iter().filter_map(|o| match o {
            UploadOutcome::Success(item) => Some(item),
            UploadOutcome::Failure(_) => None,
        })
    }

    pub fn failure_count(&self) -> usize {
        self.size_failures.len() + self.valid_failures.len() + self.other_failures.len()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count() == 0
    }

    /// Items worth resubmitting: the retryable partition only.
    pub fn retry_set(&self) -> RetrySet {
        RetrySet::from_failures(&self.other_failures)
    }
}

/// Upload `items` one at a time, in order. A failure never stops the batch.
pub async fn run_batch(
    invoker: &UploadInvoker,
    items: &[UploadItem],
    cycle_id: &str,
) -> BatchResult {
    let mut progress = CycleProgress::new(cycle_id, items.len());
    let mut outcomes = Vec::with_capacity(items.len());

    for item in items {
        progress.record_current(item.name());
        let outcome = invoker.invoke(item).await;
        progress.record_outcome(&outcome);
        outcomes.push(outcome);
    }

    progress.finish();
    BatchResult::from_outcomes(outcomes)
}
