use tokio::time::{Duration, Instant};

use super::types::UploadOutcome;

/// Running counters for one orchestration cycle, used for progress logging.
#[derive(Debug)]
pub struct CycleProgress {
    cycle_id: String,
    total: usize,
    completed: usize,
    successful: usize,
    failed: usize,
    started: Instant,
}

impl CycleProgress {
    pub fn new(cycle_id: &str, total: usize) -> Self {
        Self {
            cycle_id: cycle_id.to_string(),
            total,
            completed: 0,
            successful: 0,
            failed: 0,
            started: Instant::now(),
        }
    }

    /// Log the item about to be uploaded
    pub fn record_current(&self, name: &str) {
        log::debug!(
            "[{}] Uploading {} ({}/{})",
            self.cycle_id,
            name,
            self.completed + 1,
            self.total
        );
    }

    pub fn record_outcome(&mut self, outcome: &UploadOutcome) {
        self.completed += 1;
        match outcome {
            UploadOutcome::Success(item) => {
                self.successful += 1;
                log::info!(
                    "[{}] Uploaded {} ({}/{})",
                    self.cycle_id,
                    item.name(),
                    self.completed,
                    self.total
                );
            }
            UploadOutcome::Failure(failure) => {
                self.failed += 1;
                log::warn!(
                    "[{}] Failed to upload {} - {} ({}/{})",
                    self.cycle_id,
                    failure.file_name(),
                    failure.kind,
                    self.completed,
                    self.total
                );
            }
        }

        if let Some(eta) = self.estimated_remaining() {
            log::debug!(
                "[{}] ETA {}s for {} remaining",
                self.cycle_id,
                eta.as_secs(),
                self.total - self.completed
            );
        }
    }

    /// Linear estimate from the average time per completed item.
    pub fn estimated_remaining(&self) -> Option<Duration> {
        if self.completed == 0 || self.completed >= self.total {
            return None;
        }
        let per_item = self.started.elapsed().as_secs_f64() / self.completed as f64;
        let remaining = (self.total - self.completed) as f64;
        Some(Duration::from_secs_f64(per_item * remaining))
    }

    pub fn finish(&self) {
        log::info!(
            "[{}] Cycle finished: {}/{} successful, {} failed in {:?}",
            self.cycle_id,
            self.successful,
            self.total,
            self.failed,
            self.started.elapsed()
        );
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}
