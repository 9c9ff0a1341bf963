use crate::codec::{Codec, ImageCodec};
use crate::constants::{DEFAULT_CONCURRENCY, DEFAULT_JOB_TIMEOUT_SECS};
use crate::error::CompressionError;
use crate::processing::{encode_job, CompressionRequest};
use crate::report::{BatchReport, CompressionOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs compression jobs with per-item failure isolation.
///
/// Items are processed by at most `concurrency` workers (1 means strictly
/// sequential). Whatever the completion order, the report lists outcomes in
/// input order.
#[derive(Clone)]
pub struct BatchAggregator {
    codec: Arc<dyn Codec>,
    concurrency: usize,
    timeout: Duration,
}

impl Default for BatchAggregator {
    fn default() -> Self {
        Self::new(Arc::new(ImageCodec::new()))
    }
}

impl BatchAggregator {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            codec,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
        }
    }

    /// `0` selects one worker per CPU.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = if concurrency == 0 {
            num_cpus::get()
        } else {
            concurrency
        };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a single job, converting any failure into a failed outcome.
    pub async fn run_one(&self, request: CompressionRequest) -> CompressionOutcome {
        run_with_timeout(self.codec.clone(), request, self.timeout).await
    }

    pub async fn run(&self, requests: Vec<CompressionRequest>) -> BatchReport {
        self.run_with_progress(requests, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_item` as each item finishes.
    pub async fn run_with_progress<F>(
        &self,
        requests: Vec<CompressionRequest>,
        on_item: F,
    ) -> BatchReport
    where
        F: Fn(&CompressionOutcome),
    {
        let start = Instant::now();
        let total = requests.len();
        let mut slots: Vec<Option<CompressionOutcome>> = vec![None; total];

        if self.concurrency <= 1 {
            for (index, request) in requests.into_iter().enumerate() {
                let outcome = self.run_one(request).await;
                on_item(&outcome);
                slots[index] = Some(outcome);
            }
        } else {
            let permits = Arc::new(Semaphore::new(self.concurrency));
            let mut tasks = JoinSet::new();
            let mut identifiers = Vec::with_capacity(total);

            for (index, request) in requests.into_iter().enumerate() {
                identifiers.push(request.identifier());
                let permits = permits.clone();
                let codec = self.codec.clone();
                let timeout = self.timeout;
                tasks.spawn(async move {
                    // The semaphore is never closed, so acquire cannot fail.
                    let _permit = permits.acquire_owned().await.ok();
                    (index, run_with_timeout(codec, request, timeout).await)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, outcome)) => {
                        on_item(&outcome);
                        slots[index] = Some(outcome);
                    }
                    Err(e) => tracing::error!(error = %e, "batch worker failed"),
                }
            }

            // A worker that panicked leaves its slot empty.
            for (slot, identifier) in slots.iter_mut().zip(identifiers) {
                if slot.is_none() {
                    let outcome = CompressionOutcome::failed(
                        identifier,
                        CompressionError::TaskFailed("worker terminated unexpectedly".to_string()),
                    );
                    on_item(&outcome);
                    *slot = Some(outcome);
                }
            }
        }

        let report = BatchReport::from_outcomes(slots.into_iter().flatten().collect());
        tracing::info!(
            total = report.total_count(),
            succeeded = report.success_count,
            original = report.total_original,
            compressed = report.total_compressed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch finished"
        );
        report
    }
}

async fn run_with_timeout(
    codec: Arc<dyn Codec>,
    request: CompressionRequest,
    timeout: Duration,
) -> CompressionOutcome {
    let identifier = request.identifier();
    // The limit covers reading and encoding only; once the output write has
    // started it runs to completion.
    let result = match tokio::time::timeout(timeout, encode_job(codec, request)).await {
        Ok(Ok(encoded)) => encoded.finish().await,
        Ok(Err(e)) => Err(e),
        Err(_) => Err(CompressionError::Timeout(timeout)),
    };

    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(item = %identifier, kind = %e.kind(), error = %e, "compression failed");
            CompressionOutcome::failed(identifier, e)
        }
    }
}
