//! Bounded worker pool in front of the pipeline.
//!
//! `num_workers` tasks pull jobs from a queue of `queue_capacity` slots, so
//! at most `num_workers` requests extract or infer at once. When the queue
//! is full, [`SummaryPool::try_submit`] turns new work away instead of
//! letting it pile up behind the model.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::orchestrator::Pipeline;
use crate::{InputBundle, SummarizeError, SummaryReport};

pub type JobResult = Result<SummaryReport, SummarizeError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("job queue is full")]
    Full,
    #[error("pool is shut down")]
    Closed,
}

impl From<PoolError> for SummarizeError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::Full => SummarizeError::Busy,
            PoolError::Closed => SummarizeError::ExtractionDispatch(e.to_string()),
        }
    }
}

/// A summarization request submitted to the pool.
pub struct SummaryJob {
    pub input: InputBundle,
    pub result_tx: oneshot::Sender<JobResult>,
}

/// A fixed set of worker tasks sharing one [`Pipeline`].
pub struct SummaryPool {
    job_tx: async_channel::Sender<SummaryJob>,
    pool_handle: JoinHandle<()>,
    num_workers: usize,
}

impl SummaryPool {
    /// Spawn `num_workers` workers behind a queue holding `queue_capacity` jobs.
    pub fn new(pipeline: Arc<Pipeline>, num_workers: usize, queue_capacity: usize) -> Self {
        let num_workers = num_workers.max(1);
        let (job_tx, job_rx) = async_channel::bounded::<SummaryJob>(queue_capacity.max(1));

        let pool_handle = tokio::spawn(async move {
            let mut handles = Vec::with_capacity(num_workers);
            for worker in 0..num_workers {
                handles.push(tokio::spawn(worker_loop(
                    worker,
                    job_rx.clone(),
                    Arc::clone(&pipeline),
                )));
            }

            // Drop our clone so workers are the last holders
            drop(job_rx);

            for h in handles {
                let _ = h.await;
            }
        });

        Self {
            job_tx,
            pool_handle,
            num_workers,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.job_tx.len()
    }

    /// Queue a job, failing immediately if the queue is full.
    pub fn try_submit(&self, input: InputBundle) -> Result<oneshot::Receiver<JobResult>, PoolError> {
        let (result_tx, result_rx) = oneshot::channel();
        self.job_tx
            .try_send(SummaryJob { input, result_tx })
            .map_err(|e| match e {
                async_channel::TrySendError::Full(_) => PoolError::Full,
                async_channel::TrySendError::Closed(_) => PoolError::Closed,
            })?;
        Ok(result_rx)
    }

    /// Queue a job, waiting for a free slot.
    pub async fn submit(&self, input: InputBundle) -> Result<oneshot::Receiver<JobResult>, PoolError> {
        let (result_tx, result_rx) = oneshot::channel();
        self.job_tx
            .send(SummaryJob { input, result_tx })
            .await
            .map_err(|_| PoolError::Closed)?;
        Ok(result_rx)
    }

    /// Submit without waiting for queue space and await the result.
    pub async fn run(&self, input: InputBundle) -> JobResult {
        let rx = self.try_submit(input)?;
        rx.await
            .map_err(|_| SummarizeError::ExtractionDispatch("worker dropped the request".into()))?
    }

    /// Stop accepting jobs, let queued ones finish, and wait for the workers.
    pub async fn shutdown(self) {
        self.job_tx.close();
        let _ = self.pool_handle.await;
    }
}

async fn worker_loop(
    worker: usize,
    jobs: async_channel::Receiver<SummaryJob>,
    pipeline: Arc<Pipeline>,
) {
    while let Ok(job) = jobs.recv().await {
        if job.result_tx.is_closed() {
            tracing::debug!(worker, "requester went away, skipping job");
            continue;
        }
        let result = pipeline.run(job.input).await;
        let _ = job.result_tx.send(result);
    }
    tracing::debug!(worker, "worker exiting");
}
