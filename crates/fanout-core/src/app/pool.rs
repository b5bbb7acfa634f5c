//! FixedWorkerPool - 固定数ワーカーでバッチを処理する
//!
//! # フロー
//! 1. ワーカーを N 本 spawn（入力キューの Receiver を共有）
//! 2. producer が全 item を入力キューに積んで close
//! 3. 出力キューからちょうど `len(items)` 件受け取る
//! 4. 全ワーカーの終了を待って BatchReport を返す
//!
//! # 失敗時
//! - `FailBatch`: abort フラグを立てて claim を止め、`ItemFailed` を返す
//! - `SkipAndReport`: `ItemFailure` として記録して続行

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::Instrument;

use super::builder::PoolBuilder;
use super::config::{FailurePolicy, PoolConfig};
use super::status::BatchReport;
use super::worker_loop::{Job, WorkerEvent, WorkerLoop};
use crate::domain::{BatchId, BuildError, FanoutError, ItemFailure, WorkItem, WorkResult, WorkerId};
use crate::ports::Processor;

/// A fixed-size pool of concurrent workers.
///
/// The pool itself holds no per-batch state: every `run*` call creates its
/// own queues and workers and tears them down before returning, so one pool
/// can run many batches (sequentially or concurrently).
///
/// # 使用例
/// ```ignore
/// let pool = FixedWorkerPool::new(3, Doubler::default())?;
/// let results = pool.run([1, 2, 3, 4, 5]).await?;
/// ```
pub struct FixedWorkerPool {
    config: PoolConfig,
    processor: Arc<dyn Processor>,
}

impl FixedWorkerPool {
    /// Pool with `workers` workers and default settings otherwise.
    pub fn new<P: Processor + 'static>(workers: usize, processor: P) -> Result<Self, BuildError> {
        PoolBuilder::new().workers(workers).processor(processor).build()
    }

    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    /// Caller must have validated `config`.
    pub(crate) fn from_parts(config: PoolConfig, processor: Arc<dyn Processor>) -> Self {
        Self { config, processor }
    }

    pub fn worker_count(&self) -> usize {
        self.config.workers
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Process `items` and return one result per item, in arrival order.
    pub async fn run<I>(&self, items: I) -> Result<Vec<WorkResult>, FanoutError>
    where
        I: IntoIterator,
        I::Item: Into<WorkItem>,
    {
        Ok(self.run_batch(items).await?.results)
    }

    /// Like [`run`](Self::run), with results sorted by submission order.
    pub async fn run_ordered<I>(&self, items: I) -> Result<Vec<WorkResult>, FanoutError>
    where
        I: IntoIterator,
        I::Item: Into<WorkItem>,
    {
        Ok(self.run_batch(items).await?.into_ordered_results())
    }

    /// Process `items` and return the full report.
    pub async fn run_batch<I>(&self, items: I) -> Result<BatchReport, FanoutError>
    where
        I: IntoIterator,
        I::Item: Into<WorkItem>,
    {
        let items: Vec<WorkItem> = items.into_iter().map(Into::into).collect();
        let batch_id = BatchId::new();
        let span = tracing::info_span!("batch", batch = %batch_id);
        self.execute(batch_id, items).instrument(span).await
    }

    async fn execute(&self, batch_id: BatchId, items: Vec<WorkItem>) -> Result<BatchReport, FanoutError> {
        let started_at = Utc::now();
        let expected = items.len();
        let worker_count = self.config.workers;
        let policy = self.config.failure_policy;
        // 容量はバッチ長（最低 1）で頭打ち
        let capacity = self
            .config
            .queue_capacity
            .map_or(expected, |c| c.min(expected))
            .max(1);

        tracing::info!(items = expected, workers = worker_count, capacity, %policy, "batch started");

        let (job_tx, job_rx) = mpsc::channel::<Job>(capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<WorkerEvent>();
        let (abort_tx, abort_rx) = watch::channel(false);

        let mut handles = Vec::with_capacity(worker_count);
        for n in 1..=worker_count {
            let id = WorkerId::new(n);
            let worker = WorkerLoop::new(
                id,
                Arc::clone(&job_rx),
                event_tx.clone(),
                Arc::clone(&self.processor),
                self.config.retry.clone(),
                abort_rx.clone(),
            );
            let span = tracing::info_span!("worker", %id);
            handles.push((id, tokio::spawn(worker.run().instrument(span))));
        }
        // ワーカーだけが持つ: 全員抜けたら入力 Receiver と出力 Sender が閉じる
        drop(job_rx);
        drop(event_tx);

        // 入力キューが items より小さくても結果の受信と並行して積めるよう、producer は別タスク
        let feeder = tokio::spawn(
            async move {
                for (seq, item) in items.into_iter().enumerate() {
                    let seq = seq as u64;
                    if job_tx.send(Job { seq, item }).await.is_err() {
                        tracing::debug!(seq, "input queue closed before all items were submitted");
                        break;
                    }
                }
                // job_tx drop = 入力キュー close
            }
            .in_current_span(),
        );

        let mut results = Vec::with_capacity(expected);
        let mut failures = Vec::new();
        let mut aborted: Option<FanoutError> = None;

        while results.len() + failures.len() < expected {
            let Some(event) = event_rx.recv().await else {
                break;
            };
            match event {
                WorkerEvent::Completed(result) => {
                    tracing::debug!(seq = result.seq, value = result.value, worker = %result.worker, "result");
                    results.push(result);
                }
                WorkerEvent::Failed {
                    seq,
                    item,
                    worker,
                    attempts,
                    error,
                } => match policy {
                    FailurePolicy::SkipAndReport => {
                        tracing::warn!(seq, %item, %worker, attempts, %error, "item failed, skipping");
                        failures.push(ItemFailure::new(seq, item, worker, attempts, &error));
                    }
                    FailurePolicy::FailBatch => {
                        tracing::error!(seq, %item, %worker, attempts, %error, "item failed, aborting batch");
                        let _ = abort_tx.send(true);
                        aborted = Some(FanoutError::ItemFailed {
                            seq,
                            item,
                            worker,
                            source: Box::new(error),
                        });
                        break;
                    }
                },
            }
        }
        let received = results.len() + failures.len();
        drop(event_rx);

        let mut workers = Vec::with_capacity(worker_count);
        let mut worker_error: Option<FanoutError> = None;
        for (id, handle) in handles {
            match handle.await {
                Ok(Ok(report)) => workers.push(report),
                Ok(Err(error)) => {
                    tracing::error!(worker = %id, %error, "worker failed");
                    worker_error.get_or_insert(error);
                }
                Err(join_error) if join_error.is_panic() => {
                    tracing::error!(worker = %id, "worker panicked");
                    worker_error.get_or_insert(FanoutError::WorkerPanicked { worker: id });
                }
                Err(join_error) => {
                    tracing::warn!(worker = %id, %join_error, "worker task cancelled");
                }
            }
        }
        // 全ワーカーが抜けた時点で入力 Receiver は drop 済みなので、feeder は必ず終わる
        let _ = feeder.await;
        drop(abort_tx);

        if let Some(error) = aborted {
            return Err(error);
        }
        if let Some(error) = worker_error {
            return Err(error);
        }
        if received < expected {
            return Err(FanoutError::ResultsClosed { received, expected });
        }

        let report = BatchReport {
            batch_id,
            worker_count,
            submitted: expected,
            started_at,
            finished_at: Utc::now(),
            results,
            failures,
            workers,
        };
        let counts = report.counts();
        tracing::info!(
            succeeded = counts.succeeded,
            failed = counts.failed,
            elapsed_ms = report.elapsed().num_milliseconds(),
            "batch finished"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for FixedWorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedWorkerPool")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
