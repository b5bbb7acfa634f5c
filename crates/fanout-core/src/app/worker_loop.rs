//! WorkerLoop - ワーカー 1 本分の実行ループ
//!
//! # フロー
//! 1. 入力キューから 1 件 claim（キューが閉じて空なら終了）
//! 2. Processor 実行（transient エラーは RetryPolicy に従ってリトライ）
//! 3. 結果 or 失敗を出力キューへ publish
//! 4. Idle に戻って 1 へ
//!
//! 入力キューの Receiver は全ワーカーで共有する（`Arc<Mutex<Receiver>>`）。
//! ロックを持っている間に待つのは `recv()` だけで、Processor 実行中はロックを持たない。

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};

use super::retry::RetryPolicy;
use super::status::WorkerReport;
use crate::domain::{FanoutError, WorkItem, WorkResult, WorkerId, WorkerState};
use crate::ports::Processor;

/// An item on the input queue, tagged with its submission position.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Job {
    pub seq: u64,
    pub item: WorkItem,
}

/// What a worker pushes to the output queue.
#[derive(Debug)]
pub(crate) enum WorkerEvent {
    Completed(WorkResult),
    Failed {
        seq: u64,
        item: WorkItem,
        worker: WorkerId,
        attempts: u32,
        error: FanoutError,
    },
}

pub(crate) struct WorkerLoop {
    id: WorkerId,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    events: mpsc::UnboundedSender<WorkerEvent>,
    processor: Arc<dyn Processor>,
    retry: RetryPolicy,
    abort_rx: watch::Receiver<bool>,
    state: WorkerState,
    processed: usize,
}

impl WorkerLoop {
    pub(crate) fn new(
        id: WorkerId,
        jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
        events: mpsc::UnboundedSender<WorkerEvent>,
        processor: Arc<dyn Processor>,
        retry: RetryPolicy,
        abort_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            jobs,
            events,
            processor,
            retry,
            abort_rx,
            state: WorkerState::Idle,
            processed: 0,
        }
    }

    /// Run until the input queue is closed and drained, or the batch is aborted.
    pub(crate) async fn run(mut self) -> Result<WorkerReport, FanoutError> {
        while let Some(job) = self.claim().await {
            self.transition(WorkerState::Claimed)?;
            tracing::info!(worker = %self.id, seq = job.seq, item = %job.item, "processing item");

            self.transition(WorkerState::Processing)?;
            let (outcome, attempts) = self.process_with_retry(job.item).await;

            self.transition(WorkerState::Publishing)?;
            let event = match outcome {
                Ok(value) => WorkerEvent::Completed(WorkResult {
                    seq: job.seq,
                    item: job.item,
                    value,
                    worker: self.id,
                }),
                Err(error) => WorkerEvent::Failed {
                    seq: job.seq,
                    item: job.item,
                    worker: self.id,
                    attempts,
                    error,
                },
            };
            self.processed += 1;
            let published = self.events.send(event).is_ok();
            self.transition(WorkerState::Idle)?;

            if !published {
                // バッチ側が結果の受信をやめた（abort 済み）
                tracing::debug!(worker = %self.id, "result queue closed, stopping");
                break;
            }
        }

        self.transition(WorkerState::Done)?;
        tracing::debug!(worker = %self.id, processed = self.processed, "worker done");

        Ok(WorkerReport {
            worker: self.id,
            processed: self.processed,
            final_state: self.state,
        })
    }

    /// Take the next item, or `None` when the queue is closed and empty or the batch aborted.
    async fn claim(&mut self) -> Option<Job> {
        if *self.abort_rx.borrow() {
            return None;
        }

        let mut jobs = self.jobs.lock().await;
        tokio::select! {
            biased;
            _ = self.abort_rx.changed() => None,
            job = jobs.recv() => job,
        }
    }

    async fn process_with_retry(&self, item: WorkItem) -> (Result<i64, FanoutError>, u32) {
        let mut attempt = 1;
        loop {
            match self.processor.process(item).await {
                Ok(value) => return (Ok(value), attempt),
                Err(error) if error.is_retryable() && self.retry.allows_retry_after(attempt) => {
                    let delay = self.retry.next_delay(attempt);
                    tracing::warn!(
                        worker = %self.id,
                        %item,
                        attempt,
                        ?delay,
                        %error,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return (Err(error), attempt),
            }
        }
    }

    fn transition(&mut self, to: WorkerState) -> Result<(), FanoutError> {
        if !self.state.can_transition_to(to) {
            return Err(FanoutError::InvalidTransition {
                worker: self.id,
                from: self.state,
                to,
            });
        }
        tracing::trace!(worker = %self.id, from = ?self.state, ?to, "state");
        self.state = to;
        Ok(())
    }
}
