//! PoolBuilder - プールの構築と検証
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: 不正な設定は `build()` で弾き、`run` までは持ち込まない

use std::sync::Arc;

use super::config::{FailurePolicy, PoolConfig};
use super::pool::FixedWorkerPool;
use super::retry::RetryPolicy;
use crate::domain::BuildError;
use crate::ports::Processor;

/// PoolBuilder は FixedWorkerPool を構築
///
/// # 使用例
/// ```ignore
/// let pool = PoolBuilder::new()
///     .workers(4)
///     .failure_policy(FailurePolicy::SkipAndReport)
///     .processor(Doubler::default())
///     .build()?;
/// ```
pub struct PoolBuilder {
    config: PoolConfig,
    processor: Option<Arc<dyn Processor>>,
}

impl PoolBuilder {
    pub fn new() -> Self {
        Self::from_config(PoolConfig::default())
    }

    /// Seed every setting from `config`; later calls override it.
    pub fn from_config(config: PoolConfig) -> Self {
        Self {
            config,
            processor: None,
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn processor<P: Processor + 'static>(self, processor: P) -> Self {
        self.shared_processor(Arc::new(processor))
    }

    /// Use a processor that is also held elsewhere.
    pub fn shared_processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// # 検証
    /// - worker 数 >= 1
    /// - queue capacity >= 1（指定した場合）
    /// - retry max_attempts >= 1
    /// - processor が設定済み
    pub fn build(self) -> Result<FixedWorkerPool, BuildError> {
        self.config.validate()?;
        let processor = self.processor.ok_or(BuildError::MissingProcessor)?;
        Ok(FixedWorkerPool::from_parts(self.config, processor))
    }
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
