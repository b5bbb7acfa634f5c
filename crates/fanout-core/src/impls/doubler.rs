//! Doubler - 一定時間待ってから 2 倍にする基準 Processor

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{FanoutError, WorkItem};
use crate::ports::Processor;

/// Sleeps for `delay`, then returns `2 * n` for any `n`.
///
/// オーバーフローのみ `Overflow` で失敗する。負の値を弾きたい場合は
/// [`NonNegative`](super::NonNegative) で包む。
#[derive(Debug, Clone)]
pub struct Doubler {
    delay: Duration,
}

impl Doubler {
    /// Delay used by the reference batch.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// No delay; for tests and benchmarks.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for Doubler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

#[async_trait]
impl Processor for Doubler {
    async fn process(&self, item: WorkItem) -> Result<i64, FanoutError> {
        let value = item.value();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        value
            .checked_mul(2)
            .ok_or(FanoutError::Overflow { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 2)]
    #[case(21, 42)]
    #[case(-3, -6)]
    #[case(i64::MAX / 2, i64::MAX - 1)]
    #[case(i64::MIN / 2, i64::MIN)]
    #[tokio::test]
    async fn doubles_any_value(#[case] input: i64, #[case] expected: i64) {
        let out = Doubler::immediate().process(WorkItem::new(input)).await.unwrap();
        assert_eq!(out, expected);
    }

    #[rstest]
    #[case(i64::MAX)]
    #[case(i64::MIN)]
    #[tokio::test]
    async fn reports_overflow(#[case] input: i64) {
        let err = Doubler::immediate()
            .process(WorkItem::new(input))
            .await
            .unwrap_err();
        assert!(matches!(err, FanoutError::Overflow { value } if value == input));
        assert_eq!(err.code(), 422);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_delay() {
        let doubler = Doubler::default();
        let start = tokio::time::Instant::now();
        doubler.process(WorkItem::new(3)).await.unwrap();
        assert!(start.elapsed() >= Doubler::DEFAULT_DELAY);
    }
}
