//! NonNegative - 負の入力を拒否する Processor ラッパー

use async_trait::async_trait;

use crate::domain::{FanoutError, WorkItem};
use crate::ports::Processor;

/// Fails negative items with `NegativeValue` (400) before they reach `inner`.
///
/// ```ignore
/// let pool = FixedWorkerPool::new(3, NonNegative::new(Doubler::default()))?;
/// ```
#[derive(Debug, Clone)]
pub struct NonNegative<P> {
    inner: P,
}

impl<P: Processor> NonNegative<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

#[async_trait]
impl<P: Processor> Processor for NonNegative<P> {
    async fn process(&self, item: WorkItem) -> Result<i64, FanoutError> {
        let value = item.value();
        if value < 0 {
            return Err(FanoutError::NegativeValue { value });
        }
        self.inner.process(item).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{Doubler, from_fn};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn passes_non_negative_through() {
        let processor = NonNegative::new(Doubler::immediate());
        assert_eq!(processor.process(WorkItem::new(0)).await.unwrap(), 0);
        assert_eq!(processor.process(WorkItem::new(21)).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn rejects_negative_without_calling_inner() {
        let calls = AtomicUsize::new(0);
        let processor = NonNegative::new(from_fn(|item| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(item.value())
        }));

        let err = processor.process(WorkItem::new(-5)).await.unwrap_err();
        assert!(matches!(err, FanoutError::NegativeValue { value: -5 }));
        assert_eq!(err.code(), 400);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn inner_errors_are_kept() {
        let err = NonNegative::new(Doubler::immediate())
            .process(WorkItem::new(i64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, FanoutError::Overflow { .. }));
    }
}
