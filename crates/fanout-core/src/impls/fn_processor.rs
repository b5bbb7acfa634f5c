//! FnProcessor - クロージャを Processor として使うためのアダプタ

use async_trait::async_trait;

use crate::domain::{FanoutError, WorkItem};
use crate::ports::Processor;

pub struct FnProcessor<F> {
    f: F,
}

impl<F> FnProcessor<F>
where
    F: Fn(WorkItem) -> Result<i64, FanoutError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Processor for FnProcessor<F>
where
    F: Fn(WorkItem) -> Result<i64, FanoutError> + Send + Sync,
{
    async fn process(&self, item: WorkItem) -> Result<i64, FanoutError> {
        (self.f)(item)
    }
}

/// Shorthand for [`FnProcessor::new`].
pub fn from_fn<F>(f: F) -> FnProcessor<F>
where
    F: Fn(WorkItem) -> Result<i64, FanoutError> + Send + Sync,
{
    FnProcessor::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn calls_the_closure() {
        let p = from_fn(|item| Ok(item.value() + 1));
        assert_eq!(p.process(WorkItem::new(41)).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn propagates_closure_errors() {
        let p = from_fn(|_| Err(FanoutError::DivisionByZero));
        assert!(p.process(WorkItem::new(1)).await.is_err());
    }
}
