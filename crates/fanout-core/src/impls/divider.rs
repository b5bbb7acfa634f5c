//! Divider - 整数除算の Processor（ゼロ除算ガード付き）

use async_trait::async_trait;

use crate::domain::{FanoutError, WorkItem};
use crate::ports::Processor;

/// Returns `n / divisor` (truncating toward zero).
#[derive(Debug, Clone, Copy)]
pub struct Divider {
    divisor: i64,
}

impl Divider {
    pub fn new(divisor: i64) -> Self {
        Self { divisor }
    }
}

#[async_trait]
impl Processor for Divider {
    async fn process(&self, item: WorkItem) -> Result<i64, FanoutError> {
        let value = item.value();
        if self.divisor == 0 {
            return Err(FanoutError::DivisionByZero);
        }
        // i64::MIN / -1
        value
            .checked_div(self.divisor)
            .ok_or(FanoutError::Overflow { value })
    }
}
