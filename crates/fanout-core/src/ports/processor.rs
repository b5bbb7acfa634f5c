//! Processor port - `WorkItem` を結果に変換する
//!
//! プールは Processor の中身を知らない。ワーカーは claim した item を
//! `process()` に渡し、返ってきた値（またはエラー）を出力キューに流すだけ。

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{FanoutError, WorkItem};

/// A processor for work items.
///
/// # 設計原則
/// - 同じ item には同じ結果を返す（プールは結果をキャッシュも比較もしない）
/// - 無期限にブロックしない（タイムアウトは持たないので、止まるとバッチも止まる）
/// - 失敗は `FanoutError` で返す。`ErrorKind::Transient` のものだけがリトライ対象
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, item: WorkItem) -> Result<i64, FanoutError>;
}

#[async_trait]
impl<P: Processor + ?Sized> Processor for Arc<P> {
    async fn process(&self, item: WorkItem) -> Result<i64, FanoutError> {
        (**self).process(item).await
    }
}
