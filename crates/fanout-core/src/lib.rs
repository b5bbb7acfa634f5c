//! fanout-core
//!
//! Fixed-size worker pool: a producer submits a finite batch of work items,
//! N workers drain a shared input queue, and the producer collects one
//! result per item.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, work, state, errors）
//! - **ports**: 抽象化レイヤー（Processor）
//! - **app**: アプリケーションロジック（builder, pool, worker_loop, config, retry, status）
//! - **impls**: Processor の実装（Doubler, Divider, FnProcessor）
//! - **logging**: tracing subscriber の初期化
//! - **observability**: バッチ単位のカウント

pub mod app;
pub mod domain;
pub mod impls;
pub mod logging;
pub mod observability;
pub mod ports;

pub use app::{BatchReport, FailurePolicy, FixedWorkerPool, PoolBuilder, PoolConfig, RetryPolicy};
pub use domain::{BuildError, ErrorKind, FanoutError, WorkItem, WorkResult};
pub use ports::Processor;
