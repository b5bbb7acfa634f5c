//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **PoolBuilder**: プールの構築と検証
//! - **FixedWorkerPool**: バッチの投入・分配・回収
//! - **WorkerLoop**: ワーカー 1 本の実行ループ（claim→process→publish）
//! - **PoolConfig / RetryPolicy**: 設定
//! - **BatchReport**: 実行結果

pub mod builder;
pub mod config;
pub mod pool;
pub mod retry;
pub mod status;
mod worker_loop;

pub use self::builder::PoolBuilder;
pub use self::config::{FailurePolicy, PoolConfig};
pub use self::pool::FixedWorkerPool;
pub use self::retry::RetryPolicy;
pub use self::status::{BatchReport, WorkerReport};
