//! Errors - エラー型と分類
//!
//! `FanoutError` は条件ごとに variant を分け、各 variant は必要なフィールドだけを持つ。
//! `ErrorKind` は運用上の分類で、明示的な discriminant（ステータスコード）を持つ。

use thiserror::Error;

use super::ids::WorkerId;
use super::state::WorkerState;
use super::work::WorkItem;

/// ErrorKind は実行エラーの分類
///
/// discriminant はそのまま `FanoutError::code()` になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorKind {
    /// 入力が不正（リトライ無意味）
    InvalidInput = 400,
    /// 内部エラー（バグ、パニック）
    Internal = 500,
    /// 算術エラー（ゼロ除算、オーバーフロー）
    Arithmetic = 422,
    /// 一時的なエラー（リトライ対象）
    Transient = 503,
}

impl ErrorKind {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

/// Pool construction errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("retry max_attempts must be at least 1")]
    ZeroMaxAttempts,

    #[error("retry multiplier must be a finite number >= 1.0, got {0}")]
    InvalidMultiplier(f64),

    #[error("no processor was configured")]
    MissingProcessor,

    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("failed to read config {path}: {message}")]
    ConfigFile { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("negative value not allowed: {value}")]
    NegativeValue { value: i64 },

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow while processing {value}")]
    Overflow { value: i64 },

    #[error("transient failure: {message}")]
    Transient { message: String },

    #[error("item #{seq} ({item}) failed on {worker}: {source}")]
    ItemFailed {
        seq: u64,
        item: WorkItem,
        worker: WorkerId,
        #[source]
        source: Box<FanoutError>,
    },

    #[error("{worker} panicked")]
    WorkerPanicked { worker: WorkerId },

    #[error("result queue closed after {received} of {expected} results")]
    ResultsClosed { received: usize, expected: usize },

    #[error("{worker}: invalid state transition {from:?} -> {to:?}")]
    InvalidTransition {
        worker: WorkerId,
        from: WorkerState,
        to: WorkerState,
    },

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl FanoutError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FanoutError::NegativeValue { .. } | FanoutError::Build(_) => ErrorKind::InvalidInput,
            FanoutError::DivisionByZero | FanoutError::Overflow { .. } => ErrorKind::Arithmetic,
            FanoutError::Transient { .. } => ErrorKind::Transient,
            FanoutError::ItemFailed { source, .. } => source.kind(),
            FanoutError::WorkerPanicked { .. }
            | FanoutError::ResultsClosed { .. }
            | FanoutError::InvalidTransition { .. } => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> u16 {
        self.kind().code()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
