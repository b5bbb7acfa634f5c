//! PoolConfig - プールのパラメータ
//!
//! 優先順位（低 → 高）: `Default` → JSON ファイル → `FANOUT_*` 環境変数 → CLI フラグ。
//! CLI フラグの適用は fanout-cli 側で行う。
//!
//! # Environment Variables
//!
//! - `FANOUT_WORKERS` - worker count
//! - `FANOUT_QUEUE_CAPACITY` - input queue capacity (default: batch length)
//! - `FANOUT_FAILURE_POLICY` - `fail-batch` or `skip`
//! - `FANOUT_MAX_ATTEMPTS` - attempts per item for transient errors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::retry::RetryPolicy;
use crate::domain::BuildError;

/// What the pool does when the processor fails for an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort on the first failure: stop claiming, return the error.
    #[default]
    FailBatch,
    /// Record the failure in the report and keep going.
    #[serde(alias = "skip")]
    SkipAndReport,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail-batch" | "fail" => Ok(Self::FailBatch),
            "skip-and-report" | "skip" => Ok(Self::SkipAndReport),
            _ => Err(format!(
                "Unknown failure policy: '{}'. Valid options: fail-batch, skip",
                s
            )),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailBatch => write!(f, "fail-batch"),
            Self::SkipAndReport => write!(f, "skip"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub workers: usize,
    /// `None` means "as large as the batch", so the producer never blocks.
    /// Larger values are clamped to the batch length when a batch runs.
    pub queue_capacity: Option<usize>,
    pub failure_policy: FailurePolicy,
    pub retry: RetryPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            queue_capacity: None,
            failure_policy: FailurePolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl PoolConfig {
    pub const ENV_WORKERS: &'static str = "FANOUT_WORKERS";
    pub const ENV_QUEUE_CAPACITY: &'static str = "FANOUT_QUEUE_CAPACITY";
    pub const ENV_FAILURE_POLICY: &'static str = "FANOUT_FAILURE_POLICY";
    pub const ENV_MAX_ATTEMPTS: &'static str = "FANOUT_MAX_ATTEMPTS";

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let config_error = |message: String| BuildError::ConfigFile {
            path: path.display().to_string(),
            message,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| config_error(e.to_string()))
    }

    /// Apply `FANOUT_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, BuildError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (the environment, in production).
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, BuildError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(Self::ENV_WORKERS) {
            self.workers = parse_env(Self::ENV_WORKERS, v)?;
        }
        if let Some(v) = lookup(Self::ENV_QUEUE_CAPACITY) {
            self.queue_capacity = Some(parse_env(Self::ENV_QUEUE_CAPACITY, v)?);
        }
        if let Some(v) = lookup(Self::ENV_FAILURE_POLICY) {
            self.failure_policy = parse_env(Self::ENV_FAILURE_POLICY, v)?;
        }
        if let Some(v) = lookup(Self::ENV_MAX_ATTEMPTS) {
            self.retry.max_attempts = parse_env(Self::ENV_MAX_ATTEMPTS, v)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.workers == 0 {
            return Err(BuildError::InvalidWorkerCount(self.workers));
        }
        if self.queue_capacity == Some(0) {
            return Err(BuildError::ZeroQueueCapacity);
        }
        if self.retry.max_attempts == 0 {
            return Err(BuildError::ZeroMaxAttempts);
        }
        let multiplier = self.retry.multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(BuildError::InvalidMultiplier(multiplier));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &'static str, value: String) -> Result<T, BuildError> {
    value
        .trim()
        .parse()
        .map_err(|_| BuildError::InvalidEnv { key, value })
}
