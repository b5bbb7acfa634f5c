use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use fanout_core::impls::{Divider, Doubler, NonNegative};
use fanout_core::logging::{self, LogConfig, LogFormat};
use fanout_core::{BatchReport, FailurePolicy, PoolBuilder, PoolConfig, Processor};

/// Upper bound for `--count`; the whole batch is built up front.
const MAX_COUNT: i64 = 1_000_000;

/// Run one batch of integers through a fixed-size worker pool.
#[derive(Parser, Debug)]
#[command(name = "fanout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Items to process. Defaults to 1..=COUNT.
    #[arg(allow_negative_numbers = true)]
    items: Vec<i64>,

    /// Number of items to generate when none are given.
    #[arg(
        short = 'n',
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(0..=MAX_COUNT)
    )]
    count: u32,

    /// Number of workers (overrides config file and FANOUT_WORKERS).
    #[arg(short, long)]
    workers: Option<usize>,

    /// What each worker does with an item.
    #[arg(long, value_enum, default_value_t = Op::Double)]
    op: Op,

    /// Per-item delay for `--op double`, in milliseconds.
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Divisor for `--op divide`.
    #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
    divisor: i64,

    /// Fail negative items instead of processing them.
    #[arg(long)]
    reject_negative: bool,

    /// What to do when an item fails: fail-batch or skip.
    #[arg(long)]
    policy: Option<FailurePolicy>,

    /// Attempts per item for transient failures.
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Input queue capacity (default: batch length).
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// JSON file with pool settings.
    #[arg(long, env = "FANOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose logging (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format: pretty, compact, json.
    #[arg(long)]
    log_format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Op {
    Double,
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::from_verbosity(self.verbose);
        if let Some(format) = self.log_format {
            config = config.with_format(format);
        }
        // -v が指定されたら env の filter より優先
        if self.verbose > 0 {
            let level = config.level.to_string().to_lowercase();
            config = config.with_filter(level);
        }
        config.with_env_overrides()
    }

    /// Default → config file → FANOUT_* env → flags.
    fn pool_config(&self) -> Result<PoolConfig> {
        let base = match &self.config {
            Some(path) => PoolConfig::from_file(path)?,
            None => PoolConfig::default(),
        };
        let mut config = base.with_env_overrides()?;

        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(policy) = self.policy {
            config.failure_policy = policy;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(capacity) = self.queue_capacity {
            config.queue_capacity = Some(capacity);
        }
        Ok(config)
    }

    fn processor(&self) -> Arc<dyn Processor> {
        let processor: Arc<dyn Processor> = match self.op {
            Op::Double => Arc::new(Doubler::new(Duration::from_millis(self.delay_ms))),
            Op::Divide => Arc::new(Divider::new(self.divisor)),
        };
        if self.reject_negative {
            Arc::new(NonNegative::new(processor))
        } else {
            processor
        }
    }

    fn items(&self) -> Vec<i64> {
        if self.items.is_empty() {
            (1..=i64::from(self.count)).collect()
        } else {
            self.items.clone()
        }
    }
}

fn print_report(report: &BatchReport, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report).context("serialize report")?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            for result in &report.results {
                writeln!(out, "Result: {}", result.value)?;
            }
            for failure in &report.failures {
                writeln!(
                    out,
                    "Failed: item {} (#{}) on {}: {}",
                    failure.item, failure.seq, failure.worker, failure.message
                )?;
            }
            let counts = report.counts();
            writeln!(
                out,
                "{} items, {} succeeded, {} failed, {} workers, {} ms",
                counts.submitted,
                counts.succeeded,
                counts.failed,
                report.worker_count,
                report.elapsed().num_milliseconds()
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

async fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = cli.pool_config()?;
    let pool = PoolBuilder::from_config(config)
        .shared_processor(cli.processor())
        .build()
        .context("invalid pool settings")?;

    let report = pool.run_batch(cli.items()).await?;
    print_report(&report, cli.format, out)
}

/// Map the outcome to an exit status; errors go to `err` with their cause chain.
fn exit_status(result: Result<()>, err: &mut impl Write) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "batch failed");
            let _ = writeln!(err, "Error: {error}");
            for cause in error.chain().skip(1) {
                let _ = writeln!(err, "  caused by: {cause}");
            }
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_config());

    let result = run(cli, &mut std::io::stdout()).await;
    exit_status(result, &mut std::io::stderr())
}
