use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rstest::rstest;

use fanout_core::impls::{Divider, Doubler, NonNegative};
use fanout_core::{
    BuildError, FailurePolicy, FanoutError, FixedWorkerPool, PoolBuilder, PoolConfig, Processor, RetryPolicy,
    WorkItem,
};

/// Counts how many times each item was processed.
struct CountingDoubler {
    seen: std::sync::Mutex<HashMap<i64, usize>>,
}

#[async_trait]
impl Processor for CountingDoubler {
    async fn process(&self, item: WorkItem) -> Result<i64, FanoutError> {
        *self.seen.lock().unwrap().entry(item.value()).or_default() += 1;
        tokio::task::yield_now().await;
        Ok(item.value() * 2)
    }
}

/// Fails the first `failures` calls with a transient error.
struct Flaky {
    failures: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl Processor for Flaky {
    async fn process(&self, item: WorkItem) -> Result<i64, FanoutError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(FanoutError::transient("backend unavailable"));
        }
        Ok(item.value())
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(7)]
#[case(32)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_item_processed_exactly_once(#[case] workers: usize) {
    let processor = Arc::new(CountingDoubler {
        seen: Default::default(),
    });
    let pool = PoolBuilder::new()
        .workers(workers)
        .shared_processor(processor.clone())
        .build()
        .unwrap();

    let items: Vec<i64> = (0..200).collect();
    let results = pool.run(items.clone()).await.unwrap();
    assert_eq!(results.len(), items.len());

    let seen = processor.seen.lock().unwrap();
    assert_eq!(seen.len(), items.len());
    assert!(seen.values().all(|&n| n == 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn random_batches_match_doubled_multiset() {
    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        let len = rng.gen_range(0..64);
        let workers = rng.gen_range(1..10);
        let items: Vec<i64> = (0..len)
            .map(|_| rng.gen_range(-1_000_000..1_000_000))
            .collect();

        let pool = FixedWorkerPool::new(workers, Doubler::immediate()).unwrap();
        let results = pool.run(items.clone()).await.unwrap();

        let mut got: Vec<i64> = results.iter().map(|r| r.value).collect();
        let mut want: Vec<i64> = items.iter().map(|n| n * 2).collect();
        got.sort_unstable();
        want.sort_unstable();
        assert_eq!(got, want, "workers={workers} items={items:?}");
    }
}

#[tokio::test]
async fn more_workers_than_items_terminates() {
    let pool = FixedWorkerPool::new(50, Doubler::immediate()).unwrap();
    let report = pool.run_batch([10, 20]).await.unwrap();
    assert_eq!(report.results.len(), 2);
    let idle = report.workers.iter().filter(|w| w.processed == 0).count();
    assert!(idle >= 48);
}

#[tokio::test(start_paused = true)]
async fn transient_errors_retry_until_success() {
    let pool = PoolBuilder::new()
        .workers(1)
        .retry(
            RetryPolicy::none()
                .with_max_attempts(3)
                .with_base_delay(Duration::from_millis(50)),
        )
        .processor(Flaky {
            failures: 2,
            calls: AtomicUsize::new(0),
        })
        .build()
        .unwrap();

    let results = pool.run([9]).await.unwrap();
    assert_eq!(results[0].value, 9);
}

#[tokio::test(start_paused = true)]
async fn transient_errors_give_up_after_max_attempts() {
    let pool = PoolBuilder::new()
        .workers(1)
        .failure_policy(FailurePolicy::SkipAndReport)
        .retry(RetryPolicy::none().with_max_attempts(2))
        .processor(Flaky {
            failures: 10,
            calls: AtomicUsize::new(0),
        })
        .build()
        .unwrap();

    let report = pool.run_batch([1]).await.unwrap();
    assert!(report.results.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].attempts, 2);
    assert_eq!(report.failures[0].code, 503);
}

#[test]
fn config_with_negative_multiplier_is_rejected_before_running() {
    let config: PoolConfig =
        serde_json::from_str(r#"{"workers":1,"retry":{"max_attempts":3,"multiplier":-2.0}}"#)
            .unwrap();
    let result = PoolBuilder::from_config(config)
        .processor(Flaky {
            failures: 2,
            calls: AtomicUsize::new(0),
        })
        .build();
    assert!(matches!(result, Err(BuildError::InvalidMultiplier(m)) if m == -2.0));
}

#[tokio::test]
async fn huge_queue_capacity_from_env_still_runs() {
    let config = PoolConfig::default()
        .with_overrides_from(|key| match key {
            "FANOUT_QUEUE_CAPACITY" => Some(usize::MAX.to_string()),
            _ => None,
        })
        .unwrap();
    let pool = PoolBuilder::from_config(config)
        .processor(Doubler::immediate())
        .build()
        .unwrap();

    let results = pool.run([1]).await.unwrap();
    assert_eq!(results[0].value, 2);
}

#[tokio::test]
async fn division_by_zero_fails_the_batch() {
    let pool = FixedWorkerPool::new(3, Divider::new(0)).unwrap();
    let err = pool.run([1, 2, 3]).await.unwrap_err();
    assert!(matches!(
        &err,
        FanoutError::ItemFailed { source, .. } if matches!(**source, FanoutError::DivisionByZero)
    ));
    assert_eq!(err.code(), 422);
}

#[tokio::test]
async fn pool_from_env_config() {
    let config = PoolConfig::default()
        .with_overrides_from(|key| match key {
            "FANOUT_WORKERS" => Some("2".to_string()),
            "FANOUT_FAILURE_POLICY" => Some("skip".to_string()),
            _ => None,
        })
        .unwrap();
    let pool = PoolBuilder::from_config(config)
        .processor(NonNegative::new(Doubler::immediate()))
        .build()
        .unwrap();

    let report = pool.run_batch([3, -3]).await.unwrap();
    assert_eq!(report.values(), vec![6]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.workers.len(), 2);
}

#[tokio::test]
async fn report_serializes_to_json() {
    let pool = FixedWorkerPool::new(2, Doubler::immediate()).unwrap();
    let report = pool.run_batch([1, 2]).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["worker_count"], 2);
    assert_eq!(json["submitted"], 2);
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
    assert!(json["batch_id"].is_string());
    assert!(json.get("failures").is_none());
    assert_eq!(json["workers"][0]["final_state"], "Done");
}
