// End-to-end routine lifecycle through the public Scheduler API.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use routine_scheduler::{Control, Job, Result, Scheduler, SchedulerError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AccumConfig {
    value: i64,
    #[serde(default)]
    suspend: bool,
    /// Fail once the running total reaches this value.
    #[serde(default)]
    fail_at: Option<i64>,
    #[serde(default)]
    panic: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AccumOutput {
    total: i64,
    iterations: u64,
}

struct Accumulator;

#[async_trait]
impl Job for Accumulator {
    type Config = AccumConfig;
    type Output = AccumOutput;

    async fn run(&self, ctrl: &Control<Self>) -> Result<AccumOutput> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let config = ctrl.load_config();
        let prev = ctrl.load_output();
        if config.panic {
            panic!("accumulator asked to panic");
        }
        if config.suspend {
            return Ok((*prev).clone());
        }
        let total = prev.total + config.value;
        if config.fail_at.is_some_and(|limit| total >= limit) {
            return Err(SchedulerError::JobFailure(format!("total {total} hit limit")));
        }
        Ok(AccumOutput {
            total,
            iterations: prev.iterations + 1,
        })
    }

    fn gen_identity(&self, config: &AccumConfig) -> String {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        format!("ACC-{}-{}", SEQ.fetch_add(1, Ordering::Relaxed), config.value)
    }

    fn serialize_config(&self, config: &AccumConfig) -> String {
        serde_json::to_string(config).unwrap_or_default()
    }

    fn deserialize_config(&self, raw: &str) -> Result<AccumConfig> {
        serde_json::from_str(raw).map_err(|e| SchedulerError::InvalidConfig(e.to_string()))
    }

    fn serialize_output(&self, output: &AccumOutput) -> String {
        format!("{}/{}", output.total, output.iterations)
    }

    fn supports_suspend(&self) -> bool {
        true
    }

    fn suspend(&self, ctrl: &Control<Self>) {
        ctrl.modify_config(|c| AccumConfig {
            suspend: true,
            ..c.clone()
        });
    }

    fn resume(&self, ctrl: &Control<Self>) {
        ctrl.modify_config(|c| AccumConfig {
            suspend: false,
            ..c.clone()
        });
    }
}

/// Poll `cond` every 10ms for up to two seconds.
async fn eventually<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

fn parse_output(raw: &str) -> (i64, u64) {
    let (total, iterations) = raw.split_once('/').expect("output format");
    (total.parse().unwrap(), iterations.parse().unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn start_three_then_stop_all() {
    let scheduler = Scheduler::new(Accumulator);

    let outcome = scheduler.start_many(3, r#"{"value":1}"#).unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.keys.len(), 3);

    let status = scheduler.status(None);
    assert_eq!(status.len(), 3, "keys are registered before start returns");
    for routine in &status {
        let config: AccumConfig = serde_json::from_str(&routine.config).unwrap();
        assert_eq!(config.value, 1);
    }

    let stopped = scheduler.stop(&outcome.keys);
    assert!(stopped.is_complete());
    assert_eq!(stopped.succeeded, 3);

    assert!(eventually(|| scheduler.status(None).is_empty()).await);

    let again = scheduler.stop(&outcome.keys[..1]);
    assert_eq!(again.succeeded, 0);
    assert_eq!(again.total, 1);
    assert_eq!(
        again.error,
        Some(SchedulerError::NotFound {
            key: outcome.keys[0].clone()
        })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_does_not_remove_eagerly_and_done_follows_removal() {
    let scheduler = Scheduler::new(Accumulator);
    let key = scheduler.start(r#"{"value":1}"#).unwrap();
    let ctrl = scheduler.control(&key).unwrap();

    scheduler.stop(&[key.clone()]);
    assert!(ctrl.is_cancel_requested());

    tokio::time::timeout(Duration::from_secs(2), ctrl.await_done())
        .await
        .expect("routine did not finish");
    assert!(!scheduler.registry().contains(&key));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn update_config_changes_the_multiplier() {
    let scheduler = Scheduler::new(Accumulator);
    let key = scheduler.start(r#"{"value":5}"#).unwrap();

    assert!(eventually(|| {
        let status = scheduler.status(Some(key.as_str()));
        parse_output(&status[0].output).1 >= 2
    })
    .await);

    let updated = scheduler
        .update_config(&[key.clone()], r#"{"value":9}"#)
        .unwrap();
    assert!(updated.is_complete());

    let status = scheduler.status(Some(key.as_str()));
    let config: AccumConfig = serde_json::from_str(&status[0].config).unwrap();
    assert_eq!(config.value, 9);

    let (before, _) = parse_output(&status[0].output);
    assert!(eventually(|| {
        let (total, _) = parse_output(&scheduler.status(Some(key.as_str()))[0].output);
        total >= before + 18
    })
    .await);

    scheduler.shutdown(Duration::from_secs(2)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn suspend_freezes_output_and_resume_continues() {
    let scheduler = Scheduler::new(Accumulator);
    let key = scheduler.start(r#"{"value":2}"#).unwrap();
    let ctrl = scheduler.control(&key).unwrap();

    assert!(eventually(|| ctrl.load_output().iterations >= 1).await);

    let suspended = scheduler.suspend(&[key.clone()]);
    assert!(suspended.is_complete());
    assert!(ctrl.load_config().suspend);
    assert_eq!(ctrl.load_config().value, 2, "suspend keeps the multiplier");

    // Let any in-flight iteration land, then the output must stay put.
    tokio::time::sleep(Duration::from_millis(30)).await;
    let frozen = ctrl.load_output().total;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ctrl.load_output().total, frozen);
    assert!(scheduler.registry().contains(&key), "suspended routines stay live");

    let resumed = scheduler.resume(&[key.clone()]);
    assert!(resumed.is_complete());
    assert!(eventually(|| ctrl.load_output().total > frozen).await);

    scheduler.shutdown(Duration::from_secs(2)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn job_failure_removes_the_routine() {
    let scheduler = Scheduler::new(Accumulator);
    let key = scheduler
        .start(r#"{"value":1,"fail_at":3}"#)
        .unwrap();
    let ctrl = scheduler.control(&key).unwrap();

    tokio::time::timeout(Duration::from_secs(2), ctrl.await_done())
        .await
        .expect("failing routine did not exit");

    assert!(!ctrl.is_cancel_requested(), "failure is not a cancellation");
    assert!(!scheduler.registry().contains(&key));
    assert_eq!(ctrl.load_output().total, 2, "failed iteration stores nothing");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_job_still_tears_down() {
    let scheduler = Scheduler::new(Accumulator);
    let key = scheduler
        .start(r#"{"value":1,"panic":true}"#)
        .unwrap();
    let ctrl = scheduler.control(&key).unwrap();

    tokio::time::timeout(Duration::from_secs(2), ctrl.await_done())
        .await
        .expect("panicked routine never signalled done");
    assert!(scheduler.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_are_never_torn() {
    let scheduler = Scheduler::new(Accumulator);
    let key = scheduler.start(r#"{"value":1}"#).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|i| {
            let scheduler = scheduler.clone();
            let key = key.clone();
            tokio::spawn(async move {
                for n in 0..50 {
                    let value = i * 1000 + n;
                    let raw = format!(r#"{{"value":{value}}}"#);
                    scheduler.update_config(&[key.clone()], &raw).unwrap();
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for _ in 0..100 {
        for routine in scheduler.status(Some(key.as_str())) {
            let config: AccumConfig = serde_json::from_str(&routine.config).unwrap();
            assert!(!config.suspend);
        }
        tokio::task::yield_now().await;
    }
    for w in writers {
        w.await.unwrap();
    }

    let last = scheduler.control(&key).unwrap().load_config();
    assert_eq!(last.value % 1000, 49, "last write of some writer wins");

    scheduler.shutdown(Duration::from_secs(2)).await;
}

#[tokio::test]
async fn config_round_trips_through_the_job_codecs() {
    let job = Accumulator;
    let config = AccumConfig {
        value: 42,
        suspend: true,
        fail_at: Some(7),
        panic: false,
    };
    let once = job.serialize_config(&config);
    let back = job.deserialize_config(&once).unwrap();
    assert_eq!(back, config);
    assert_eq!(job.serialize_config(&back), once);
}
