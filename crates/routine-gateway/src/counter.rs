//! The counter job served by the gateway.
//!
//! Every iteration adds `value` to the running count and stamps the time,
//! then simulates work by sleeping for the configured tick. Suspending a
//! routine freezes its count without stopping its loop.
//!
//! Config wire format: `{"value": 3, "suspend": false}` (`suspend` optional).
//! Output wire format: `"<count>\n<RFC3339 timestamp>"`, empty before the
//! first iteration.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use routine_scheduler::{Control, Job, Result, SchedulerError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Amount added to the count on each iteration.
    pub value: i64,
    /// While true the count is left unchanged.
    #[serde(default)]
    pub suspend: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterOutput {
    pub count: i64,
    /// `None` until the first iteration completes.
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct CounterJob {
    tick: Duration,
}

impl CounterJob {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }
}

#[async_trait]
impl Job for CounterJob {
    type Config = CounterConfig;
    type Output = CounterOutput;

    async fn run(&self, ctrl: &Control<Self>) -> Result<CounterOutput> {
        let config = ctrl.load_config();
        let prev = ctrl.load_output();

        let next = if config.suspend {
            (*prev).clone()
        } else {
            let count = prev.count.checked_add(config.value).ok_or_else(|| {
                SchedulerError::JobFailure(format!(
                    "count overflowed adding {} to {}",
                    config.value, prev.count
                ))
            })?;
            CounterOutput {
                count,
                updated_at: Some(Utc::now()),
            }
        };

        // Simulated work; a stop request cuts the wait short.
        tokio::select! {
            _ = tokio::time::sleep(self.tick) => {}
            _ = ctrl.cancelled() => {}
        }
        Ok(next)
    }

    fn gen_identity(&self, config: &CounterConfig) -> String {
        format!("CR-{}-{}", Uuid::now_v7().simple(), config.value)
    }

    fn serialize_config(&self, config: &CounterConfig) -> String {
        serde_json::to_string(config).unwrap_or_default()
    }

    fn deserialize_config(&self, raw: &str) -> Result<CounterConfig> {
        serde_json::from_str(raw).map_err(|e| SchedulerError::InvalidConfig(e.to_string()))
    }

    fn serialize_output(&self, output: &CounterOutput) -> String {
        match output.updated_at {
            Some(at) => format!(
                "{}\n{}",
                output.count,
                at.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            None => String::new(),
        }
    }

    fn supports_suspend(&self) -> bool {
        true
    }

    fn suspend(&self, ctrl: &Control<Self>) {
        ctrl.modify_config(|c| CounterConfig {
            suspend: true,
            ..c.clone()
        });
    }

    fn resume(&self, ctrl: &Control<Self>) {
        ctrl.modify_config(|c| CounterConfig {
            suspend: false,
            ..c.clone()
        });
    }
}
