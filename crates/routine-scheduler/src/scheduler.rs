use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use tokio::{runtime::Handle, time::Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    control::ControlBlock,
    error::{Result, SchedulerError},
    job::{Control, Job},
    registry::Registry,
    types::{BatchOutcome, ExitReason, RoutineStatus, StartOutcome},
};

/// Upper bound on the key buffer reserved by `start_many`; larger batches
/// grow it as routines actually launch.
const MAX_PREALLOCATED_KEYS: usize = 1024;

/// Lifecycle façade over the registry: start, stop, suspend, resume,
/// update-config and status for routines of a single job type.
///
/// Control operations never wait on a routine's job logic; they only touch
/// the registry and control blocks. Cloning yields another handle to the
/// same registry.
pub struct Scheduler<J: Job> {
    job: Arc<J>,
    registry: Registry<J::Config, J::Output>,
}

impl<J: Job> Clone for Scheduler<J> {
    fn clone(&self) -> Self {
        Self {
            job: Arc::clone(&self.job),
            registry: self.registry.clone(),
        }
    }
}

impl<J: Job> Scheduler<J> {
    /// Create a scheduler with an empty registry.
    pub fn new(job: J) -> Self {
        Self {
            job: Arc::new(job),
            registry: Registry::new(),
        }
    }

    pub fn job(&self) -> &J {
        &self.job
    }

    pub fn registry(&self) -> &Registry<J::Config, J::Output> {
        &self.registry
    }

    /// Control block of a live routine, e.g. to `await_done` after a stop.
    pub fn control(&self, key: &str) -> Option<Arc<Control<J>>> {
        self.registry.lookup(key)
    }

    /// Number of live routines.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // --- start ---------------------------------------------------------------

    /// Parse `raw` and start one routine with it. Returns the new key.
    pub fn start(&self, raw: &str) -> Result<String> {
        let config = self.parse_config(raw)?;
        self.start_with_config(Arc::new(config))
    }

    /// Start `count` routines sharing one parsed config.
    ///
    /// The config is validated once up front; a bad config or a zero count
    /// fails the whole call before any routine exists. After that, a failed
    /// launch is recorded (first error wins) and the remaining launches still
    /// run.
    #[instrument(skip(self, raw))]
    pub fn start_many(&self, count: usize, raw: &str) -> Result<StartOutcome> {
        if count == 0 {
            return Err(SchedulerError::InvalidInput(
                "invalid count: must be greater than 0".to_string(),
            ));
        }
        let config = Arc::new(self.parse_config(raw)?);

        let mut outcome = StartOutcome {
            keys: Vec::with_capacity(count.min(MAX_PREALLOCATED_KEYS)),
            total: count,
            error: None,
        };
        for _ in 0..count {
            match self.start_with_config(Arc::clone(&config)) {
                Ok(key) => outcome.keys.push(key),
                Err(e) => {
                    warn!(error = %e, "routine failed to start");
                    outcome.error.get_or_insert(e);
                }
            }
        }

        info!(
            started = outcome.succeeded(),
            requested = count,
            "bulk start finished"
        );
        Ok(outcome)
    }

    /// Register a routine for an already-parsed config and launch its loop.
    ///
    /// Returns as soon as the loop is spawned; the first iteration runs
    /// asynchronously. Must be called from within a Tokio runtime.
    pub fn start_with_config(&self, config: Arc<J::Config>) -> Result<String> {
        let runtime = Handle::try_current()
            .map_err(|e| SchedulerError::Launch(format!("no async runtime: {e}")))?;

        let key = panic::catch_unwind(AssertUnwindSafe(|| self.job.gen_identity(&config)))
            .map_err(|payload| {
                SchedulerError::Launch(format!(
                    "identity generation panicked: {}",
                    panic_message(payload.as_ref())
                ))
            })?;

        let ctrl = Arc::new(ControlBlock::new(config, J::Output::default()));
        self.registry.insert(key.clone(), Arc::clone(&ctrl))?;

        runtime.spawn(run_loop(
            Arc::clone(&self.job),
            self.registry.clone(),
            key.clone(),
            ctrl,
        ));

        info!(routine = %key, "routine started");
        Ok(key)
    }

    // --- batch control -------------------------------------------------------

    /// Request cancellation of every listed routine.
    ///
    /// Does not wait: each routine finishes its current iteration and then
    /// removes itself from the registry.
    pub fn stop(&self, keys: &[String]) -> BatchOutcome {
        self.apply("stop", keys, |key, ctrl| {
            ctrl.request_cancel();
            info!(routine = %key, "cancel requested");
            Ok(())
        })
    }

    /// Pause the listed routines via the job type's suspend hook.
    /// A no-op per key when the job type has no suspend capability.
    pub fn suspend(&self, keys: &[String]) -> BatchOutcome {
        if !self.job.supports_suspend() {
            debug!("job type has no suspend capability; suspend is a no-op");
        }
        self.apply("suspend", keys, |key, ctrl| {
            self.job.suspend(ctrl);
            debug!(routine = %key, "routine suspended");
            Ok(())
        })
    }

    /// Continue the listed routines via the job type's resume hook.
    pub fn resume(&self, keys: &[String]) -> BatchOutcome {
        if !self.job.supports_suspend() {
            debug!("job type has no suspend capability; resume is a no-op");
        }
        self.apply("resume", keys, |key, ctrl| {
            self.job.resume(ctrl);
            debug!(routine = %key, "routine resumed");
            Ok(())
        })
    }

    /// Replace the config of every listed routine with one parsed from `raw`.
    ///
    /// A malformed config fails the whole call before any routine is touched.
    #[instrument(skip_all, fields(keys = keys.len()))]
    pub fn update_config(&self, keys: &[String], raw: &str) -> Result<BatchOutcome> {
        let config = Arc::new(self.parse_config(raw)?);
        Ok(self.apply("update-config", keys, |key, ctrl| {
            ctrl.store_config(Arc::clone(&config));
            debug!(routine = %key, "config replaced");
            Ok(())
        }))
    }

    // --- status --------------------------------------------------------------

    /// Serialized config and output of every live routine whose key contains
    /// `filter` (case-insensitive, whitespace included). An empty filter
    /// matches everything. The order of the result is unspecified.
    pub fn status(&self, filter: Option<&str>) -> Vec<RoutineStatus> {
        let needle = filter.filter(|f| !f.is_empty()).map(str::to_lowercase);

        let mut routines = Vec::new();
        self.registry.for_each(|key, ctrl| {
            if let Some(ref needle) = needle {
                if !key.to_lowercase().contains(needle) {
                    return;
                }
            }
            routines.push(RoutineStatus {
                id: key.to_string(),
                config: self.job.serialize_config(&ctrl.load_config()),
                output: self.job.serialize_output(&ctrl.load_output()),
            });
        });
        routines
    }

    // --- shutdown ------------------------------------------------------------

    /// Cancel every live routine and wait up to `timeout` for all of them to
    /// exit. Returns how many were still running when the deadline passed.
    pub async fn shutdown(&self, timeout: Duration) -> usize {
        let routines = self.registry.snapshot();
        if routines.is_empty() {
            return 0;
        }
        info!(count = routines.len(), "stopping all routines");

        for (_, ctrl) in &routines {
            ctrl.request_cancel();
        }

        let deadline = Instant::now() + timeout;
        let mut lingering = 0;
        for (key, ctrl) in &routines {
            if tokio::time::timeout_at(deadline, ctrl.await_done())
                .await
                .is_err()
            {
                warn!(routine = %key, "routine did not stop before shutdown deadline");
                lingering += 1;
            }
        }
        lingering
    }

    // --- private helpers -----------------------------------------------------

    fn parse_config(&self, raw: &str) -> Result<J::Config> {
        if raw.trim().is_empty() {
            return Err(SchedulerError::InvalidConfig(
                "config is required but was empty".to_string(),
            ));
        }
        self.job.deserialize_config(raw)
    }

    /// Run `f` against every listed key, counting successes. Missing keys and
    /// failures do not abort the batch; the last error is kept.
    fn apply<F>(&self, op: &'static str, keys: &[String], mut f: F) -> BatchOutcome
    where
        F: FnMut(&str, &Control<J>) -> Result<()>,
    {
        let mut outcome = BatchOutcome::new(keys.len());
        for key in keys {
            let Some(ctrl) = self.registry.lookup(key) else {
                warn!(routine = %key, op, "routine not found");
                outcome.error = Some(SchedulerError::NotFound { key: key.clone() });
                continue;
            };
            match f(key, &ctrl) {
                Ok(()) => outcome.succeeded += 1,
                Err(e) => {
                    warn!(routine = %key, op, error = %e, "batch operation failed");
                    outcome.error = Some(e);
                }
            }
        }
        outcome
    }
}

/// Execution loop of one routine: run the job until cancelled or failed.
async fn run_loop<J: Job>(
    job: Arc<J>,
    registry: Registry<J::Config, J::Output>,
    key: String,
    ctrl: Arc<Control<J>>,
) {
    let mut teardown = Teardown {
        key,
        registry,
        ctrl: Arc::clone(&ctrl),
        reason: None,
    };

    while !ctrl.is_cancel_requested() {
        match job.run(&ctrl).await {
            Ok(output) => ctrl.store_output(output),
            Err(e) => {
                error!(routine = %teardown.key, error = %e, "job failed; routine will not be restarted");
                teardown.reason = Some(ExitReason::Failed);
                return;
            }
        }
        // Jobs without await points must not starve the worker thread.
        tokio::task::yield_now().await;
    }
    teardown.reason = Some(ExitReason::Cancelled);
}

/// Deregisters the routine and signals `done` on every exit path of the
/// loop, including a panicking job and a dropped task.
struct Teardown<C, O> {
    key: String,
    registry: Registry<C, O>,
    ctrl: Arc<ControlBlock<C, O>>,
    reason: Option<ExitReason>,
}

impl<C, O> Drop for Teardown<C, O> {
    fn drop(&mut self) {
        let reason = self.reason.unwrap_or(if std::thread::panicking() {
            ExitReason::Panicked
        } else {
            ExitReason::Aborted
        });

        self.registry.release(&self.key, &self.ctrl);
        self.ctrl.mark_done();

        match reason {
            ExitReason::Cancelled => info!(routine = %self.key, %reason, "routine stopped"),
            ExitReason::Failed | ExitReason::Aborted => {
                warn!(routine = %self.key, %reason, "routine exited")
            }
            ExitReason::Panicked => error!(routine = %self.key, %reason, "job panicked; routine removed"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
