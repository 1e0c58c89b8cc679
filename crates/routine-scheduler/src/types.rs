use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Serialized view of one live routine, as returned by `Scheduler::status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineStatus {
    /// Registry key of the routine.
    pub id: String,
    /// Output of `Job::serialize_config` on the current config.
    pub config: String,
    /// Output of `Job::serialize_output` on the latest output.
    pub output: String,
}

/// Tally of a batch operation (stop, suspend, resume, update-config).
///
/// Every requested key is processed; `error` holds the last per-key
/// failure, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub total: usize,
    pub error: Option<SchedulerError>,
}

impl BatchOutcome {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            succeeded: 0,
            total,
            error: None,
        }
    }

    /// True when every key succeeded and no error was recorded.
    pub fn is_complete(&self) -> bool {
        self.succeeded == self.total && self.error.is_none()
    }
}

/// Result of a bulk start.
///
/// Unlike [`BatchOutcome`], `error` holds the first per-iteration failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    /// Keys of the routines that were launched, in launch order.
    pub keys: Vec<String>,
    pub total: usize,
    pub error: Option<SchedulerError>,
}

impl StartOutcome {
    pub fn succeeded(&self) -> usize {
        self.keys.len()
    }

    pub fn is_complete(&self) -> bool {
        self.keys.len() == self.total && self.error.is_none()
    }
}

/// Why an execution loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Cancelled,
    Failed,
    Panicked,
    /// The task was dropped before finishing, e.g. on runtime shutdown.
    Aborted,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExitReason::Cancelled => "cancelled",
            ExitReason::Failed => "failed",
            ExitReason::Panicked => "panicked",
            ExitReason::Aborted => "aborted",
        };
        write!(f, "{s}")
    }
}
