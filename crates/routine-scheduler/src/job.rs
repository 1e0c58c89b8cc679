use async_trait::async_trait;

use crate::{control::ControlBlock, error::Result};

/// Control block type for routines of job type `J`.
pub type Control<J> = ControlBlock<<J as Job>::Config, <J as Job>::Output>;

/// Stateless description of the work a routine repeats.
///
/// One implementation is chosen per deployment and shared by every routine
/// instance; all per-instance state lives in the [`ControlBlock`].
///
/// Suspend/resume are an optional capability: the default implementations
/// do nothing, and [`Job::supports_suspend`] reports whether a job type
/// overrides them.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    type Config: Send + Sync + 'static;
    type Output: Default + Send + Sync + 'static;

    /// Perform one iteration using the live config and return the new output.
    ///
    /// An `Err` is fatal to the routine: its loop exits and it is not
    /// restarted.
    async fn run(&self, ctrl: &Control<Self>) -> Result<Self::Output>;

    /// Produce the registry key for a new routine started with `config`.
    fn gen_identity(&self, config: &Self::Config) -> String;

    fn serialize_config(&self, config: &Self::Config) -> String;

    /// Parse a config string. Malformed input must yield
    /// [`SchedulerError::InvalidConfig`](crate::SchedulerError::InvalidConfig).
    fn deserialize_config(&self, raw: &str) -> Result<Self::Config>;

    fn serialize_output(&self, output: &Self::Output) -> String;

    fn supports_suspend(&self) -> bool {
        false
    }

    /// Mark the routine's config as paused without stopping its loop.
    fn suspend(&self, _ctrl: &Control<Self>) {}

    /// Undo [`Job::suspend`].
    fn resume(&self, _ctrl: &Control<Self>) {}
}
