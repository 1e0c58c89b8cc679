//! `routine-scheduler`: in-process lifecycle manager for repeated jobs.
//!
//! # Overview
//!
//! A [`Job`] describes one unit of repeated work plus the codecs for its
//! config and output. The [`Scheduler`] starts any number of *routines* of
//! that job type, each running on its own Tokio task and identified by a
//! unique key in the [`Registry`]. Every routine owns a [`ControlBlock`]
//! holding its live config, latest output and cancel/done signals.
//!
//! # Routine lifecycle
//!
//! ```text
//! start ──▶ Running ◀──▶ Suspended      (suspend/resume, if supported)
//!              │             │
//!              └──── stop ───┴──▶ Stopping ──▶ (removed from registry)
//!                                    ▲
//!              job error / panic ────┘
//! ```
//!
//! Cancellation is cooperative: a routine finishes its current iteration,
//! then removes itself from the registry and signals `done`.

pub mod control;
pub mod error;
pub mod job;
pub mod registry;
pub mod scheduler;
pub mod types;

pub use control::ControlBlock;
pub use error::{Result, SchedulerError};
pub use job::{Control, Job};
pub use registry::Registry;
pub use scheduler::Scheduler;
pub use types::{BatchOutcome, ExitReason, RoutineStatus, StartOutcome};
