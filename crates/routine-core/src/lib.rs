//! `routine-core`: configuration shared by the routine manager crates.
//!
//! Configuration is layered with figment: built-in defaults, then a TOML
//! file, then `ROUTINE_*` environment variables.

pub mod config;
pub mod error;

pub use config::{CounterJobConfig, RoutineConfig, ServerConfig};
pub use error::{CoreError, Result};
