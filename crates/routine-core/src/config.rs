use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_TICK_MS: u64 = 100;
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Environment variable holding an explicit config file path.
pub const CONFIG_PATH_ENV: &str = "ROUTINE_CONFIG";

/// Top-level config (routine.toml + ROUTINE_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutineConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub counter: CounterJobConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// When false the server starts in test mode and the web UI hides its
    /// controls. Can be flipped at runtime through `/switch`.
    #[serde(default = "bool_true")]
    pub interactive: bool,
    /// How long shutdown waits for live routines to finish their current
    /// iteration before giving up on them.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            interactive: true,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Settings for the built-in counter job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterJobConfig {
    /// Simulated work delay per iteration, in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for CounterJobConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}
fn default_shutdown_timeout_secs() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

impl RoutineConfig {
    /// Load config from a TOML file with ROUTINE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. `ROUTINE_CONFIG` env var
    ///   3. ~/.routine/routine.toml
    ///
    /// A missing file is not an error; defaults fill every absent key.
    /// Nested keys use a double underscore: `ROUTINE_SERVER__PORT=9000`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(default_config_path);
        debug!(%path, "loading configuration");

        Figment::from(Serialized::defaults(RoutineConfig::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed("ROUTINE_").split("__"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Reject values that parse fine but cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(CoreError::Invalid {
                field: "server.port",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.counter.tick_ms == 0 {
            return Err(CoreError::Invalid {
                field: "counter.tick_ms",
                reason: "must be at least 1ms".to_string(),
            });
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.routine/routine.toml", home)
}
