//! Sampling cadence and timeout configuration.

use std::str::FromStr;
use std::time::Duration;

use roomwatch_core::error::ConfigError;

/// Timing configuration shared by every sampling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    /// Cadence of live (frame) sampling.
    pub live_interval: Duration,
    /// Cadence of ambient (simulated tick) sampling.
    pub ambient_interval: Duration,
    /// Upper bound on one acquire + detect step.
    pub detect_timeout: Duration,
    /// How long `stop` waits for a loop to exit before aborting it.
    pub stop_timeout: Duration,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            live_interval: Duration::from_millis(1000),
            ambient_interval: Duration::from_millis(5000),
            detect_timeout: Duration::from_millis(3000),
            stop_timeout: Duration::from_secs(10),
        }
    }
}

impl SamplingConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `LIVE_SAMPLE_INTERVAL_MS`    | `1000`  |
    /// | `AMBIENT_SAMPLE_INTERVAL_MS` | `5000`  |
    /// | `DETECT_TIMEOUT_MS`          | `3000`  |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `10`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let live_ms: u64 = positive(&lookup, "LIVE_SAMPLE_INTERVAL_MS", 1000)?;
        let ambient_ms: u64 = positive(&lookup, "AMBIENT_SAMPLE_INTERVAL_MS", 5000)?;
        let detect_ms: u64 = positive(&lookup, "DETECT_TIMEOUT_MS", 3000)?;
        let stop_secs: u64 = parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS", 10)?;

        Ok(Self {
            live_interval: Duration::from_millis(live_ms),
            ambient_interval: Duration::from_millis(ambient_ms),
            detect_timeout: Duration::from_millis(detect_ms),
            stop_timeout: Duration::from_secs(stop_secs),
        })
    }
}

/// Parse `var` from `lookup`, falling back to `default` when unset.
pub fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
            var,
            reason: format!("{raw:?}: {e}"),
        }),
    }
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let value = parse_var(lookup, var, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidEnv {
            var,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
