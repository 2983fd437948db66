use std::path::PathBuf;

use roomwatch_core::error::ConfigError;
use roomwatch_core::status::{StatusPolicy, DEFAULT_FULL_THRESHOLD_PERCENT};
use roomwatch_pipeline::config::parse_var;
use roomwatch_pipeline::SamplingConfig;

/// Which detection capability live rooms use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorBackend {
    /// In-process random-count detector.
    Simulated,
    /// Remote detector at `url`.
    Http { url: String },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `10`).
    pub shutdown_timeout_secs: u64,
    /// Rooms without an update for this long are reported stale (default: `15`).
    pub stale_after_secs: u64,
    pub status_policy: StatusPolicy,
    pub detector: DetectorBackend,
    /// Per-room frame directories; placeholder frames when unset.
    pub frame_dir: Option<PathBuf>,
    /// Remote "persist occupancy" endpoint; persistence disabled when unset.
    pub persist_url: Option<String>,
    /// JSON rooms file; the built-in layout when unset.
    pub rooms_file: Option<PathBuf>,
    /// Start every room's sampling loop at boot (default: `true`).
    pub autostart_sampling: bool,
    pub sampling: SamplingConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `10`                    |
    /// | `STALE_AFTER_SECS`           | `15`                    |
    /// | `FULL_THRESHOLD_PERCENT`     | `80`                    |
    /// | `DETECTOR_BACKEND`           | `simulated`             |
    /// | `DETECTOR_URL`               | (required for `http`)   |
    /// | `FRAME_DIR`                  | unset                   |
    /// | `PERSIST_URL`                | unset                   |
    /// | `ROOMS_FILE`                 | unset                   |
    /// | `AUTOSTART_SAMPLING`         | `true`                  |
    ///
    /// Sampling cadences are read by [`SamplingConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_var(&lookup, "PORT", 3000)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;
        let shutdown_timeout_secs: u64 = parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS", 10)?;
        let stale_after_secs: u64 = parse_var(&lookup, "STALE_AFTER_SECS", 15)?;

        let threshold: u32 = parse_var(
            &lookup,
            "FULL_THRESHOLD_PERCENT",
            DEFAULT_FULL_THRESHOLD_PERCENT,
        )?;
        let status_policy = StatusPolicy::new(threshold)?;

        let detector = match non_empty("DETECTOR_BACKEND")
            .unwrap_or_else(|| "simulated".into())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "simulated" => DetectorBackend::Simulated,
            "http" => DetectorBackend::Http {
                url: non_empty("DETECTOR_URL").ok_or_else(|| ConfigError::InvalidEnv {
                    var: "DETECTOR_URL",
                    reason: "required when DETECTOR_BACKEND=http".to_string(),
                })?,
            },
            other => {
                return Err(ConfigError::InvalidEnv {
                    var: "DETECTOR_BACKEND",
                    reason: format!("unknown backend {other:?}, expected simulated or http"),
                })
            }
        };

        let autostart_sampling: bool = parse_var(&lookup, "AUTOSTART_SAMPLING", true)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            stale_after_secs,
            status_policy,
            detector,
            frame_dir: non_empty("FRAME_DIR").map(PathBuf::from),
            persist_url: non_empty("PERSIST_URL"),
            rooms_file: non_empty("ROOMS_FILE").map(PathBuf::from),
            autostart_sampling,
            sampling: SamplingConfig::from_lookup(&lookup)?,
        })
    }

    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.stale_after_secs).unwrap_or(i64::MAX))
    }
}
