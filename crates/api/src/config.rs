use std::path::PathBuf;

/// Invalid server configuration. Reported once at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for in-flight renders to finish on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Directory for frame data snapshots. `None` keeps them in memory.
    pub frame_data_dir: Option<PathBuf>,
    /// External renderer command line. `None` fails every job.
    pub renderer_command: Option<String>,
    /// Base URL the renderer uses to reach this server.
    pub public_base_url: String,
    /// How long a finished job stays readable (default: `3600`).
    pub job_retention_secs: u64,
    /// Interval between retention sweeps (default: `60`).
    pub retention_sweep_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `8000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `FRAME_DATA_DIR`        | unset (in memory)       |
    /// | `RENDERER_COMMAND`      | unset                   |
    /// | `PUBLIC_BASE_URL`       | `http://localhost:8000` |
    /// | `JOB_RETENTION_SECS`    | `3600`                  |
    /// | `RETENTION_SWEEP_SECS`  | `60`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = non_empty("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or("PORT", non_empty("PORT"), 8000u16, "a valid port number")?;

        let cors_origins: Vec<String> = non_empty("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_or(
            "REQUEST_TIMEOUT_SECS",
            non_empty("REQUEST_TIMEOUT_SECS"),
            30u64,
            "a whole number of seconds",
        )?;
        let shutdown_timeout_secs = parse_or(
            "SHUTDOWN_TIMEOUT_SECS",
            non_empty("SHUTDOWN_TIMEOUT_SECS"),
            30u64,
            "a whole number of seconds",
        )?;

        let job_retention_secs = parse_or(
            "JOB_RETENTION_SECS",
            non_empty("JOB_RETENTION_SECS"),
            3600u64,
            "a whole number of seconds",
        )?;
        let retention_sweep_secs = parse_or(
            "RETENTION_SWEEP_SECS",
            non_empty("RETENTION_SWEEP_SECS"),
            60u64,
            "a whole number of seconds",
        )?;
        if retention_sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "RETENTION_SWEEP_SECS",
                expected: "at least 1 second",
                value: "0".into(),
            });
        }

        let public_base_url = non_empty("PUBLIC_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8000".into())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            frame_data_dir: non_empty("FRAME_DATA_DIR").map(PathBuf::from),
            renderer_command: non_empty("RENDERER_COMMAND"),
            public_base_url,
            job_retention_secs,
            retention_sweep_secs,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid {
                var,
                expected,
                value,
            }),
    }
}
