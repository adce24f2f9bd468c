use std::env;
use std::time::Duration;

/// Runtime configuration, sourced from the environment.
///
/// A `.env` file is honored when present; every value has a default so the
/// server starts with no configuration at all.
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    pub host: String,
    pub port: u16,

    // WebSocket keep-alive
    pub heartbeat_interval: Duration,
    /// A connection with no pong inside this window is treated as gone.
    pub heartbeat_timeout: Duration,

    // Worker settings
    pub worker_count: usize,
    /// Pop timeout; used only as a liveness check so workers notice shutdown.
    pub worker_pop_timeout: Duration,
    /// Pause after a failed job before the loop resumes.
    pub worker_backoff: Duration,

    // Relay settings
    pub relay_capacity: usize,

    // CORS settings
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed_env("SERVER_PORT", 4000),

            heartbeat_interval: Duration::from_secs(parsed_env(
                "HEARTBEAT_INTERVAL_SECS",
                30,
            )),
            heartbeat_timeout: Duration::from_secs(parsed_env("HEARTBEAT_TIMEOUT_SECS", 75)),

            worker_count: parsed_env("WORKER_COUNT", 2),
            worker_pop_timeout: Duration::from_secs(parsed_env("WORKER_POP_TIMEOUT_SECS", 5)),
            worker_backoff: Duration::from_secs(parsed_env("WORKER_BACKOFF_SECS", 3)),

            relay_capacity: parsed_env("RELAY_CHANNEL_CAPACITY", 1024),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(75),
            worker_count: 2,
            worker_pop_timeout: Duration::from_secs(5),
            worker_backoff: Duration::from_secs(3),
            relay_capacity: 1024,
            cors_allowed_origins: Vec::new(),
        }
    }
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
