//! # OrderFlow Telemetry
//!
//! Structured logging setup shared by all services in the workspace.
//!
//! Logs go to stdout, either human-readable or as JSON lines for a log
//! shipping agent to pick up.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ORDERFLOW_LOG` | `info` | Log level filter (tracing `EnvFilter` syntax) |
//! | `ORDERFLOW_LOG_JSON` | `false` | Emit JSON lines instead of pretty text |

use thiserror::Error;
use tracing_subscriber::EnvFilter;

const LOG_FILTER_VAR: &str = "ORDERFLOW_LOG";
const LOG_JSON_VAR: &str = "ORDERFLOW_LOG_JSON";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install the global subscriber: {0}")]
    Subscriber(String),
}

/// Logging configuration, resolved from the environment.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive string.
    pub log_filter: String,
    /// Emit JSON lines instead of pretty text.
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_filter: std::env::var(LOG_FILTER_VAR).unwrap_or(defaults.log_filter),
            json_logs: std::env::var(LOG_JSON_VAR)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.json_logs),
        }
    }
}

/// Installs the global tracing subscriber.
///
/// Call once at process start; a second call fails.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if config.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    result.map_err(|e| TelemetryError::Subscriber(e.to_string()))?;

    tracing::debug!(
        filter = %config.log_filter,
        json = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}
