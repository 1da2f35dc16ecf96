//! Tracing subscriber bootstrap.
//!
//! Library code only emits `tracing` events. Host applications call
//! [`init_tracing`] once at startup to route them somewhere.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ConfigError, RoostError, RoostResult};

const DEFAULT_FILTER: &str = "roost_storage=info,roost_revenue=info,warn";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Telemetry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive string.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl TelemetryConfig {
    /// Create TelemetryConfig from environment variables.
    ///
    /// - `ROOST_LOG`: filter directives (default: "roost_storage=info,roost_revenue=info,warn")
    /// - `ROOST_LOG_FORMAT`: "json" or "pretty" (default: pretty)
    pub fn from_env() -> Self {
        let filter = std::env::var("ROOST_LOG")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let format = std::env::var("ROOST_LOG_FORMAT")
            .ok()
            .map(|s| parse_format(&s))
            .unwrap_or(LogFormat::Pretty);

        Self { filter, format }
    }
}

fn parse_format(raw: &str) -> LogFormat {
    if raw.trim().eq_ignore_ascii_case("json") {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    }
}

/// Install the global tracing subscriber.
///
/// Fails with [`ConfigError::InvalidValue`] for an unparseable filter and
/// [`ConfigError::TelemetryInit`] when a global subscriber is already set.
pub fn init_tracing(config: &TelemetryConfig) -> RoostResult<()> {
    let env_filter = EnvFilter::try_new(&config.filter).map_err(|e| {
        RoostError::Config(ConfigError::InvalidValue {
            field: "filter".to_string(),
            value: config.filter.clone(),
            reason: e.to_string(),
        })
    })?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    result.map_err(|e| {
        RoostError::Config(ConfigError::TelemetryInit {
            reason: e.to_string(),
        })
    })?;

    tracing::info!(filter = %config.filter, format = ?config.format, "Telemetry initialized");
    Ok(())
}
