//! Structured logging setup, adapted from the tracing-subscriber init
//! pattern used elsewhere in the corpus (JSON vs. pretty output, env-driven
//! filter, a handful of named presets).

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl LogConfig {
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            json_format: true,
        }
    }

    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
        }
    }

    pub fn verbose() -> Self {
        Self {
            level: "trace".to_string(),
            json_format: false,
        }
    }
}

/// Installs a global tracing subscriber. Safe to call once per process; a
/// second call is a no-op error that callers may ignore.
pub fn init_logging(config: LogConfig) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json_format {
        let subscriber = Registry::default().with(filter).with(fmt::layer().json());
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(filter).with(fmt::layer().pretty());
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Reads `RUST_LOG` / `TXN_ENGINE_LOG_FORMAT` and installs a subscriber
/// accordingly. Falls back to [`LogConfig::default`] when unset.
pub fn init_from_env() {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let json_format = std::env::var("TXN_ENGINE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let _ = init_logging(LogConfig {
        level,
        json_format,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_have_expected_levels() {
        assert_eq!(LogConfig::production().level, "info");
        assert!(LogConfig::production().json_format);
        assert_eq!(LogConfig::development().level, "debug");
        assert!(!LogConfig::development().json_format);
    }
}
