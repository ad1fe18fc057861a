use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::settings::{LogFormat, LoggingConfig, SettingsConfig};

pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Resolve the logging config: `LOG_LEVEL` env overrides the configured level.
pub fn resolve(settings: &SettingsConfig, env_log_level: Option<String>) -> LoggingConfig {
    let configured = settings
        .logging
        .to_owned()
        .unwrap_or_else(|| LoggingConfig::new("info".to_owned(), LogFormat::Compact));

    LoggingConfig::new(
        env_log_level
            .filter(|level| !level.trim().is_empty())
            .unwrap_or(configured.level),
        configured.format,
    )
}

pub fn run(settings: &SettingsConfig) {
    let logging_config = resolve(settings, std::env::var(LOG_LEVEL_ENV).ok());
    init_logging(&logging_config);
}

/// Initialize tracing with the desired config. A second call is a no-op.
pub fn init_logging(cfg: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(cfg.level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"));

    // Base layer: filter + writer
    let registry = tracing_subscriber::registry().with(env_filter);

    // Choose format layer
    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .flatten_event(true) // flattens fields, good for CRI log parsers
                .with_ansi(false); // CRI parsers dislike ANSI color codes

            let _ = registry.with(layer).try_init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(true);

            let _ = registry.with(layer).try_init();
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_level_overrides_configured_level() {
        let settings = SettingsConfig {
            logging: Some(LoggingConfig::new("warn".into(), LogFormat::Json)),
            ..Default::default()
        };
        let resolved = resolve(&settings, Some("debug".into()));
        assert_eq!(resolved.level, "debug");
        assert_eq!(resolved.format, LogFormat::Json);

        assert_eq!(resolve(&settings, None).level, "warn");
        assert_eq!(resolve(&SettingsConfig::default(), Some(" ".into())).level, "info");
    }
}
