use crate::config::channels::ServiceConfig;
use crate::config::settings::{LogFormat, LoggingConfig};
use crate::utils::constants::{DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_RETRY_COOLDOWN_MS, DEFAULT_SAFETY_MARGIN_SECS};

pub fn initiate_default_values(mut config: ServiceConfig) -> ServiceConfig {
    let settings = &mut config.settings;
    if settings.logging.is_none() {
        settings.logging = Some(LoggingConfig::new("info".to_owned(), LogFormat::Compact));
    }
    settings.safety_margin_seconds.get_or_insert(DEFAULT_SAFETY_MARGIN_SECS);
    settings.staleness.get_or_insert_with(Default::default);
    settings.retry_cooldown_ms.get_or_insert(DEFAULT_RETRY_COOLDOWN_MS);
    settings.refresh_timeout_ms.get_or_insert(DEFAULT_HTTP_TIMEOUT_MS);

    // propogate channel name to ChannelConfig, trim copy-paste whitespace
    config.channels = config
        .channels
        .into_iter()
        .map(|(channel_id, mut channel_config)| {
            channel_config.channel_id = channel_id.to_owned();
            channel_config.app_id = channel_config.app_id.trim().to_owned();
            channel_config.secret = channel_config.secret.trim().to_owned();
            channel_config.account_id = channel_config.account_id.trim().to_owned();
            (channel_id, channel_config)
        })
        .collect();

    config
}
