//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * retry / cooldown / timeout invariants
//!   * logging level
//!   * provider endpoint urls
//!   * channel credentials (application identity format, required fields)

use std::collections::HashMap;
use tracing::{error, info};

use crate::channels::wechat_corp::parse_app_id;
use crate::config::channels::{ChannelConfig, ChannelType, ServiceConfig};
use crate::config::settings::{RetryConfig, SettingsConfig};
use crate::observability::metrics::get_metrics;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_channels(&cfg.channels, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(retry) = &settings.retry {
        validate_retry("settings.retry", retry, errors);
    }

    // safety margin sane bounds
    if let Some(s) = settings.safety_margin_seconds {
        if s > 60 * 60 * 24 {
            errors.push(format!(
                "settings.safety_margin_seconds ({}) is unreasonably large",
                s
            ));
        }
    }

    if settings.refresh_timeout_ms == Some(0) {
        errors.push("settings.refresh_timeout_ms must be > 0".to_string());
    }

    let endpoints = &settings.providers.wechat_corp;
    for (path, url) in [
        ("settings.providers.wechat_corp.token_url", &endpoints.token_url),
        ("settings.providers.wechat_corp.send_url", &endpoints.send_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("{} '{}' must be an http(s) url", path, url));
        }
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn validate_retry(path: &str, retry: &RetryConfig, errors: &mut Vec<String>) {
    if let Some(attempts) = retry.attempts {
        if attempts == 0 {
            errors.push(format!("{}.attempts must be > 0", path));
        }
    }
    if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
        if max < base {
            errors.push(format!(
                "{}.max_delay_ms ({}) must be >= base_delay_ms ({})",
                path, max, base
            ));
        }
    }
}

/// CHANNEL CREDENTIALS
fn validate_channels(channels: &HashMap<String, ChannelConfig>, errors: &mut Vec<String>) {
    for (name, channel) in channels {
        match channel.channel_type {
            ChannelType::WeChatCorp => {
                if let Err(e) = parse_app_id(&channel.app_id) {
                    errors.push(format!("channels.{}: {}", name, e));
                }
            }
        }
        if channel.secret.is_empty() {
            errors.push(format!("channels.{}: secret cannot be empty", name));
        }
        if channel.account_id.is_empty() {
            errors.push(format!("channels.{}: account_id cannot be empty", name));
        }
    }
}
