use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_WECHAT_CORP_SEND_URL, DEFAULT_WECHAT_CORP_TOKEN_URL,
};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    /// seconds before the provider reported expiry at which a token turns stale
    pub safety_margin_seconds: Option<u64>,
    pub staleness: Option<StalenessPolicy>,
    /// minimal pause between two failed refreshes of the same credential
    pub retry_cooldown_ms: Option<u64>,
    /// bound for a single token exchange request
    pub refresh_timeout_ms: Option<u64>,
    pub retry: Option<RetryConfig>,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// How the token store decides that a cached token can no longer be trusted
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StalenessPolicy {
    /// stale when empty, invalidated or past `expiry - safety_margin`
    #[default]
    Expiry,
    /// stale only when empty or invalidated, expiry is ignored
    OnDemand,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    /// will be mutiply by 2 on every attempt until max_delay_ms
    pub base_delay_ms: Option<u64>,
    /// invariant: >= base_delay_ms
    pub max_delay_ms: Option<u64>,
}

/// ================================
/// Provider endpoints
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub wechat_corp: WeChatCorpEndpoints,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeChatCorpEndpoints {
    #[serde(default = "default_wechat_corp_token_url")]
    pub token_url: String,
    #[serde(default = "default_wechat_corp_send_url")]
    pub send_url: String,
    /// link attached to text cards that carry no url of their own
    #[serde(default)]
    pub card_url: String,
    /// placeholder title callers fill in by default, cleared before sending
    #[serde(default)]
    pub system_name: String,
}

impl Default for WeChatCorpEndpoints {
    fn default() -> Self {
        Self {
            token_url: default_wechat_corp_token_url(),
            send_url: default_wechat_corp_send_url(),
            card_url: String::new(),
            system_name: String::new(),
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_wechat_corp_token_url() -> String {
    DEFAULT_WECHAT_CORP_TOKEN_URL.to_string()
}

fn default_wechat_corp_send_url() -> String {
    DEFAULT_WECHAT_CORP_SEND_URL.to_string()
}
