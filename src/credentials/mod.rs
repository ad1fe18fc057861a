//! Credential descriptors
//!
//! A descriptor identifies one provider credential tuple and knows how to
//! exchange it for an access token. Every provider family is one variant of
//! [`CredentialKind`], the token store only ever deals with that enum.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tracing::{info, warn};

use crate::cache::token::Token;
use crate::cache::token_context::TokenContext;
use crate::channels::directory::ChannelDirectory;
use crate::config::channels::{ChannelConfig, ChannelType};
use crate::config::settings::{ProvidersConfig, SettingsConfig};
use crate::errors::{ConfigError, RefreshError};
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetrySettings;
use crate::utils::constants::{DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_SAFETY_MARGIN_SECS};

pub mod wechat_corp;

use wechat_corp::WeChatCorpCredential;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    /// previous token kept, failure already logged
    Failed,
}

/// Everything a descriptor needs to perform its token exchange
#[derive(Debug, Clone)]
pub struct ExchangeContext {
    /// carries the exchange timeout
    pub client: Client,
    pub retry: RetrySettings,
    pub safety_margin_seconds: u64,
}

impl ExchangeContext {
    pub fn new(timeout: Duration, retry: RetrySettings, safety_margin_seconds: u64) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            retry,
            safety_margin_seconds,
        })
    }

    pub fn from_settings(settings: &SettingsConfig) -> Result<Self> {
        Self::new(
            Duration::from_millis(settings.refresh_timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS)),
            RetrySettings::from(settings.retry.as_ref()),
            settings.safety_margin_seconds.unwrap_or(DEFAULT_SAFETY_MARGIN_SECS),
        )
    }
}

/// Capability set shared by every provider credential
pub trait Credential {
    /// provider family label, used in logs and metrics
    fn provider(&self) -> &'static str;

    /// Deterministic cache key, collision-free within the provider family.
    /// Contains secret material, never log it.
    fn key(&self) -> String;

    /// Non-secret identifier for logs
    fn label(&self) -> String;

    /// true iff every field needed for the exchange is present
    fn is_filled(&self) -> bool;

    /// true when more than one channel references the same (secret, app identity) pair
    fn is_shared<D: ChannelDirectory + ?Sized>(&self, directory: &D) -> bool;

    /// Last successfully obtained token, empty if none yet.
    fn token(&self) -> String;

    fn context(&self) -> &TokenContext;

    /// Performs the exchange and replaces token and expiry on success.
    /// A failure keeps the current token and is only logged.
    fn refresh(&mut self, exchange: &ExchangeContext) -> impl Future<Output = RefreshOutcome> + Send;
}

#[derive(Debug, Clone)]
pub enum CredentialKind {
    WeChatCorp(WeChatCorpCredential),
}

impl CredentialKind {
    /// Builds the descriptor a channel resolves to.
    pub fn from_channel(channel: &ChannelConfig, providers: &ProvidersConfig) -> Result<Self, ConfigError> {
        match channel.channel_type {
            ChannelType::WeChatCorp => {
                WeChatCorpCredential::from_channel(channel, &providers.wechat_corp).map(CredentialKind::WeChatCorp)
            }
        }
    }
}

impl From<WeChatCorpCredential> for CredentialKind {
    fn from(credential: WeChatCorpCredential) -> Self {
        CredentialKind::WeChatCorp(credential)
    }
}

impl Credential for CredentialKind {
    fn provider(&self) -> &'static str {
        match self {
            CredentialKind::WeChatCorp(c) => c.provider(),
        }
    }

    fn key(&self) -> String {
        match self {
            CredentialKind::WeChatCorp(c) => c.key(),
        }
    }

    fn label(&self) -> String {
        match self {
            CredentialKind::WeChatCorp(c) => c.label(),
        }
    }

    fn is_filled(&self) -> bool {
        match self {
            CredentialKind::WeChatCorp(c) => c.is_filled(),
        }
    }

    fn is_shared<D: ChannelDirectory + ?Sized>(&self, directory: &D) -> bool {
        match self {
            CredentialKind::WeChatCorp(c) => c.is_shared(directory),
        }
    }

    fn token(&self) -> String {
        match self {
            CredentialKind::WeChatCorp(c) => c.token(),
        }
    }

    fn context(&self) -> &TokenContext {
        match self {
            CredentialKind::WeChatCorp(c) => c.context(),
        }
    }

    async fn refresh(&mut self, exchange: &ExchangeContext) -> RefreshOutcome {
        match self {
            CredentialKind::WeChatCorp(c) => c.refresh(exchange).await,
        }
    }
}

/// Runs one exchange under the retry policy, recording metrics.
/// Returns `None` on failure; the error is logged here and goes no further.
pub(crate) async fn run_exchange<F, Fut>(
    provider: &'static str,
    exchange: &ExchangeContext,
    operation: F,
) -> Option<Token>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Token, RefreshError>>,
{
    let metrics = get_metrics().await;
    let start = get_instant();
    metrics.token_refresh_requests.with_label_values(&[provider]).inc();

    let result = exchange.retry.run_with_retry(operation).await;
    metrics
        .token_refresh_duration
        .with_label_values(&[provider])
        .observe(start.elapsed().as_secs_f64());

    match result {
        Ok(token) => {
            metrics
                .token_expiry_unix
                .with_label_values(&[provider])
                .set(token.exp_unix_ts as i64);
            info!("{} access token refreshed, expires at {}", provider, token.exp_unix_ts);
            Some(token)
        }
        Err(e) => {
            metrics
                .token_refresh_failures
                .with_label_values(&[provider, e.reason()])
                .inc();
            warn!("failed to refresh {} access token, keeping previous one: {}", provider, e);
            None
        }
    }
}
