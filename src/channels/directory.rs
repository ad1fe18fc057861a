use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::config::channels::{ChannelConfig, ChannelType};
use crate::config::settings::ProvidersConfig;
use crate::credentials::{Credential, CredentialKind};
use crate::observability::metrics::get_metrics;

/// Read-only view over the configured channels
pub trait ChannelDirectory: Send + Sync {
    /// Channels of `channel_type` configured with exactly this secret and app identity
    fn count_matching(&self, channel_type: ChannelType, secret: &str, app_id: &str) -> usize;
}

/// Channel directory loaded once from the service configuration
#[derive(Debug, Clone, Default)]
pub struct StaticChannelDirectory {
    channels: Vec<ChannelConfig>,
}

impl StaticChannelDirectory {
    pub fn new(channels: impl IntoIterator<Item = ChannelConfig>) -> Self {
        let mut channels: Vec<ChannelConfig> = channels.into_iter().collect();
        channels.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));
        Self { channels }
    }

    pub fn from_config(channels: &HashMap<String, ChannelConfig>) -> Self {
        Self::new(channels.values().cloned())
    }

    pub fn channels(&self) -> &[ChannelConfig] {
        &self.channels
    }

    pub fn get(&self, channel_id: &str) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| c.channel_id == channel_id)
    }
}

impl ChannelDirectory for StaticChannelDirectory {
    fn count_matching(&self, channel_type: ChannelType, secret: &str, app_id: &str) -> usize {
        self.channels
            .iter()
            .filter(|c| c.channel_type == channel_type && c.secret == secret && c.app_id == app_id)
            .count()
    }
}

/// Credential referenced by more than one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedCredential {
    pub provider: &'static str,
    /// non-secret label, the app identity for wechat_corp
    pub label: String,
    pub channels: Vec<String>,
}

/// Warns about every credential shared between channels. Diagnostics only,
/// caching works the same for shared credentials.
pub async fn shared_credential_report(
    directory: &StaticChannelDirectory,
    providers: &ProvidersConfig,
) -> Vec<SharedCredential> {
    // key -> (credential, channel ids)
    let mut by_key: BTreeMap<String, (CredentialKind, Vec<String>)> = BTreeMap::new();
    for channel in directory.channels() {
        match CredentialKind::from_channel(channel, providers) {
            Ok(credential) => {
                by_key
                    .entry(credential.key())
                    .or_insert_with(|| (credential, Vec::new()))
                    .1
                    .push(channel.channel_id.to_owned());
            }
            Err(e) => debug!("channel '{}' skipped in shared credential report: {}", channel.channel_id, e),
        }
    }

    let shared: Vec<SharedCredential> = by_key
        .into_values()
        .filter(|(credential, _)| credential.is_shared(directory))
        .map(|(credential, channels)| {
            warn!(
                "{} credential '{}' is shared by {} channels {:?}; they will use one access token",
                credential.provider(),
                credential.label(),
                channels.len(),
                channels
            );
            SharedCredential {
                provider: credential.provider(),
                label: credential.label(),
                channels,
            }
        })
        .collect();

    get_metrics().await.shared_credentials.set(shared.len() as i64);
    shared
}
