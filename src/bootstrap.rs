use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cache::token_store::TokenStore;
use crate::channels::directory::{shared_credential_report, SharedCredential, StaticChannelDirectory};
use crate::channels::message::Message;
use crate::channels::ChannelKind;
use crate::config::channels::ServiceConfig;
use crate::config::proc_loader::file_to_config;
use crate::errors::{ConfigError, SendError};
use crate::utils::logging;

/// Everything a sender needs, built once at startup
pub struct Runtime {
    pub config: ServiceConfig,
    pub store: TokenStore,
    pub directory: StaticChannelDirectory,
    pub channels: HashMap<String, ChannelKind>,
    pub shared: Vec<SharedCredential>,
}

impl Runtime {
    pub async fn send(&self, channel_id: &str, message: &Message) -> Result<(), SendError> {
        let channel = self.channels.get(channel_id).ok_or_else(|| ConfigError::UnknownChannel {
            channel: channel_id.to_owned(),
        })?;
        channel.send(&self.store, message).await
    }
}

pub async fn run(config_path: &str) -> Result<Runtime> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let service_config = file_to_config(Path::new(config_path)).await?;
    logging::run(&service_config.settings);

    from_config(service_config).await
}

pub async fn from_config(service_config: ServiceConfig) -> Result<Runtime> {
    // -------------------------------
    // 2. Build channel directory and warn about shared credentials
    // -------------------------------

    let providers = &service_config.settings.providers;
    let directory = StaticChannelDirectory::from_config(&service_config.channels);
    let shared = shared_credential_report(&directory, providers).await;

    // -------------------------------
    // 3. Create token store, empty until the first send
    // -------------------------------

    let store = TokenStore::from_settings(&service_config.settings)?;

    // -------------------------------
    // 4. Build channel adapters
    // -------------------------------

    let mut channels = HashMap::new();
    for channel in directory.channels() {
        channels.insert(
            channel.channel_id.to_owned(),
            ChannelKind::from_config(channel, providers)?,
        );
    }

    info!(
        "push token agent ready: {} channel(s), {} shared credential(s)",
        channels.len(),
        shared.len()
    );

    Ok(Runtime {
        config: service_config,
        store,
        directory,
        channels,
        shared,
    })
}
