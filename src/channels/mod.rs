use crate::cache::token_store::TokenStore;
use crate::config::channels::{ChannelConfig, ChannelType};
use crate::config::settings::ProvidersConfig;
use crate::credentials::CredentialKind;
use crate::errors::{ConfigError, SendError};

pub mod directory;
pub mod message;
pub mod wechat_corp;

use message::Message;
use wechat_corp::WeChatCorpChannel;

/// Channel adapter, one variant per provider family
#[derive(Debug, Clone)]
pub enum ChannelKind {
    WeChatCorp(WeChatCorpChannel),
}

impl ChannelKind {
    pub fn from_config(channel: &ChannelConfig, providers: &ProvidersConfig) -> Result<Self, ConfigError> {
        match channel.channel_type {
            ChannelType::WeChatCorp => {
                WeChatCorpChannel::from_config(channel, &providers.wechat_corp).map(ChannelKind::WeChatCorp)
            }
        }
    }

    pub fn credential(&self) -> &CredentialKind {
        match self {
            ChannelKind::WeChatCorp(c) => c.credential(),
        }
    }

    pub async fn send(&self, store: &TokenStore, message: &Message) -> Result<(), SendError> {
        match self {
            ChannelKind::WeChatCorp(c) => c.send(store, message).await,
        }
    }
}
