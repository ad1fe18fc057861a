use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::settings::SettingsConfig;
use crate::utils::constants::CHANNEL_WECHAT_CORP;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    #[serde(default)]
    pub channels: HashMap<String, ChannelConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChannelType {
    #[serde(rename = "wechat_corp")]
    WeChatCorp,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::WeChatCorp => CHANNEL_WECHAT_CORP,
        }
    }
}

/// One logical push channel.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// filled from the map key while loading
    #[serde(default)]
    pub channel_id: String,

    #[serde(rename = "type")]
    pub channel_type: ChannelType,

    /// provider application identity, `<corp_id>|<agent_id>` for wechat_corp
    pub app_id: String,

    pub secret: String,

    /// default recipient
    #[serde(default)]
    pub account_id: String,

    /// formatting discriminator, `plugin` switches markdown to text cards
    #[serde(default)]
    pub other: String,
}
