use serde::{Deserialize, Serialize};

/// Notification handed to a channel adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// long form body, markdown where the provider supports it
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
    /// overrides the channel's default recipient when set
    #[serde(default)]
    pub to: String,
}
