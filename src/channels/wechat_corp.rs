//! WeChat corporate account adapter
//!
//! Turns a [`Message`] into the `message/send` body, obtains the access
//! token from the shared [`TokenStore`] and performs the send call.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::token_store::TokenStore;
use crate::channels::message::Message;
use crate::config::channels::ChannelConfig;
use crate::config::settings::WeChatCorpEndpoints;
use crate::credentials::wechat_corp::WeChatCorpCredential;
use crate::credentials::{Credential, CredentialKind};
use crate::errors::{ConfigError, SendError};
use crate::observability::metrics::get_metrics;
use crate::utils::constants::{
    CHANNEL_WECHAT_CORP, WECHAT_CORP_APP_ID_SEPARATOR, WECHAT_CORP_TOKEN_REJECTED_CODES,
};

const CLIENT_TYPE_PLUGIN: &str = "plugin";

/// Splits `<corp_id>|<agent_id>`; anything but two non-empty parts is rejected.
pub fn parse_app_id(app_id: &str) -> Result<(String, String), ConfigError> {
    let invalid = || ConfigError::InvalidAppId {
        app_id: app_id.to_owned(),
    };
    let parts: Vec<&str> = app_id.split(WECHAT_CORP_APP_ID_SEPARATOR).collect();
    match parts.as_slice() {
        [corp_id, agent_id] if !corp_id.is_empty() && !agent_id.is_empty() => {
            Ok((corp_id.to_string(), agent_id.to_string()))
        }
        _ => Err(invalid()),
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    TextCard,
    Markdown,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TextCard {
    pub title: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Content {
    pub content: String,
}

/// `message/send` request body, exactly one of the payloads is set
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WeChatCorpMessageRequest {
    pub msgtype: MessageType,
    pub touser: String,
    pub agentid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textcard: Option<TextCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct WeChatCorpMessageResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

#[derive(Debug, Clone)]
pub struct WeChatCorpChannel {
    pub channel_id: String,
    pub to_user: String,
    /// formatting discriminator
    pub client_type: String,
    pub send_url: String,
    pub card_url: String,
    /// titles equal to this placeholder are sent as untitled
    pub system_name: String,
    credential: CredentialKind,
}

impl WeChatCorpChannel {
    /// Validates the channel before any network call is made.
    pub fn from_config(channel: &ChannelConfig, endpoints: &WeChatCorpEndpoints) -> Result<Self, ConfigError> {
        let missing = |field: &'static str| ConfigError::MissingField {
            channel: channel.channel_id.to_owned(),
            field,
        };
        if channel.secret.is_empty() {
            return Err(missing("secret"));
        }
        if channel.account_id.is_empty() {
            return Err(missing("account_id"));
        }
        let credential = WeChatCorpCredential::from_channel(channel, endpoints)?;

        Ok(Self {
            channel_id: channel.channel_id.to_owned(),
            to_user: channel.account_id.to_owned(),
            client_type: channel.other.to_owned(),
            send_url: endpoints.send_url.to_owned(),
            card_url: endpoints.card_url.to_owned(),
            system_name: endpoints.system_name.to_owned(),
            credential: credential.into(),
        })
    }

    pub fn credential(&self) -> &CredentialKind {
        &self.credential
    }

    fn agent_id(&self) -> &str {
        match &self.credential {
            CredentialKind::WeChatCorp(c) => &c.agent_id,
        }
    }

    pub fn build_request(&self, message: &Message) -> WeChatCorpMessageRequest {
        let touser = if message.to.is_empty() {
            self.to_user.to_owned()
        } else {
            message.to.to_owned()
        };
        let mut request = WeChatCorpMessageRequest {
            msgtype: MessageType::Text,
            touser,
            agentid: self.agent_id().to_owned(),
            textcard: None,
            text: None,
            markdown: None,
        };

        let title = if !self.system_name.is_empty() && message.title == self.system_name {
            ""
        } else {
            message.title.as_str()
        };
        let card = |url: &str| TextCard {
            title: title.to_owned(),
            description: message.description.to_owned(),
            url: url.to_owned(),
        };

        if message.content.is_empty() {
            if title.is_empty() {
                debug!("channel '{}': sending plain text message", self.channel_id);
                request.text = Some(Content {
                    content: message.description.to_owned(),
                });
            } else {
                debug!("channel '{}': sending text card message", self.channel_id);
                request.msgtype = MessageType::TextCard;
                request.textcard = Some(card(&self.card_url));
            }
        } else if self.client_type == CLIENT_TYPE_PLUGIN {
            debug!("channel '{}': sending plugin text card message", self.channel_id);
            request.msgtype = MessageType::TextCard;
            request.textcard = Some(card(&message.url));
        } else {
            debug!("channel '{}': sending markdown message", self.channel_id);
            request.msgtype = MessageType::Markdown;
            request.markdown = Some(Content {
                content: message.content.to_owned(),
            });
        }
        request
    }

    /// Sends one message. Failures are returned as is, retrying is up to the caller.
    pub async fn send(&self, store: &TokenStore, message: &Message) -> Result<(), SendError> {
        let metrics = get_metrics().await;
        metrics.message_sends.with_label_values(&[CHANNEL_WECHAT_CORP]).inc();

        let result = self.try_send(store, message).await;
        if let Err(e) = &result {
            metrics
                .message_send_failures
                .with_label_values(&[CHANNEL_WECHAT_CORP, e.reason()])
                .inc();
            warn!("channel '{}': send failed: {}", self.channel_id, e);
        }
        result
    }

    async fn try_send(&self, store: &TokenStore, message: &Message) -> Result<(), SendError> {
        let request = self.build_request(message);
        let access_token = store.get_token(&self.credential).await;
        if access_token.is_empty() {
            return Err(SendError::TokenUnavailable {
                label: self.credential.label(),
            });
        }

        let response = store
            .client()
            .post(&self.send_url)
            .query(&[("access_token", access_token.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(SendError::Transport)?;
        let body: WeChatCorpMessageResponse = response.json().await.map_err(SendError::Decode)?;

        if body.errcode != 0 {
            if WECHAT_CORP_TOKEN_REJECTED_CODES.contains(&body.errcode) {
                store.invalidate(&self.credential.key(), &access_token).await;
            }
            return Err(SendError::Provider {
                code: body.errcode,
                message: body.errmsg,
            });
        }
        Ok(())
    }
}
