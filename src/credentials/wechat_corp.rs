use reqwest::Client;
use serde::Deserialize;

use crate::cache::token::Token;
use crate::cache::token_context::TokenContext;
use crate::channels::directory::ChannelDirectory;
use crate::channels::wechat_corp::parse_app_id;
use crate::config::channels::{ChannelConfig, ChannelType};
use crate::config::settings::WeChatCorpEndpoints;
use crate::credentials::{run_exchange, Credential, ExchangeContext, RefreshOutcome};
use crate::errors::{ConfigError, RefreshError};
use crate::helpers::time::expires_in_to_unix_ts;
use crate::utils::constants::{CHANNEL_WECHAT_CORP, WECHAT_CORP_APP_ID_SEPARATOR};

/// Token exchange response, `access_token`/`expires_in` are only set when `errcode == 0`
#[derive(Debug, Deserialize)]
struct WeChatCorpTokenResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

/// WeChat corporate account application credential
#[derive(Debug, Clone)]
pub struct WeChatCorpCredential {
    pub corp_id: String,
    pub agent_id: String,
    pub agent_secret: String,
    pub token_url: String,
    context: TokenContext,
}

impl WeChatCorpCredential {
    pub fn new(corp_id: String, agent_id: String, agent_secret: String, token_url: String) -> Self {
        Self {
            corp_id,
            agent_id,
            agent_secret,
            token_url,
            context: TokenContext::empty(),
        }
    }

    pub fn from_channel(channel: &ChannelConfig, endpoints: &WeChatCorpEndpoints) -> Result<Self, ConfigError> {
        let (corp_id, agent_id) = parse_app_id(&channel.app_id)?;
        Ok(Self::new(
            corp_id,
            agent_id,
            channel.secret.to_owned(),
            endpoints.token_url.to_owned(),
        ))
    }

    /// application identity as stored in channel configuration
    pub fn app_id(&self) -> String {
        format!("{}{}{}", self.corp_id, WECHAT_CORP_APP_ID_SEPARATOR, self.agent_id)
    }

    async fn fetch_token(&self, client: &Client) -> Result<Token, RefreshError> {
        let response = client
            .get(&self.token_url)
            .query(&[
                ("corpid", self.corp_id.as_str()),
                ("corpsecret", self.agent_secret.as_str()),
            ])
            .send()
            .await
            .map_err(RefreshError::Transport)?;

        let body: WeChatCorpTokenResponse = response.json().await.map_err(RefreshError::Decode)?;
        if body.errcode != 0 {
            return Err(RefreshError::Provider {
                code: body.errcode,
                message: body.errmsg,
            });
        }
        if body.access_token.is_empty() {
            return Err(RefreshError::Malformed {
                reason: "access_token is empty".to_owned(),
            });
        }
        Ok(Token::new(body.access_token, expires_in_to_unix_ts(body.expires_in)))
    }
}

impl Credential for WeChatCorpCredential {
    fn provider(&self) -> &'static str {
        CHANNEL_WECHAT_CORP
    }

    fn key(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.corp_id,
            self.agent_id,
            self.agent_secret,
            sep = WECHAT_CORP_APP_ID_SEPARATOR
        )
    }

    fn label(&self) -> String {
        self.app_id()
    }

    fn is_filled(&self) -> bool {
        !self.corp_id.is_empty() && !self.agent_id.is_empty() && !self.agent_secret.is_empty()
    }

    fn is_shared<D: ChannelDirectory + ?Sized>(&self, directory: &D) -> bool {
        directory.count_matching(ChannelType::WeChatCorp, &self.agent_secret, &self.app_id()) > 1
    }

    fn token(&self) -> String {
        self.context.token.value.to_owned()
    }

    fn context(&self) -> &TokenContext {
        &self.context
    }

    async fn refresh(&mut self, exchange: &ExchangeContext) -> RefreshOutcome {
        let this: &Self = self;
        let client = &exchange.client;
        let fetched = run_exchange(self.provider(), exchange, move || this.fetch_token(client)).await;

        match fetched {
            Some(token) => {
                self.context = TokenContext::new(token, exchange.safety_margin_seconds);
                RefreshOutcome::Refreshed
            }
            None => RefreshOutcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(corp: &str, agent: &str, secret: &str) -> WeChatCorpCredential {
        WeChatCorpCredential::new(corp.into(), agent.into(), secret.into(), "http://127.0.0.1:1/gettoken".into())
    }

    #[test]
    fn key_separates_identifying_fields() {
        let a = credential("ab", "c", "s");
        let b = credential("a", "bc", "s");
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), "ab|c|s");
    }

    #[test]
    fn filled_requires_every_field() {
        assert!(credential("corp", "1000002", "secret").is_filled());
        assert!(!credential("", "1000002", "secret").is_filled());
        assert!(!credential("corp", "", "secret").is_filled());
        assert!(!credential("corp", "1000002", "").is_filled());
    }

    #[test]
    fn new_credential_has_no_token() {
        let c = credential("corp", "1000002", "secret");
        assert_eq!(c.token(), "");
        assert_eq!(c.app_id(), "corp|1000002");
    }
}
