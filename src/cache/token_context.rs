use crate::cache::token::Token;
use crate::config::settings::StalenessPolicy;
use crate::helpers::time::now_u64;

/// Token plus the moment after which it must not be trusted
#[derive(Debug, Clone)]
pub struct TokenContext {
    pub token: Token,
    /// refresh is due at (expiry minus safety margin), unix seconds
    pub refresh_at_unix_ts: u64,
}

impl TokenContext {
    pub fn new(token: Token, safety_margin_seconds: u64) -> Self {
        let refresh_at_unix_ts = token.exp_unix_ts.saturating_sub(safety_margin_seconds);
        Self {
            token,
            refresh_at_unix_ts,
        }
    }

    pub fn empty() -> Self {
        Self::new(Token::empty(), 0)
    }

    /// Check if token should be updated
    pub fn should_update(&self, policy: StalenessPolicy) -> bool {
        if self.token.is_empty() {
            return true;
        }
        match policy {
            StalenessPolicy::Expiry => now_u64() >= self.refresh_at_unix_ts,
            StalenessPolicy::OnDemand => false,
        }
    }
}
