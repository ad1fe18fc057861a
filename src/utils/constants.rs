//! Shared constants and invariants

pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 300;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_RETRY_COOLDOWN_MS: u64 = 1000;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 1;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 1000;

// WeChat corporate account endpoints
pub const DEFAULT_WECHAT_CORP_TOKEN_URL: &str = "https://qyapi.weixin.qq.com/cgi-bin/gettoken";
pub const DEFAULT_WECHAT_CORP_SEND_URL: &str = "https://qyapi.weixin.qq.com/cgi-bin/message/send";
pub const WECHAT_CORP_APP_ID_SEPARATOR: char = '|';
/// errcodes meaning the access token itself is no longer accepted
pub const WECHAT_CORP_TOKEN_REJECTED_CODES: [i64; 2] = [40014, 42001];

// Supported channel types
pub const CHANNEL_WECHAT_CORP: &str = "wechat_corp";
