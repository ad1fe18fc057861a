use thiserror::Error;

/// Rejected channel or credential configuration. Raised before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Application identity must be exactly two non-empty parts joined by `|`
    #[error("invalid application identity '{app_id}': expected '<corp_id>|<agent_id>'")]
    InvalidAppId { app_id: String },

    /// A field required for the token exchange or the send call is empty
    #[error("channel '{channel}': required field '{field}' is empty")]
    MissingField { channel: String, field: &'static str },

    #[error("channel '{channel}' is not configured")]
    UnknownChannel { channel: String },
}

/// Failure of a single token exchange. Never leaves the token store.
#[derive(Error, Debug)]
pub enum RefreshError {
    /// Connection failure or timeout
    #[error("token exchange transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    /// Response body is not the expected JSON document
    #[error("token exchange response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),

    /// Decoded response carries no usable token
    #[error("token exchange response is malformed: {reason}")]
    Malformed { reason: String },

    /// Provider answered with a non-zero error code
    #[error("provider rejected token exchange: errcode={code}, errmsg={message}")]
    Provider { code: i64, message: String },
}

impl RefreshError {
    /// Only transport failures are worth another attempt within the same refresh.
    pub fn is_transient(&self) -> bool {
        matches!(self, RefreshError::Transport(_))
    }

    /// Label used for the failure metrics
    pub fn reason(&self) -> &'static str {
        match self {
            RefreshError::Transport(_) => "transport",
            RefreshError::Decode(_) | RefreshError::Malformed { .. } => "decode",
            RefreshError::Provider { .. } => "provider",
        }
    }
}

/// Failure of a message send, returned to the caller as is.
#[derive(Error, Debug)]
pub enum SendError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Token store holds no token for the channel credential yet
    #[error("no access token available for '{label}'")]
    TokenUnavailable { label: String },

    #[error("send transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("send response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("provider rejected message: errcode={code}, errmsg={message}")]
    Provider { code: i64, message: String },
}

impl SendError {
    pub fn reason(&self) -> &'static str {
        match self {
            SendError::Config(_) => "config",
            SendError::TokenUnavailable { .. } => "no_token",
            SendError::Transport(_) => "transport",
            SendError::Decode(_) => "decode",
            SendError::Provider { .. } => "provider",
        }
    }
}
