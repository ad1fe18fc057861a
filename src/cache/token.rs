
pub const TOKEN_VALUE_STUB: &str = "";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub exp_unix_ts: u64, // UNIX TIMESTAMP
}

impl Token {
    pub fn new(value: String, exp_unix_ts: u64) -> Self {
        Self { value, exp_unix_ts }
    }

    /// Placeholder held until the first successful refresh
    pub fn empty() -> Self {
        Self::new(TOKEN_VALUE_STUB.to_owned(), 0)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}
