use chrono::Utc;
use tokio::time::Instant;

/// Absolute expiry for a provider reported lifetime, `expires_in <= 0` yields `now`.
/// Saturates instead of overflowing on absurd lifetimes.
pub fn expires_in_to_unix_ts(expires_in: i64) -> u64 {
    now_i64().saturating_add(expires_in.max(0)) as u64
}

pub fn now_u64() -> u64 {
    now_i64() as u64
}

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

pub fn get_instant() -> Instant {
    Instant::now()
}
