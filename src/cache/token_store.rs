use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::settings::{SettingsConfig, StalenessPolicy};
use crate::credentials::{Credential, CredentialKind, ExchangeContext, RefreshOutcome};
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::DEFAULT_RETRY_COOLDOWN_MS;

/// Descriptor state guarded by the per-key lock
#[derive(Debug)]
struct Slot {
    credential: CredentialKind,
    /// set when the provider rejected the token before its expiry
    invalidated: bool,
    last_failure: Option<Instant>,
}

impl Slot {
    fn is_stale(&self, policy: StalenessPolicy) -> bool {
        self.invalidated || self.credential.context().should_update(policy)
    }
}

#[derive(Debug)]
struct Entry {
    slot: Mutex<Slot>,
    /// completed refreshes, successful or not
    completed_refreshes: AtomicU64,
}

impl Entry {
    fn new(credential: CredentialKind) -> Self {
        Self {
            slot: Mutex::new(Slot {
                credential,
                invalidated: false,
                last_failure: None,
            }),
            completed_refreshes: AtomicU64::new(0),
        }
    }
}

/// Keyed access token cache shared by every channel adapter.
///
/// The map lock is held only for lookup and insert. Each key has its own lock,
/// which is the only one held across a token exchange, so at most one
/// exchange per key is in flight and keys never wait on each other.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<RwLock<HashMap<String, Arc<Entry>>>>,
    exchange: ExchangeContext,
    policy: StalenessPolicy,
    retry_cooldown: Duration,
}

impl TokenStore {
    /// Empty store
    pub fn new(exchange: ExchangeContext, policy: StalenessPolicy, retry_cooldown: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            exchange,
            policy,
            retry_cooldown,
        }
    }

    pub fn from_settings(settings: &SettingsConfig) -> Result<Self> {
        Ok(Self::new(
            ExchangeContext::from_settings(settings)?,
            settings.staleness.unwrap_or_default(),
            Duration::from_millis(settings.retry_cooldown_ms.unwrap_or(DEFAULT_RETRY_COOLDOWN_MS)),
        ))
    }

    /// HTTP client carrying the exchange timeout, shared with the adapters
    pub fn client(&self) -> &Client {
        &self.exchange.client
    }

    /// Returns a token for `credential`, refreshing it first when stale.
    ///
    /// Never fails: when the refresh does not succeed the cached value is
    /// returned, which is empty if no refresh ever succeeded.
    pub async fn get_token(&self, credential: &CredentialKind) -> String {
        if !credential.is_filled() {
            warn!(
                "{} credential '{}' is not filled, token exchange skipped",
                credential.provider(),
                credential.label()
            );
            return String::new();
        }

        let entry = self.entry(credential).await;
        let observed = entry.completed_refreshes.load(Ordering::Acquire);
        let mut slot = entry.slot.lock().await;

        if !slot.is_stale(self.policy) {
            return slot.credential.token();
        }

        let metrics = get_metrics().await;
        // someone else finished a refresh while we were waiting for the lock
        if entry.completed_refreshes.load(Ordering::Acquire) != observed {
            debug!("'{}' refreshed by a concurrent caller", credential.label());
            metrics.token_refresh_skipped.with_label_values(&["joined"]).inc();
            return slot.credential.token();
        }

        if let Some(failed_at) = slot.last_failure {
            if failed_at.elapsed() < self.retry_cooldown {
                debug!(
                    "'{}' last refresh failed {:?} ago, serving cached token",
                    credential.label(),
                    failed_at.elapsed()
                );
                metrics.token_refresh_skipped.with_label_values(&["cooldown"]).inc();
                return slot.credential.token();
            }
        }

        info!("refreshing {} token for '{}'", credential.provider(), credential.label());
        let outcome = slot.credential.refresh(&self.exchange).await;
        match outcome {
            RefreshOutcome::Refreshed => {
                slot.invalidated = false;
                slot.last_failure = None;
            }
            RefreshOutcome::Failed => {
                slot.last_failure = Some(get_instant());
            }
        }
        entry.completed_refreshes.fetch_add(1, Ordering::AcqRel);

        slot.credential.token()
    }

    /// Marks the cached token stale without discarding it, but only while it is
    /// still `rejected_token`. A rejection of a token that was already replaced
    /// is ignored.
    pub async fn invalidate(&self, key: &str, rejected_token: &str) {
        let entry = self.inner.read().await.get(key).cloned();
        if let Some(entry) = entry {
            let mut slot = entry.slot.lock().await;
            if slot.credential.token() != rejected_token {
                debug!(
                    "{} token for '{}' already replaced, rejection ignored",
                    slot.credential.provider(),
                    slot.credential.label()
                );
                return;
            }
            info!("{} token for '{}' invalidated", slot.credential.provider(), slot.credential.label());
            slot.invalidated = true;
            slot.last_failure = None;
        }
    }

    /// Cached token for `key` without triggering a refresh
    pub async fn cached_token(&self, key: &str) -> Option<String> {
        let entry = self.inner.read().await.get(key).cloned()?;
        let slot = entry.slot.lock().await;
        Some(slot.credential.token())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    async fn entry(&self, credential: &CredentialKind) -> Arc<Entry> {
        let key = credential.key();
        if let Some(entry) = self.inner.read().await.get(&key) {
            return entry.clone();
        }

        let mut map = self.inner.write().await;
        let entry = map
            .entry(key)
            .or_insert_with(|| {
                debug!("new {} credential '{}' cached", credential.provider(), credential.label());
                Arc::new(Entry::new(credential.clone()))
            })
            .clone();
        get_metrics().await.cached_credentials.set(map.len() as i64);
        entry
    }
}
