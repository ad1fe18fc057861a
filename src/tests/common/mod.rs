// tests/common/mod.rs
pub use axum::{Json, Router};
pub use serde_json::{json, Value};
pub use tokio::task::JoinHandle;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::Query;
use axum::routing::{get, post};

use crate::cache::token_store::TokenStore;
use crate::config::settings::{ProvidersConfig, SettingsConfig, StalenessPolicy, WeChatCorpEndpoints};
use crate::credentials::wechat_corp::WeChatCorpCredential;
use crate::credentials::CredentialKind;

pub const TOKEN_PATH: &str = "/cgi-bin/gettoken";
pub const SEND_PATH: &str = "/cgi-bin/message/send";

/// (hit index starting at 0, query params) -> (delay ms, json body)
pub type TokenReply = Arc<dyn Fn(usize, &HashMap<String, String>) -> (u64, Value) + Send + Sync>;
/// hit index starting at 0 -> json body
pub type SendReply = Arc<dyn Fn(usize) -> Value + Send + Sync>;

pub fn token_reply<F>(reply: F) -> TokenReply
where
    F: Fn(usize, &HashMap<String, String>) -> (u64, Value) + Send + Sync + 'static,
{
    Arc::new(reply)
}

pub fn send_reply<F>(reply: F) -> SendReply
where
    F: Fn(usize) -> Value + Send + Sync + 'static,
{
    Arc::new(reply)
}

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Address nothing listens on
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    listener.local_addr().unwrap()
}

/// Stubbed provider counting token exchanges and sends
pub struct StubProvider {
    pub addr: SocketAddr,
    pub token_hits: Arc<AtomicUsize>,
    pub send_hits: Arc<AtomicUsize>,
    /// (access_token query param, body) of the last send
    pub last_send: Arc<Mutex<Option<(String, Value)>>>,
    handle: JoinHandle<()>,
}

impl StubProvider {
    pub fn token_hits(&self) -> usize {
        self.token_hits.load(Ordering::SeqCst)
    }

    pub fn send_hits(&self) -> usize {
        self.send_hits.load(Ordering::SeqCst)
    }
}

impl Drop for StubProvider {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_provider(token_reply: TokenReply, send_reply: SendReply) -> StubProvider {
    let token_hits = Arc::new(AtomicUsize::new(0));
    let send_hits = Arc::new(AtomicUsize::new(0));
    let last_send = Arc::new(Mutex::new(None));

    let token_counter = token_hits.clone();
    let send_counter = send_hits.clone();
    let send_capture = last_send.clone();

    let router = Router::new()
        .route(
            TOKEN_PATH,
            get(move |Query(params): Query<HashMap<String, String>>| {
                let counter = token_counter.clone();
                let reply = token_reply.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    let (delay_ms, body) = reply(n, &params);
                    if delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                    Json(body)
                }
            }),
        )
        .route(
            SEND_PATH,
            post(move |Query(params): Query<HashMap<String, String>>, Json(body): Json<Value>| {
                let counter = send_counter.clone();
                let capture = send_capture.clone();
                let reply = send_reply.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    let access_token = params.get("access_token").cloned().unwrap_or_default();
                    *capture.lock().unwrap() = Some((access_token, body));
                    Json(reply(n))
                }
            }),
        );

    let (handle, addr) = spawn_axum(router).await;
    StubProvider {
        addr,
        token_hits,
        send_hits,
        last_send,
        handle,
    }
}

/// Token endpoint only, sends always succeed
pub async fn spawn_token_endpoint(token_reply: TokenReply) -> StubProvider {
    spawn_provider(token_reply, send_reply(|_| send_ok())).await
}

pub fn token_ok(token: &str, expires_in: i64) -> Value {
    json!({"errcode": 0, "errmsg": "ok", "access_token": token, "expires_in": expires_in})
}

pub fn token_err(code: i64, message: &str) -> Value {
    json!({"errcode": code, "errmsg": message})
}

pub fn send_ok() -> Value {
    json!({"errcode": 0, "errmsg": "ok"})
}

pub fn endpoints_for(addr: SocketAddr) -> WeChatCorpEndpoints {
    WeChatCorpEndpoints {
        token_url: format!("http://{}{}", addr, TOKEN_PATH),
        send_url: format!("http://{}{}", addr, SEND_PATH),
        card_url: "https://push.example.com".to_owned(),
        system_name: String::new(),
    }
}

pub fn settings_for(addr: SocketAddr, staleness: StalenessPolicy, retry_cooldown_ms: u64) -> SettingsConfig {
    SettingsConfig {
        safety_margin_seconds: Some(300),
        staleness: Some(staleness),
        retry_cooldown_ms: Some(retry_cooldown_ms),
        refresh_timeout_ms: Some(5000),
        providers: ProvidersConfig {
            wechat_corp: endpoints_for(addr),
        },
        ..Default::default()
    }
}

pub fn store_for(addr: SocketAddr, staleness: StalenessPolicy, retry_cooldown_ms: u64) -> TokenStore {
    TokenStore::from_settings(&settings_for(addr, staleness, retry_cooldown_ms)).expect("token store")
}

pub fn credential(addr: SocketAddr, corp_id: &str, agent_id: &str, secret: &str) -> CredentialKind {
    WeChatCorpCredential::new(
        corp_id.to_owned(),
        agent_id.to_owned(),
        secret.to_owned(),
        endpoints_for(addr).token_url,
    )
    .into()
}
