// End to end: adapter -> token store -> exchange -> send.

#[cfg(test)]
mod test {

    use std::net::SocketAddr;

    use crate::cache::token_store::TokenStore;
    use crate::channels::message::Message;
    use crate::channels::wechat_corp::WeChatCorpChannel;
    use crate::config::channels::{ChannelConfig, ChannelType};
    use crate::config::settings::StalenessPolicy;
    use crate::errors::SendError;
    use crate::observability::metrics::get_metrics;
    use crate::tests::common::{
        endpoints_for, json, send_ok, send_reply, settings_for, spawn_provider, token_err, token_ok, token_reply,
    };

    fn channel_for(addr: SocketAddr, other: &str) -> WeChatCorpChannel {
        let config = ChannelConfig {
            channel_id: "ops".to_owned(),
            channel_type: ChannelType::WeChatCorp,
            app_id: "corp|1000002".to_owned(),
            secret: "secret".to_owned(),
            account_id: "zhangsan".to_owned(),
            other: other.to_owned(),
        };
        WeChatCorpChannel::from_config(&config, &endpoints_for(addr)).expect("valid channel")
    }

    fn store(addr: SocketAddr) -> TokenStore {
        TokenStore::from_settings(&settings_for(addr, StalenessPolicy::Expiry, 0)).expect("token store")
    }

    #[tokio::test]
    async fn message_is_sent_with_cached_token() {
        let stub = spawn_provider(
            token_reply(|_, _| (0, token_ok("T1", 7200))),
            send_reply(|_| send_ok()),
        )
        .await;
        let store = store(stub.addr);
        let channel = channel_for(stub.addr, "");

        let message = Message {
            title: "deploy".to_owned(),
            content: "**v1.2.0** rolled out".to_owned(),
            ..Default::default()
        };
        channel.send(&store, &message).await.expect("first send");
        channel.send(&store, &message).await.expect("second send");

        assert_eq!(stub.token_hits(), 1);
        assert_eq!(stub.send_hits(), 2);

        let (access_token, body) = stub.last_send.lock().unwrap().clone().expect("send captured");
        assert_eq!(access_token, "T1");
        assert_eq!(
            body,
            json!({
                "msgtype": "markdown",
                "touser": "zhangsan",
                "agentid": "1000002",
                "markdown": {"content": "**v1.2.0** rolled out"}
            })
        );

        let exposition = get_metrics().await.render().expect("metrics render");
        assert!(exposition.contains("pushtoken_message_sends_total{channel_type=\"wechat_corp\"}"));
        assert!(exposition.contains("pushtoken_token_refresh_requests_total{provider=\"wechat_corp\"}"));
    }

    #[tokio::test]
    async fn provider_error_on_send_is_returned() {
        let stub = spawn_provider(
            token_reply(|_, _| (0, token_ok("T1", 7200))),
            send_reply(|_| json!({"errcode": 81013, "errmsg": "user, party and tag all invalid"})),
        )
        .await;
        let store = store(stub.addr);
        let channel = channel_for(stub.addr, "");

        let err = channel
            .send(&store, &Message { description: "hi".to_owned(), ..Default::default() })
            .await
            .unwrap_err();

        match err {
            SendError::Provider { code, message } => {
                assert_eq!(code, 81013);
                assert_eq!(message, "user, party and tag all invalid");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(stub.send_hits(), 1, "no automatic retry");
    }

    #[tokio::test]
    async fn rejected_access_token_is_refreshed_on_next_send() {
        let stub = spawn_provider(
            token_reply(|n, _| (0, token_ok(&format!("T{}", n + 1), 7200))),
            send_reply(|n| {
                if n == 0 {
                    json!({"errcode": 42001, "errmsg": "access_token expired"})
                } else {
                    send_ok()
                }
            }),
        )
        .await;
        let store = store(stub.addr);
        let channel = channel_for(stub.addr, "");
        let message = Message { description: "hi".to_owned(), ..Default::default() };

        assert!(matches!(
            channel.send(&store, &message).await,
            Err(SendError::Provider { code: 42001, .. })
        ));
        channel.send(&store, &message).await.expect("send with new token");

        assert_eq!(stub.token_hits(), 2);
        let (access_token, _) = stub.last_send.lock().unwrap().clone().unwrap();
        assert_eq!(access_token, "T2");
    }

    #[tokio::test]
    async fn send_without_token_fails_before_calling_provider() {
        let stub = spawn_provider(
            token_reply(|_, _| (0, token_err(40001, "invalid secret"))),
            send_reply(|_| send_ok()),
        )
        .await;
        let store = store(stub.addr);
        let channel = channel_for(stub.addr, "");

        let err = channel
            .send(&store, &Message { description: "hi".to_owned(), ..Default::default() })
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::TokenUnavailable { .. }));
        assert_eq!(stub.send_hits(), 0);
    }
}
