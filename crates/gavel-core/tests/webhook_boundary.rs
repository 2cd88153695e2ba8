//! The ingress must acknowledge every request with 200: garbage payloads,
//! handler errors, even handler panics. A non-200 would make the platform
//! redeliver the same update indefinitely.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use gavel_config::ProviderKeys;
use gavel_core::{ChatPort, Dispatcher};
use gavel_providers::Providers;

struct PanickingChat;

#[async_trait]
impl ChatPort for PanickingChat {
    async fn send_text(&self, _chat_id: i64, _text: &str) -> Result<()> {
        panic!("send_text");
    }

    async fn send_markdown(&self, _chat_id: i64, _text: &str, _silent: bool) -> Result<()> {
        panic!("send_markdown");
    }

    async fn send_photo_url(
        &self,
        _chat_id: i64,
        _url: &str,
        _caption: Option<&str>,
        _markdown: bool,
    ) -> Result<()> {
        panic!("send_photo_url");
    }

    async fn send_photo_png(
        &self,
        _chat_id: i64,
        _png: Vec<u8>,
        _caption: Option<&str>,
    ) -> Result<()> {
        panic!("send_photo_png");
    }

    async fn send_voice_url(&self, _chat_id: i64, _url: &str) -> Result<()> {
        panic!("send_voice_url");
    }

    async fn administrators(&self, _chat_id: i64) -> Result<Vec<gavel_core::AdminEntry>> {
        panic!("administrators");
    }

    async fn bot_capabilities(&self, _chat_id: i64) -> Result<gavel_core::CapabilitySnapshot> {
        panic!("bot_capabilities");
    }

    async fn grant_admin(&self, _chat_id: i64, _user_id: i64) -> Result<()> {
        panic!("grant_admin");
    }

    async fn revoke_admin(&self, _chat_id: i64, _user_id: i64) -> Result<()> {
        panic!("revoke_admin");
    }

    async fn restrict(&self, _chat_id: i64, _user_id: i64, _until_unix: Option<i64>) -> Result<()> {
        panic!("restrict");
    }

    async fn unrestrict(&self, _chat_id: i64, _user_id: i64) -> Result<()> {
        panic!("unrestrict");
    }

    async fn ban(&self, _chat_id: i64, _user_id: i64) -> Result<()> {
        panic!("ban");
    }

    async fn unban(&self, _chat_id: i64, _user_id: i64) -> Result<()> {
        panic!("unban");
    }

    async fn invite_link(&self, _chat_id: i64) -> Result<String> {
        panic!("invite_link");
    }
}

async fn spawn_server() -> String {
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(PanickingChat),
        Arc::new(Providers::new(ProviderKeys::default())),
    ));
    let app = gavel_core::server::router(dispatcher, "/webhook");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}/webhook", addr)
}

#[tokio::test]
async fn garbage_payload_is_acknowledged_with_200() {
    let url = spawn_server().await;
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .body("this is not json")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn handler_panic_never_escapes_the_boundary() {
    let url = spawn_server().await;
    let client = reqwest::Client::new();
    let update = serde_json::json!({
        "update_id": 1,
        "message": {
            "message_id": 5,
            "text": ".menu",
            "chat": { "id": 12, "type": "private" },
            "from": { "id": 7, "first_name": "Ada" }
        }
    });

    let response = client
        .post(&url)
        .json(&update)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);

    // The server must still be alive for the next delivery.
    let response = client
        .post(&url)
        .json(&update)
        .send()
        .await
        .expect("second request");
    assert_eq!(response.status(), 200);
}
