//! Gavel Telegram Adapter
//!
//! Raw Telegram Bot API client: webhook update envelope types, message
//! sending with Markdown fallback and chunking, and the group-management
//! calls (admin listing, member capability records, promotion, restriction,
//! ban/unban, invite link export).

use anyhow::{anyhow, Result};
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

// ------------------------------------------------------------------
// Update envelope
// ------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    #[serde(default)]
    pub text: Option<String>,
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub reply_to_message: Option<Box<TelegramReplyToMessage>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl TelegramUser {
    /// First plus last name, or the username, or the bare id.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            _ => self
                .username
                .clone()
                .unwrap_or_else(|| self.id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramReplyToMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<TelegramUser>,
}

// ------------------------------------------------------------------
// Management call results
// ------------------------------------------------------------------

/// One entry of a `getChatAdministrators` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAdministrator {
    pub user: TelegramUser,
    pub status: String,
}

/// A member's capability record as returned by `getChatMember`. For the
/// bot's own record these flags gate every group mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMemberRecord {
    pub status: Option<String>,
    #[serde(default)]
    pub can_restrict_members: bool,
    #[serde(default)]
    pub can_promote_members: bool,
    #[serde(default)]
    pub can_invite_users: bool,
}

/// Admin rights grant for `promoteChatMember`. All-false clears the grant
/// (demotion).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdminRights {
    pub can_change_info: bool,
    pub can_delete_messages: bool,
    pub can_invite_users: bool,
    pub can_restrict_members: bool,
    pub can_pin_messages: bool,
    pub can_promote_members: bool,
}

impl AdminRights {
    /// The default grant for a promotion: everything except the right to
    /// promote others.
    pub fn standard() -> Self {
        Self {
            can_change_info: true,
            can_delete_messages: true,
            can_invite_users: true,
            can_restrict_members: true,
            can_pin_messages: true,
            can_promote_members: false,
        }
    }

    pub fn none() -> Self {
        Self {
            can_change_info: false,
            can_delete_messages: false,
            can_invite_users: false,
            can_restrict_members: false,
            can_pin_messages: false,
            can_promote_members: false,
        }
    }
}

/// Send-permission set for `restrictChatMember`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MemberPermissions {
    pub can_send_messages: bool,
    pub can_send_media_messages: bool,
    pub can_send_polls: bool,
    pub can_send_other_messages: bool,
    pub can_add_web_page_previews: bool,
}

impl MemberPermissions {
    pub fn muted() -> Self {
        Self {
            can_send_messages: false,
            can_send_media_messages: false,
            can_send_polls: false,
            can_send_other_messages: false,
            can_add_web_page_previews: false,
        }
    }

    pub fn unrestricted() -> Self {
        Self {
            can_send_messages: true,
            can_send_media_messages: true,
            can_send_polls: true,
            can_send_other_messages: true,
            can_add_web_page_previews: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

// ------------------------------------------------------------------
// Client
// ------------------------------------------------------------------

pub struct TelegramApi {
    client: Client,
    api_url: String,
}

impl TelegramApi {
    pub fn new(bot_token: &str) -> Self {
        Self {
            client: Self::build_client(),
            api_url: format!("https://api.telegram.org/bot{}", bot_token),
        }
    }

    /// Point the client at a different base URL (tests).
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    fn build_client() -> Client {
        ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(600))
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Some(Duration::from_secs(30)))
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client")
    }

    /// Fetch the bot's own identity. Called once at startup; the id is what
    /// the permission gate queries the membership record for.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        self.call_expecting("getMe", serde_json::json!({})).await
    }

    // -------------------- outbound messages --------------------

    pub async fn send_message(&self, chat_id: i64, text: &str, markdown: bool) -> Result<()> {
        self.send_message_opts(chat_id, text, markdown, false).await
    }

    pub async fn send_message_opts(
        &self,
        chat_id: i64,
        text: &str,
        markdown: bool,
        silent: bool,
    ) -> Result<()> {
        let url = format!("{}/sendMessage", self.api_url);
        for chunk in chunk_message(text) {
            let mut payload = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });
            if markdown {
                payload["parse_mode"] = serde_json::json!("Markdown");
            }
            if silent {
                payload["disable_notification"] = serde_json::json!(true);
            }
            self.post_with_markdown_fallback(&url, payload).await?;
        }
        Ok(())
    }

    pub async fn send_photo_url(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
        markdown: bool,
    ) -> Result<()> {
        let url = format!("{}/sendPhoto", self.api_url);
        let mut payload = serde_json::json!({
            "chat_id": chat_id,
            "photo": photo_url,
        });
        if let Some(caption) = caption {
            payload["caption"] = serde_json::json!(caption);
            if markdown {
                payload["parse_mode"] = serde_json::json!("Markdown");
            }
        }
        self.post_with_markdown_fallback(&url, payload).await
    }

    /// Upload an in-process PNG as a photo (multipart).
    pub async fn send_photo_bytes(
        &self,
        chat_id: i64,
        png: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()> {
        let url = format!("{}/sendPhoto", self.api_url);
        let part = reqwest::multipart::Part::bytes(png)
            .file_name("photo.png")
            .mime_str("image/png")?;
        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }
        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| anyhow!("telegram sendPhoto upload failed: {}", e))?;
        Self::check_empty_response(resp, "sendPhoto").await
    }

    pub async fn send_voice_url(&self, chat_id: i64, voice_url: &str) -> Result<()> {
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "voice": voice_url,
        });
        let url = format!("{}/sendVoice", self.api_url);
        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| anyhow!("telegram sendVoice request failed: {}", e))?;
        Self::check_empty_response(resp, "sendVoice").await
    }

    // -------------------- group management --------------------

    pub async fn get_chat_administrators(&self, chat_id: i64) -> Result<Vec<ChatAdministrator>> {
        self.call_expecting(
            "getChatAdministrators",
            serde_json::json!({ "chat_id": chat_id }),
        )
        .await
    }

    pub async fn get_chat_member(&self, chat_id: i64, user_id: i64) -> Result<ChatMemberRecord> {
        self.call_expecting(
            "getChatMember",
            serde_json::json!({ "chat_id": chat_id, "user_id": user_id }),
        )
        .await
    }

    pub async fn promote_chat_member(
        &self,
        chat_id: i64,
        user_id: i64,
        rights: AdminRights,
    ) -> Result<()> {
        let serde_json::Value::Object(mut payload) = serde_json::to_value(rights)? else {
            return Err(anyhow!("promoteChatMember rights did not serialize to an object"));
        };
        payload.insert("chat_id".to_string(), serde_json::json!(chat_id));
        payload.insert("user_id".to_string(), serde_json::json!(user_id));
        self.call_discarding("promoteChatMember", serde_json::Value::Object(payload))
            .await
    }

    pub async fn restrict_chat_member(
        &self,
        chat_id: i64,
        user_id: i64,
        permissions: MemberPermissions,
        until_date: Option<i64>,
    ) -> Result<()> {
        let mut payload = serde_json::json!({
            "chat_id": chat_id,
            "user_id": user_id,
            "permissions": permissions,
        });
        if let Some(until) = until_date {
            payload["until_date"] = serde_json::json!(until);
        }
        self.call_discarding("restrictChatMember", payload).await
    }

    pub async fn ban_chat_member(&self, chat_id: i64, user_id: i64) -> Result<()> {
        self.call_discarding(
            "banChatMember",
            serde_json::json!({ "chat_id": chat_id, "user_id": user_id }),
        )
        .await
    }

    pub async fn unban_chat_member(&self, chat_id: i64, user_id: i64) -> Result<()> {
        self.call_discarding(
            "unbanChatMember",
            serde_json::json!({ "chat_id": chat_id, "user_id": user_id, "only_if_banned": true }),
        )
        .await
    }

    pub async fn export_chat_invite_link(&self, chat_id: i64) -> Result<String> {
        self.call_expecting(
            "exportChatInviteLink",
            serde_json::json!({ "chat_id": chat_id }),
        )
        .await
    }

    // -------------------- plumbing --------------------

    async fn call_expecting<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}/{}", self.api_url, method);
        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| anyhow!("telegram {} request failed: {}", method, e))?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();
        let parsed: ApiResponse<T> = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("telegram {} decode failed (HTTP {}): {}", method, status, e))?;
        if !parsed.ok {
            return Err(anyhow!(
                "telegram {} HTTP {}: {}",
                method,
                status,
                parsed.description.unwrap_or_else(|| "ok=false".to_string())
            ));
        }
        parsed
            .result
            .ok_or_else(|| anyhow!("telegram {} returned ok=true with no result", method))
    }

    async fn call_discarding(&self, method: &str, payload: serde_json::Value) -> Result<()> {
        let _: serde_json::Value = self.call_expecting(method, payload).await?;
        Ok(())
    }

    async fn check_empty_response(resp: reqwest::Response, method: &str) -> Result<()> {
        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();
        let parsed: ApiResponse<serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("telegram {} decode failed (HTTP {}): {}", method, status, e))?;
        if !parsed.ok {
            return Err(anyhow!(
                "telegram {} HTTP {}: {}",
                method,
                status,
                parsed.description.unwrap_or_else(|| "ok=false".to_string())
            ));
        }
        Ok(())
    }

    /// Send a payload that may carry `parse_mode`; when the platform rejects
    /// the formatted version, retry once without formatting so a payload that
    /// breaks Markdown rendering degrades to plain text instead of failing
    /// the whole reply.
    async fn post_with_markdown_fallback(
        &self,
        url: &str,
        payload: serde_json::Value,
    ) -> Result<()> {
        let endpoint = url.rsplit('/').next().unwrap_or("telegram");
        let has_parse_mode = payload.get("parse_mode").is_some();

        let first = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| anyhow!("telegram {} request failed: {}", endpoint, e))?;

        let status = first.status();
        let raw = first.text().await.unwrap_or_default();
        if status.is_success() {
            if let Ok(parsed) = serde_json::from_str::<ApiResponse<serde_json::Value>>(&raw) {
                if parsed.ok {
                    return Ok(());
                }
            }
        }

        if !has_parse_mode {
            return Err(anyhow!("telegram {} HTTP {}: {}", endpoint, status, raw));
        }

        warn!(
            "telegram {} rejected Markdown payload (HTTP {}), retrying as plain text",
            endpoint, status
        );

        let mut fallback = payload;
        if let Some(obj) = fallback.as_object_mut() {
            obj.remove("parse_mode");
        }

        let second = self
            .client
            .post(url)
            .json(&fallback)
            .send()
            .await
            .map_err(|e| anyhow!("telegram {} fallback request failed: {}", endpoint, e))?;

        let status = second.status();
        let raw = second.text().await.unwrap_or_default();
        let parsed: ApiResponse<serde_json::Value> = serde_json::from_str(&raw).map_err(|e| {
            anyhow!(
                "telegram {} fallback decode failed (HTTP {}): {}",
                endpoint,
                status,
                e
            )
        })?;
        if !parsed.ok {
            return Err(anyhow!(
                "telegram {} fallback HTTP {}: {}",
                endpoint,
                status,
                parsed.description.unwrap_or_else(|| "ok=false".to_string())
            ));
        }
        Ok(())
    }
}

/// Split a message at the Telegram length limit, preferring natural breaks.
fn chunk_message(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= TELEGRAM_MAX_MESSAGE_LEN {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let mut end = (start + TELEGRAM_MAX_MESSAGE_LEN).min(chars.len());

        if end < chars.len() {
            let mut split = end;
            for i in (start..end).rev() {
                let c = chars[i];
                if c == '\n' || c == ' ' || c == '.' || c == '!' || c == '?' {
                    split = i + 1;
                    break;
                }
            }
            if split > start {
                end = split;
            }
        }

        chunks.push(chars[start..end].iter().collect::<String>());
        start = end;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn chunk_message_preserves_content_for_unicode_text() {
        let text = format!("{} {}", "😀".repeat(5000), "fine");
        let chunks = chunk_message(&text);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chunk_message_respects_limit_by_characters() {
        let text = "abc😀".repeat(1500);
        let chunks = chunk_message(&text);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 4096));
    }

    #[test]
    fn update_envelope_deserializes_reply_target() {
        let update: TelegramUpdate = serde_json::from_value(serde_json::json!({
            "update_id": 7,
            "message": {
                "message_id": 2,
                "text": ".kick",
                "chat": { "id": -100, "type": "supergroup" },
                "from": { "id": 1, "first_name": "Ada" },
                "reply_to_message": {
                    "message_id": 1,
                    "from": { "id": 99, "first_name": "Mallory", "last_name": "M" }
                }
            }
        }))
        .expect("valid update");
        let message = update.message.expect("message present");
        let target = message.reply_to_message.expect("reply target");
        let user = target.from.expect("target sender");
        assert_eq!(user.id, 99);
        assert_eq!(user.display_name(), "Mallory M");
    }

    #[test]
    fn member_record_defaults_missing_flags_to_false() {
        let record: ChatMemberRecord = serde_json::from_value(serde_json::json!({
            "status": "administrator",
            "can_invite_users": true
        }))
        .expect("valid record");
        assert!(record.can_invite_users);
        assert!(!record.can_restrict_members);
        assert!(!record.can_promote_members);
    }

    #[tokio::test]
    async fn markdown_rejection_degrades_to_plain_text() {
        let mut server = mockito::Server::new_async().await;

        // Registered first: mockito dispatches to the earliest-registered mock
        // that still has expected hits remaining, so this one catches the
        // initial Markdown request; the plain mock below catches the fallback
        // request without parse_mode.
        let rejected = server
            .mock("POST", "/sendMessage")
            .match_body(Matcher::PartialJsonString(
                r#"{"parse_mode":"Markdown"}"#.to_string(),
            ))
            .with_status(400)
            .with_body(r#"{"ok":false,"description":"Bad Request: can't parse entities"}"#)
            .expect(1)
            .create_async()
            .await;

        let plain = server
            .mock("POST", "/sendMessage")
            .match_body(Matcher::PartialJsonString(r#"{"text":"_broken"}"#.to_string()))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{}}"#)
            .expect(1)
            .create_async()
            .await;

        let api = TelegramApi::new("123:token").with_api_url(server.url());
        api.send_message(5, "_broken", true)
            .await
            .expect("fallback send succeeds");

        rejected.assert_async().await;
        plain.assert_async().await;
    }

    #[tokio::test]
    async fn get_chat_member_parses_capability_record() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/getChatMember")
            .with_status(200)
            .with_body(
                r#"{"ok":true,"result":{"status":"administrator","can_restrict_members":true,"can_promote_members":false,"can_invite_users":true}}"#,
            )
            .create_async()
            .await;

        let api = TelegramApi::new("123:token").with_api_url(server.url());
        let record = api.get_chat_member(-100, 42).await.expect("record");
        assert!(record.can_restrict_members);
        assert!(!record.can_promote_members);
        assert!(record.can_invite_users);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn promotion_payload_carries_ids_and_rights_flags() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/promoteChatMember")
            .match_body(Matcher::PartialJsonString(
                r#"{"chat_id":-100,"user_id":42,"can_restrict_members":true,"can_promote_members":false}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":true}"#)
            .create_async()
            .await;

        let api = TelegramApi::new("123:token").with_api_url(server.url());
        api.promote_chat_member(-100, 42, AdminRights::standard())
            .await
            .expect("promotion succeeds");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_description_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/banChatMember")
            .with_status(400)
            .with_body(r#"{"ok":false,"description":"Bad Request: user is an administrator"}"#)
            .create_async()
            .await;

        let api = TelegramApi::new("123:token").with_api_url(server.url());
        let err = api.ban_chat_member(-100, 42).await.expect_err("must fail");
        assert!(err.to_string().contains("user is an administrator"));
    }
}
