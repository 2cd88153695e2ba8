//! Chat platform port: the only operations the core needs from the host
//! platform, behind one trait so the dispatch pipeline can be exercised
//! against a recording fake.

use anyhow::Result;
use async_trait::async_trait;
use gavel_telegram::{AdminRights, MemberPermissions, TelegramApi};

use crate::command::Capability;

/// One entry of the chat's administrator listing.
#[derive(Debug, Clone)]
pub struct AdminEntry {
    pub user_id: i64,
    pub display_name: String,
    pub username: Option<String>,
    pub is_bot: bool,
}

/// The bot's own capability flags in a chat. Fetched fresh per invocation;
/// a stale snapshot must never make an unauthorized mutation look authorized.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilitySnapshot {
    pub can_restrict_members: bool,
    pub can_promote_members: bool,
    pub can_invite_users: bool,
}

impl CapabilitySnapshot {
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::RestrictMembers => self.can_restrict_members,
            Capability::PromoteMembers => self.can_promote_members,
            Capability::InviteUsers => self.can_invite_users,
        }
    }
}

#[async_trait]
pub trait ChatPort: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;
    async fn send_markdown(&self, chat_id: i64, text: &str, silent: bool) -> Result<()>;
    async fn send_photo_url(
        &self,
        chat_id: i64,
        url: &str,
        caption: Option<&str>,
        markdown: bool,
    ) -> Result<()>;
    async fn send_photo_png(&self, chat_id: i64, png: Vec<u8>, caption: Option<&str>)
        -> Result<()>;
    async fn send_voice_url(&self, chat_id: i64, url: &str) -> Result<()>;

    async fn administrators(&self, chat_id: i64) -> Result<Vec<AdminEntry>>;
    async fn bot_capabilities(&self, chat_id: i64) -> Result<CapabilitySnapshot>;

    async fn grant_admin(&self, chat_id: i64, user_id: i64) -> Result<()>;
    async fn revoke_admin(&self, chat_id: i64, user_id: i64) -> Result<()>;
    async fn restrict(&self, chat_id: i64, user_id: i64, until_unix: Option<i64>) -> Result<()>;
    async fn unrestrict(&self, chat_id: i64, user_id: i64) -> Result<()>;
    async fn ban(&self, chat_id: i64, user_id: i64) -> Result<()>;
    async fn unban(&self, chat_id: i64, user_id: i64) -> Result<()>;
    async fn invite_link(&self, chat_id: i64) -> Result<String>;
}

/// Production port over the Telegram Bot API.
pub struct TelegramChatPort {
    api: TelegramApi,
    bot_id: i64,
}

impl TelegramChatPort {
    pub fn new(api: TelegramApi, bot_id: i64) -> Self {
        Self { api, bot_id }
    }
}

#[async_trait]
impl ChatPort for TelegramChatPort {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.api.send_message(chat_id, text, false).await
    }

    async fn send_markdown(&self, chat_id: i64, text: &str, silent: bool) -> Result<()> {
        self.api.send_message_opts(chat_id, text, true, silent).await
    }

    async fn send_photo_url(
        &self,
        chat_id: i64,
        url: &str,
        caption: Option<&str>,
        markdown: bool,
    ) -> Result<()> {
        self.api.send_photo_url(chat_id, url, caption, markdown).await
    }

    async fn send_photo_png(
        &self,
        chat_id: i64,
        png: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()> {
        self.api.send_photo_bytes(chat_id, png, caption).await
    }

    async fn send_voice_url(&self, chat_id: i64, url: &str) -> Result<()> {
        self.api.send_voice_url(chat_id, url).await
    }

    async fn administrators(&self, chat_id: i64) -> Result<Vec<AdminEntry>> {
        let admins = self.api.get_chat_administrators(chat_id).await?;
        Ok(admins
            .into_iter()
            .map(|admin| AdminEntry {
                user_id: admin.user.id,
                display_name: admin.user.display_name(),
                username: admin.user.username.clone(),
                is_bot: admin.user.is_bot,
            })
            .collect())
    }

    async fn bot_capabilities(&self, chat_id: i64) -> Result<CapabilitySnapshot> {
        let record = self.api.get_chat_member(chat_id, self.bot_id).await?;
        Ok(CapabilitySnapshot {
            can_restrict_members: record.can_restrict_members,
            can_promote_members: record.can_promote_members,
            can_invite_users: record.can_invite_users,
        })
    }

    async fn grant_admin(&self, chat_id: i64, user_id: i64) -> Result<()> {
        self.api
            .promote_chat_member(chat_id, user_id, AdminRights::standard())
            .await
    }

    async fn revoke_admin(&self, chat_id: i64, user_id: i64) -> Result<()> {
        self.api
            .promote_chat_member(chat_id, user_id, AdminRights::none())
            .await
    }

    async fn restrict(&self, chat_id: i64, user_id: i64, until_unix: Option<i64>) -> Result<()> {
        self.api
            .restrict_chat_member(chat_id, user_id, MemberPermissions::muted(), until_unix)
            .await
    }

    async fn unrestrict(&self, chat_id: i64, user_id: i64) -> Result<()> {
        self.api
            .restrict_chat_member(chat_id, user_id, MemberPermissions::unrestricted(), None)
            .await
    }

    async fn ban(&self, chat_id: i64, user_id: i64) -> Result<()> {
        self.api.ban_chat_member(chat_id, user_id).await
    }

    async fn unban(&self, chat_id: i64, user_id: i64) -> Result<()> {
        self.api.unban_chat_member(chat_id, user_id).await
    }

    async fn invite_link(&self, chat_id: i64) -> Result<String> {
        self.api.export_chat_invite_link(chat_id).await
    }
}
