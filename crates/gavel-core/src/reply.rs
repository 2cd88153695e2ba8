//! Outgoing reply shapes and the one place that renders them onto the chat
//! port. Markdown degradation on hostile payloads happens inside the port's
//! send path.

use anyhow::Result;

use crate::port::ChatPort;

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Markdown(String),
    /// Markdown sent without a notification (hidetag).
    SilentMarkdown(String),
    Photo {
        url: String,
        caption: Option<String>,
        markdown: bool,
    },
    PhotoPng {
        png: Vec<u8>,
        caption: Option<String>,
    },
    Voice {
        url: String,
    },
}

pub async fn send_reply(chat: &dyn ChatPort, chat_id: i64, reply: Reply) -> Result<()> {
    match reply {
        Reply::Text(text) => chat.send_text(chat_id, &text).await,
        Reply::Markdown(text) => chat.send_markdown(chat_id, &text, false).await,
        Reply::SilentMarkdown(text) => chat.send_markdown(chat_id, &text, true).await,
        Reply::Photo {
            url,
            caption,
            markdown,
        } => {
            chat.send_photo_url(chat_id, &url, caption.as_deref(), markdown)
                .await
        }
        Reply::PhotoPng { png, caption } => {
            chat.send_photo_png(chat_id, png, caption.as_deref()).await
        }
        Reply::Voice { url } => chat.send_voice_url(chat_id, &url).await,
    }
}
