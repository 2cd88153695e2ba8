//! Chat context adapter: normalizes an inbound update into the immutable
//! per-invocation context every downstream component reads.

use gavel_telegram::{TelegramMessage, TelegramUpdate};

/// Command prefixes accepted on inbound text. `/` is the platform's native
/// prefix; `.` is the style the menu advertises.
const COMMAND_PREFIXES: [char; 2] = ['.', '/'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn from_api(chat_type: &str) -> Self {
        match chat_type {
            "group" => ChatKind::Group,
            "supergroup" => ChatKind::Supergroup,
            "channel" => ChatKind::Channel,
            _ => ChatKind::Private,
        }
    }

    pub fn is_group(self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

#[derive(Debug, Clone)]
pub struct Sender {
    pub user_id: i64,
    pub display_name: String,
}

/// The member a mutating command acts upon, projected from the message the
/// command replies to.
#[derive(Debug, Clone)]
pub struct TargetMember {
    pub user_id: i64,
    pub display_name: String,
}

/// Immutable per-invocation view of the inbound message. Constructed once,
/// read by the dispatcher, the gate, the resolver, and the handlers.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub chat_id: i64,
    pub kind: ChatKind,
    pub sender: Option<Sender>,
    pub text: String,
    pub reply_to: Option<TargetMember>,
}

impl ChatContext {
    /// Build the context for a webhook update. Updates without a text message
    /// carry nothing to dispatch.
    pub fn from_update(update: &TelegramUpdate) -> Option<Self> {
        let message = update.message.as_ref()?;
        Self::from_message(message)
    }

    pub fn from_message(message: &TelegramMessage) -> Option<Self> {
        let text = message.text.clone()?;
        let sender = message.from.as_ref().map(|user| Sender {
            user_id: user.id,
            display_name: user.display_name(),
        });
        let reply_to = message
            .reply_to_message
            .as_ref()
            .and_then(|reply| reply.from.as_ref())
            .map(|user| TargetMember {
                user_id: user.id,
                display_name: user.display_name(),
            });
        Some(Self {
            chat_id: message.chat.id,
            kind: ChatKind::from_api(&message.chat.chat_type),
            sender,
            text,
            reply_to,
        })
    }
}

/// A recognized command line: the prefix-stripped token and the
/// whitespace-joined argument string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub token: String,
    pub args: String,
}

impl CommandInvocation {
    /// Returns `None` for plain text that carries no command prefix.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let first = trimmed.chars().next()?;
        if !COMMAND_PREFIXES.contains(&first) {
            return None;
        }

        let mut words = trimmed[first.len_utf8()..].split_whitespace();
        let raw_token = words.next()?;
        // The platform appends "@botname" to commands sent in groups.
        let token = raw_token
            .split_once('@')
            .map(|(token, _)| token)
            .unwrap_or(raw_token);
        if token.is_empty() {
            return None;
        }

        Some(Self {
            token: token.to_string(),
            args: words.collect::<Vec<_>>().join(" "),
        })
    }

    /// First whitespace-delimited argument, for commands that take a single
    /// word or URL.
    pub fn first_arg(&self) -> Option<&str> {
        self.args.split_whitespace().next()
    }
}
