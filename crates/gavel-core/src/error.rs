//! Error taxonomy for the dispatch pipeline. Every variant renders to
//! exactly one user-facing reply; only upstream and internal faults are
//! logged.

use gavel_providers::ProviderError;
use thiserror::Error;

use crate::command::Capability;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("missing required argument")]
    Usage(&'static str),
    #[error("command used outside a group chat")]
    WrongChatKind,
    #[error("bot lacks the '{}' capability", .0.human_name())]
    MissingCapability(Capability),
    #[error("no reply target to {0}")]
    MissingTarget(&'static str),
    #[error("not found")]
    NotFound(String),
    #[error("upstream failure: {0}")]
    Upstream(#[source] anyhow::Error),
    #[error("internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

impl CommandError {
    /// The single reply the user sees for this failure.
    pub fn user_reply(&self) -> String {
        match self {
            CommandError::Usage(usage) => format!("❌ Usage: {}", usage),
            CommandError::WrongChatKind => "❌ This command works only in groups.".to_string(),
            CommandError::MissingCapability(capability) => format!(
                "❌ I need admin rights with the \"{}\" permission.",
                capability.human_name()
            ),
            CommandError::MissingTarget(action) => {
                format!("❌ Reply to a user to {}.", action)
            }
            CommandError::NotFound(reply) => reply.clone(),
            CommandError::Upstream(_) | CommandError::Internal(_) => {
                "❌ The request failed. Please try again later.".to_string()
            }
        }
    }

    /// Expected outcomes (usage hints, gate refusals, upstream misses) are
    /// not worth a log line; faults are.
    pub fn should_log(&self) -> bool {
        matches!(self, CommandError::Upstream(_) | CommandError::Internal(_))
    }
}

/// Maps a provider failure into the command taxonomy, with the reply to use
/// when the provider says the resource does not exist.
pub fn provider_err(not_found_reply: &'static str) -> impl Fn(ProviderError) -> CommandError {
    move |err| match err {
        ProviderError::NotFound => CommandError::NotFound(not_found_reply.to_string()),
        other => CommandError::Upstream(anyhow::Error::new(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_capability_reply_names_the_flag() {
        let reply = CommandError::MissingCapability(Capability::RestrictMembers).user_reply();
        assert!(reply.contains("restrict members"));
        let reply = CommandError::MissingCapability(Capability::InviteUsers).user_reply();
        assert!(reply.contains("invite users"));
    }

    #[test]
    fn not_found_reply_differs_from_upstream_reply() {
        let not_found = provider_err("❌ Word not found.")(ProviderError::NotFound).user_reply();
        let upstream =
            provider_err("❌ Word not found.")(ProviderError::Network("timeout".to_string()))
                .user_reply();
        assert_ne!(not_found, upstream);
        assert_eq!(not_found, "❌ Word not found.");
    }

    #[test]
    fn only_faults_are_logged() {
        assert!(!CommandError::Usage(".say <text>").should_log());
        assert!(!CommandError::WrongChatKind.should_log());
        assert!(!CommandError::NotFound("x".to_string()).should_log());
        assert!(CommandError::Upstream(anyhow::anyhow!("boom")).should_log());
        assert!(CommandError::Internal(anyhow::anyhow!("boom")).should_log());
    }
}
