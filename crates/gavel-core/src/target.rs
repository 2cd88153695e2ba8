//! Target resolver: pure projection of the reply target out of the chat
//! context. No network calls.

use crate::context::{ChatContext, TargetMember};
use crate::error::CommandError;

/// A target-requiring command must be issued as a reply to the member it
/// acts on. `action` is the verb for the usage hint.
pub fn resolve_target(
    ctx: &ChatContext,
    action: &'static str,
) -> Result<TargetMember, CommandError> {
    ctx.reply_to
        .clone()
        .ok_or(CommandError::MissingTarget(action))
}
