//! Permission gate: both checks every mutating command must pass before it
//! touches group state. The capability snapshot is fetched fresh each time;
//! the check-then-act window is accepted and a platform refusal after a
//! passing check surfaces as an ordinary upstream failure.

use crate::command::Capability;
use crate::context::ChatContext;
use crate::error::CommandError;
use crate::port::{CapabilitySnapshot, ChatPort};

/// Chat-kind check alone, for group-only commands that need no capability.
pub fn ensure_group(ctx: &ChatContext) -> Result<(), CommandError> {
    if ctx.kind.is_group() {
        Ok(())
    } else {
        Err(CommandError::WrongChatKind)
    }
}

/// Chat-kind check, then a fresh capability fetch. Fails with the exact
/// missing flag so the reply can name it.
pub async fn authorize(
    chat: &dyn ChatPort,
    ctx: &ChatContext,
    capability: Capability,
) -> Result<CapabilitySnapshot, CommandError> {
    ensure_group(ctx)?;
    let snapshot = chat
        .bot_capabilities(ctx.chat_id)
        .await
        .map_err(CommandError::Upstream)?;
    if !snapshot.has(capability) {
        return Err(CommandError::MissingCapability(capability));
    }
    Ok(snapshot)
}
