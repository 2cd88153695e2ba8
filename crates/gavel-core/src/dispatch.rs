//! Dispatch pipeline: parse the inbound text, look the token up in the
//! sealed registry, run the handler, and send exactly one reply. Failures
//! inside a handler never escape; they render to their terminal reply here.

use std::sync::Arc;

use gavel_providers::Providers;
use gavel_telegram::TelegramUpdate;
use tracing::{debug, error};

use crate::command::Command;
use crate::context::{ChatContext, CommandInvocation};
use crate::handlers;
use crate::port::ChatPort;
use crate::reply::{send_reply, Reply};

pub struct Dispatcher {
    chat: Arc<dyn ChatPort>,
    providers: Arc<Providers>,
}

impl Dispatcher {
    pub fn new(chat: Arc<dyn ChatPort>, providers: Arc<Providers>) -> Self {
        Self { chat, providers }
    }

    /// Entry point for a webhook update. Updates without a text message are
    /// dropped silently.
    pub async fn handle_update(&self, update: &TelegramUpdate) {
        let Some(ctx) = ChatContext::from_update(update) else {
            debug!(update_id = update.update_id, "update carries no text, skipping");
            return;
        };
        self.handle(&ctx).await;
    }

    pub async fn handle(&self, ctx: &ChatContext) {
        let reply = self.dispatch(ctx).await;
        if let Err(err) = send_reply(self.chat.as_ref(), ctx.chat_id, reply).await {
            error!(chat_id = ctx.chat_id, error = %err, "failed to send reply");
        }
    }

    async fn dispatch(&self, ctx: &ChatContext) -> Reply {
        let Some(invocation) = CommandInvocation::parse(&ctx.text) else {
            return Reply::Text(format!("You said: {}", ctx.text));
        };
        let Some(command) = Command::from_token(&invocation.token) else {
            return Reply::Text(format!(
                "❌ Command {} is not implemented.",
                invocation.token
            ));
        };

        debug!(command = command.token(), chat_id = ctx.chat_id, "dispatching");
        match handlers::run(command, self.chat.as_ref(), &self.providers, ctx, &invocation).await {
            Ok(reply) => reply,
            Err(err) => {
                if err.should_log() {
                    error!(command = command.token(), error = ?err, "command failed");
                }
                Reply::Text(err.user_reply())
            }
        }
    }
}
