//! Gavel Core
//!
//! Command dispatch and permission-gating core of the bot: the chat context
//! adapter, the sealed command registry, the capability gate that runs before
//! any group mutation, the provider-backed handlers, and the webhook server
//! whose top-level boundary always acknowledges the transport.

pub mod command;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod port;
pub mod qr;
pub mod reply;
pub mod server;
pub mod target;

pub use command::{Capability, Command};
pub use context::{ChatContext, ChatKind, CommandInvocation, TargetMember};
pub use dispatch::Dispatcher;
pub use error::CommandError;
pub use port::{AdminEntry, CapabilitySnapshot, ChatPort, TelegramChatPort};
pub use reply::Reply;
