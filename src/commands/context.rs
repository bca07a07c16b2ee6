//! Command handler context and core types.

use super::Args;
use crate::db::Account;
use crate::error::{ModerationError, ModerationResult};
use crate::moderation::{Directive, Identity};
use crate::session::Session;
use async_trait::async_trait;

/// Result of a command handler: the directives to emit on success.
pub type HandlerResult = ModerationResult<Vec<Directive>>;

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// Shared warden state.
    pub session: &'a Session,
    /// Who sent the command.
    pub caller: &'a Identity,
    /// The caller's account. Always set for role-gated commands.
    pub account: Option<Account>,
    pub args: &'a Args,
    /// Usage line of the command being run, without the trigger.
    pub usage: &'static str,
}

impl Context<'_> {
    /// Private notice to the caller.
    pub fn reply(&self, text: impl Into<String>) -> Directive {
        Directive::notice(self.caller.nick.clone(), text)
    }

    /// The authorized account, for handlers that act on its behalf.
    pub fn actor(&self) -> ModerationResult<&Account> {
        self.account.as_ref().ok_or(ModerationError::PermissionDenied)
    }

    pub fn arg(&self, index: usize) -> ModerationResult<&str> {
        self.args.require(index, self.usage)
    }

    pub fn rest(&self, index: usize) -> ModerationResult<String> {
        self.args.require_rest(index, self.usage)
    }
}

/// Trait implemented by all command handlers.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult;
}
