//! Warden control and privilege management.

use super::context::{Context, Handler, HandlerResult};
use crate::db::Account;
use crate::error::{ModerationError, ModerationResult};
use crate::moderation::{Directive, Role, channel_key};
use crate::network::is_channel_name;
use async_trait::async_trait;
use tracing::info;

pub struct MsgHandler;

#[async_trait]
impl Handler for MsgHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let target = ctx.arg(0)?;
        let text = ctx.rest(1)?;
        Ok(vec![Directive::message(target, text)])
    }
}

pub struct NickHandler;

#[async_trait]
impl Handler for NickHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let nick = ctx.arg(0)?;
        Ok(vec![Directive::Nick {
            nick: nick.to_string(),
        }])
    }
}

pub struct QuitHandler;

#[async_trait]
impl Handler for QuitHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        info!(by = %ctx.caller.nick, "shutdown requested");
        Ok(vec![Directive::Quit {
            message: "Shutting down.".to_string(),
        }])
    }
}

/// How a role command changes the target's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleUpdate {
    /// Raise to at least this role.
    Grant(Role),
    /// Drop this role and every role above it.
    Revoke(Role),
}

impl RoleUpdate {
    pub fn apply(self, current: Role) -> Role {
        match self {
            RoleUpdate::Grant(role) => current.max(role),
            RoleUpdate::Revoke(role) if current >= role => role.revoked(),
            RoleUpdate::Revoke(_) => current,
        }
    }
}

/// `op`, `deop`, `admin`, `deadmin`.
pub struct RoleHandler(pub RoleUpdate);

#[async_trait]
impl Handler for RoleHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let username = ctx.arg(0)?;
        let actor = ctx.actor()?;
        let accounts = ctx.session.db().accounts();

        let target = accounts
            .find_by_name(username)
            .await?
            .ok_or_else(|| ModerationError::RecordNotFound(username.to_string()))?;
        ensure_outranks(actor, &target)?;

        let level = self.0.apply(target.level);
        if level != target.level {
            accounts.set_level(&target.username, level).await?;
            info!(
                username = %target.username,
                from = %target.level,
                to = %level,
                by = %actor.username,
                "account level changed"
            );
        }

        Ok(vec![ctx.reply(format!("{} is now {}.", target.username, level))])
    }
}

/// `allow` and `disallow`.
pub struct AllowHandler {
    pub allow: bool,
}

#[async_trait]
impl Handler for AllowHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let username = ctx.arg(0)?;
        let scope = ctx.arg(1)?;
        let actor = ctx.actor()?;
        let accounts = ctx.session.db().accounts();

        let target = accounts
            .find_by_name(username)
            .await?
            .ok_or_else(|| ModerationError::RecordNotFound(username.to_string()))?;
        ensure_outranks(actor, &target)?;

        let reply = if scope == "*" {
            if actor.level != Role::Owner && !actor.all_channels {
                return Err(ModerationError::PermissionDenied);
            }
            accounts.set_all_channels(&target.username, self.allow).await?;

            if self.allow {
                format!("{} may now act on every channel.", target.username)
            } else {
                format!("{} may no longer act on every channel.", target.username)
            }
        } else {
            if !is_channel_name(scope) {
                return Err(ModerationError::InvalidArguments(ctx.usage.to_string()));
            }
            let channel = channel_key(scope);
            if actor.level != Role::Owner && !actor.covers_channel(&channel) {
                return Err(ModerationError::PermissionDenied);
            }

            if self.allow {
                accounts.add_channel(&target.username, &channel).await?;
                format!("{} may now act on {}.", target.username, channel)
            } else {
                accounts.remove_channel(&target.username, &channel).await?;
                format!("{} may no longer act on {}.", target.username, channel)
            }
        };

        info!(
            username = %target.username,
            scope = %scope,
            allow = self.allow,
            by = %actor.username,
            "channel scope changed"
        );
        Ok(vec![ctx.reply(reply)])
    }
}

/// Only accounts strictly below the actor may be changed; owners may change
/// anyone.
fn ensure_outranks(actor: &Account, target: &Account) -> ModerationResult<()> {
    if actor.level == Role::Owner || target.level < actor.level {
        Ok(())
    } else {
        Err(ModerationError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_never_lowers() {
        assert_eq!(RoleUpdate::Grant(Role::Op).apply(Role::User), Role::Op);
        assert_eq!(RoleUpdate::Grant(Role::Op).apply(Role::Admin), Role::Admin);
        assert_eq!(RoleUpdate::Grant(Role::Admin).apply(Role::Op), Role::Admin);
    }

    #[test]
    fn test_revoke_clears_whole_prefix() {
        assert_eq!(RoleUpdate::Revoke(Role::Op).apply(Role::Admin), Role::User);
        assert_eq!(RoleUpdate::Revoke(Role::Op).apply(Role::Op), Role::User);
        assert_eq!(RoleUpdate::Revoke(Role::Admin).apply(Role::Owner), Role::Op);
        assert_eq!(RoleUpdate::Revoke(Role::Admin).apply(Role::Op), Role::Op);
        assert_eq!(RoleUpdate::Revoke(Role::Op).apply(Role::User), Role::User);
    }
}
