//! Self-service account commands: register, auth, remove.
//!
//! Credentials never produce distinct "no such user" and "wrong password"
//! replies.

use super::context::{Context, Handler, HandlerResult};
use crate::db::DbError;
use crate::error::ModerationError;
use crate::moderation::Role;
use async_trait::async_trait;
use tracing::info;

pub struct RegisterHandler;

#[async_trait]
impl Handler for RegisterHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let username = ctx.arg(0)?;
        let password = ctx.arg(1)?;

        let level = if ctx
            .session
            .config()
            .general
            .owners
            .iter()
            .any(|owner| owner.eq_ignore_ascii_case(username))
        {
            Role::Owner
        } else {
            Role::User
        };

        let account = ctx
            .session
            .db()
            .accounts()
            .register(
                username,
                password,
                Some(&ctx.caller.key),
                Some(&ctx.caller.nick),
                level,
            )
            .await
            .map_err(|e| match e {
                DbError::AccountExists(name) => ModerationError::DuplicateRegistration(name),
                e => e.into(),
            })?;

        // Owners act on every channel from the start
        if account.level == Role::Owner {
            ctx.session
                .db()
                .accounts()
                .set_all_channels(&account.username, true)
                .await?;
        }

        info!(
            username = %account.username,
            identity = %ctx.caller.key,
            level = %account.level,
            "account registered"
        );
        Ok(vec![ctx.reply("Your username is now registered.")])
    }
}

pub struct AuthHandler;

#[async_trait]
impl Handler for AuthHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let username = ctx.arg(0)?;
        let password = ctx.arg(1)?;
        let accounts = ctx.session.db().accounts();

        let account = match accounts.authenticate(username, password).await {
            Ok(account) => account,
            Err(DbError::AccountNotFound(_) | DbError::InvalidPassword) => {
                return Ok(vec![ctx.reply("I don't know you.")]);
            }
            Err(e) => return Err(e.into()),
        };

        accounts
            .bind_identity(account.id, &ctx.caller.key, &ctx.caller.nick)
            .await?;

        info!(
            username = %account.username,
            identity = %ctx.caller.key,
            roles = ?account.roles(),
            "account authenticated"
        );
        Ok(vec![ctx.reply("I recognize you.")])
    }
}

pub struct RemoveHandler;

#[async_trait]
impl Handler for RemoveHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let username = ctx.arg(0)?;
        let password = ctx.arg(1)?;

        match ctx.session.db().accounts().delete(username, password).await {
            Ok(()) => {
                info!(username = %username, by = %ctx.caller.nick, "account removed");
                Ok(vec![ctx.reply("Your account has been removed.")])
            }
            Err(DbError::AccountNotFound(_) | DbError::InvalidPassword) => {
                Ok(vec![ctx.reply("Your account could not be removed!")])
            }
            Err(e) => Err(e.into()),
        }
    }
}
