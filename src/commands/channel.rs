//! Channel presence, blocklist and enforcement policy commands.

use super::context::{Context, Handler, HandlerResult};
use crate::error::ModerationError;
use crate::moderation::policy::{apply_setting, describe};
use crate::moderation::{Directive, channel_key};
use crate::network::is_channel_name;
use async_trait::async_trait;
use tracing::info;

/// The channel argument, checked for shape and case-folded.
fn channel_arg(ctx: &Context<'_>) -> Result<String, ModerationError> {
    let channel = ctx.arg(0)?;
    if !is_channel_name(channel) {
        return Err(ModerationError::InvalidArguments(ctx.usage.to_string()));
    }
    Ok(channel_key(channel))
}

fn no_policy(channel: &str) -> String {
    format!("No policy for {}.", channel)
}

pub struct JoinHandler;

#[async_trait]
impl Handler for JoinHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let channel = channel_arg(ctx)?;
        Ok(vec![Directive::Join {
            channel,
            key: ctx.args.get(1).map(str::to_string),
        }])
    }
}

pub struct PartHandler;

#[async_trait]
impl Handler for PartHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let channel = channel_arg(ctx)?;
        Ok(vec![Directive::Part { channel }])
    }
}

pub struct AddWordHandler;

#[async_trait]
impl Handler for AddWordHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let channel = channel_arg(ctx)?;
        let pattern = ctx.rest(1)?;

        ctx.session.matcher().add(&pattern, &channel).await?;

        info!(channel = %channel, pattern = %pattern, by = %ctx.caller.nick, "pattern blocked");
        Ok(vec![ctx.reply(format!("Blocked {} in {}.", pattern, channel))])
    }
}

pub struct DelWordHandler;

#[async_trait]
impl Handler for DelWordHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let channel = channel_arg(ctx)?;
        let pattern = ctx.rest(1)?;

        let removed = ctx.session.matcher().delete(&pattern, &channel).await?;
        if removed == 0 {
            return Ok(vec![ctx.reply(format!(
                "{} is not blocked in {}.",
                pattern, channel
            ))]);
        }

        info!(channel = %channel, pattern = %pattern, by = %ctx.caller.nick, "pattern unblocked");
        Ok(vec![ctx.reply(format!("Unblocked {} in {}.", pattern, channel))])
    }
}

pub struct WordsHandler;

#[async_trait]
impl Handler for WordsHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let channel = channel_arg(ctx)?;
        let entries = ctx.session.matcher().list(&channel).await?;

        if entries.is_empty() {
            return Ok(vec![ctx.reply(format!("No patterns are blocked in {}.", channel))]);
        }

        let mut replies = Vec::with_capacity(entries.len() + 1);
        replies.push(ctx.reply(format!("Blocked in {}:", channel)));
        replies.extend(entries.iter().map(|e| ctx.reply(e.pattern.clone())));
        Ok(replies)
    }
}

pub struct PolicyHandler;

#[async_trait]
impl Handler for PolicyHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let channel = channel_arg(ctx)?;
        let Some(policy) = ctx.session.policies().get(&channel).await? else {
            return Ok(vec![ctx.reply(no_policy(&channel))]);
        };

        let mut replies = vec![ctx.reply(format!("Policy for {}:", channel))];
        replies.extend(describe(&policy).into_iter().map(|line| ctx.reply(line)));
        Ok(replies)
    }
}

pub struct SetHandler;

#[async_trait]
impl Handler for SetHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let channel = channel_arg(ctx)?;
        let key = ctx.arg(1)?;
        let value = ctx.rest(2)?;

        let updated = ctx
            .session
            .policies()
            .update(&channel, |policy| apply_setting(policy, key, &value))
            .await;
        match updated {
            Ok(_) => {}
            Err(ModerationError::RecordNotFound(_)) => {
                return Ok(vec![ctx.reply(no_policy(&channel))]);
            }
            Err(e) => return Err(e),
        }

        info!(channel = %channel, key = %key, value = %value, by = %ctx.caller.nick, "policy setting changed");
        Ok(vec![ctx.reply(format!("{} set to {} in {}.", key, value, channel))])
    }
}

pub struct PardonHandler;

#[async_trait]
impl Handler for PardonHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let channel = channel_arg(ctx)?;
        let identity = ctx.arg(1)?;

        ctx.session.ledger().pardon(identity).await?;

        info!(channel = %channel, identity = %identity, by = %ctx.caller.nick, "infractions pardoned");
        Ok(vec![ctx.reply(format!("Pardoned {}.", identity))])
    }
}
