use super::context::{Context, Handler, HandlerResult};
use crate::error::ModerationError;
use async_trait::async_trait;

/// `help [command]`: lists the commands the caller may use, or shows one.
pub struct HelpHandler;

#[async_trait]
impl Handler for HelpHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let registry = ctx.session.registry();
        let trigger = ctx.session.config().general.trigger;

        if let Some(name) = ctx.args.get(0) {
            let spec = registry
                .get(name)
                .ok_or_else(|| ModerationError::UnknownCommand(name.to_string()))?;
            return Ok(vec![ctx.reply(format!(
                "{}{} - {}",
                trigger, spec.usage, spec.summary
            ))]);
        }

        let mut replies = vec![ctx.reply("Commands:")];
        for name in registry.names() {
            let Some(spec) = registry.get(name) else {
                continue;
            };
            let allowed = spec
                .role
                .is_none_or(|role| ctx.account.as_ref().is_some_and(|a| a.has_role(role)));
            if allowed {
                replies.push(ctx.reply(format!("{}{} - {}", trigger, spec.usage, spec.summary)));
            }
        }
        Ok(replies)
    }
}
