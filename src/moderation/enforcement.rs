//! Escalating enforcement.
//!
//! Per identity the state is just the `(warn_count, kick_count)` pair. On
//! every blocklist hit exactly one tier fires, checked in this order:
//!
//! 1. **kick** if kicks are enabled and this offense brings the warnings to
//!    `warn_to_kick`: warnings reset, kicks go up by one.
//! 2. **ban** if bans are enabled and the identity already has
//!    `kick_to_ban` kicks: both counters reset.
//! 3. **warn** otherwise: warnings go up by one.
//!
//! Since the kick check runs first, a single message never escalates from a
//! warning straight to a ban.

use crate::db::{ChannelPolicy, InfractionRecord};
use crate::error::ModerationResult;
use crate::moderation::{
    BadwordMatcher, Directive, EnforcementKind, Identity, InfractionLedger, PolicyStore,
};
use std::sync::Arc;
use tracing::info;

/// What a single blocklist hit resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Warned; carries the new warning count.
    Warned(u32),
    Kicked,
    Banned,
}

/// Result of [`EnforcementEngine::handle`].
#[derive(Debug, Clone)]
pub struct Enforcement {
    pub outcome: Outcome,
    /// Counters as persisted after the decision.
    pub record: InfractionRecord,
    pub directives: Vec<Directive>,
}

/// Turns blocklist hits into ledger updates and directives.
pub struct EnforcementEngine {
    matcher: Arc<BadwordMatcher>,
    ledger: Arc<InfractionLedger>,
    policies: Arc<PolicyStore>,
}

impl EnforcementEngine {
    pub fn new(
        matcher: Arc<BadwordMatcher>,
        ledger: Arc<InfractionLedger>,
        policies: Arc<PolicyStore>,
    ) -> Self {
        Self {
            matcher,
            ledger,
            policies,
        }
    }

    /// Check a channel message and enforce on a hit.
    ///
    /// Returns `None` when the message is clean.
    pub async fn on_message(
        &self,
        identity: &Identity,
        channel: &str,
        text: &str,
    ) -> ModerationResult<Option<Enforcement>> {
        if !self.matcher.check(channel, text).await? {
            return Ok(None);
        }
        self.handle(identity, channel).await.map(Some)
    }

    /// Record one offense by `identity` in `channel` and decide the response.
    ///
    /// The channel must have a policy; a miss is reported as
    /// `PolicyMissing` and leaves the ledger untouched.
    pub async fn handle(&self, identity: &Identity, channel: &str) -> ModerationResult<Enforcement> {
        let policy = self.policies.require(channel).await?;

        let (record, outcome) = self
            .ledger
            .update(&identity.key, |record| decide(&policy, record))
            .await?;

        info!(
            channel = %policy.channel,
            nick = %identity.nick,
            identity = %identity.key,
            outcome = ?outcome,
            warns = record.warn_count,
            kicks = record.kick_count,
            "blocklist enforcement"
        );

        let directives = vec![directive_for(&policy, identity, outcome)];
        Ok(Enforcement {
            outcome,
            record,
            directives,
        })
    }
}

/// Apply the escalation rules to a record in place.
pub fn decide(policy: &ChannelPolicy, record: &mut InfractionRecord) -> Outcome {
    if policy.kick_enabled && record.warn_count.saturating_add(1) >= policy.warn_to_kick {
        record.warn_count = 0;
        record.kick_count = record.kick_count.saturating_add(1);
        Outcome::Kicked
    } else if policy.ban_enabled && record.kick_count >= policy.kick_to_ban {
        record.warn_count = 0;
        record.kick_count = 0;
        Outcome::Banned
    } else {
        record.warn_count = record.warn_count.saturating_add(1);
        Outcome::Warned(record.warn_count)
    }
}

fn directive_for(policy: &ChannelPolicy, identity: &Identity, outcome: Outcome) -> Directive {
    match outcome {
        Outcome::Kicked => Directive::Enforce {
            enforcer: policy.enforcer.clone(),
            command: render_template(
                &policy.kick_template,
                &policy.channel,
                &identity.nick,
                &policy.kick_reason,
                None,
            ),
            kind: EnforcementKind::Kick,
        },
        Outcome::Banned => Directive::Enforce {
            enforcer: policy.enforcer.clone(),
            command: render_template(
                &policy.ban_template,
                &policy.channel,
                &identity.nick,
                &policy.ban_reason,
                Some(policy.ban_duration),
            ),
            kind: EnforcementKind::Ban,
        },
        Outcome::Warned(count) => {
            let text = format!(
                "{}, watch your language in {}! (warning {})",
                identity.nick, policy.channel, count
            );
            if policy.private_notify {
                Directive::notice(identity.nick.clone(), text)
            } else {
                Directive::message(policy.channel.clone(), text)
            }
        }
    }
}

/// Fill `{channel}`, `{user}`, `{reason}` and `{bantime}` in one pass, so
/// substituted values are never expanded again. Unknown placeholders are
/// kept verbatim; `{bantime}` is left alone when `bantime` is `None`.
pub fn render_template(
    template: &str,
    channel: &str,
    user: &str,
    reason: &str,
    bantime: Option<u64>,
) -> String {
    let mut out = String::with_capacity(template.len() + user.len() + reason.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let Some(end) = after.find(['{', '}']) else {
            // Unclosed brace: the remainder is literal
            out.push('{');
            out.push_str(after);
            rest = "";
            break;
        };

        if after[end..].starts_with('{') {
            // `{x{user}`: the outer brace is literal, the inner one may open a placeholder
            out.push('{');
            out.push_str(&after[..end]);
            rest = &after[end..];
            continue;
        }

        match &after[..end] {
            "channel" => out.push_str(channel),
            "user" => out.push_str(user),
            "reason" => out.push_str(reason),
            "bantime" => match bantime {
                Some(secs) => out.push_str(&secs.to_string()),
                None => out.push_str("{bantime}"),
            },
            name => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
