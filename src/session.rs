//! Per-connection warden context.
//!
//! A [`Session`] owns every moderation component plus the outbound
//! directive queue, and is handed explicitly to command handlers. Protocol
//! events from the client land here; nothing in this module touches the
//! socket.

use crate::commands::{self, Registry};
use crate::config::Config;
use crate::db::Database;
use crate::error::ModerationError;
use crate::moderation::{
    BadwordMatcher, Directive, EnforcementEngine, Identity, InfractionLedger, PermissionGate,
    PolicyStore, channel_key,
};
use crate::network::is_channel_name;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Shared warden state for one connection lifetime.
pub struct Session {
    config: Config,
    db: Database,
    matcher: Arc<BadwordMatcher>,
    ledger: Arc<InfractionLedger>,
    policies: Arc<PolicyStore>,
    engine: EnforcementEngine,
    gate: PermissionGate,
    registry: Registry,
    outbound: mpsc::Sender<Directive>,
}

impl Session {
    pub fn new(config: Config, db: Database, outbound: mpsc::Sender<Directive>) -> Self {
        let matcher = Arc::new(BadwordMatcher::new(db.clone()));
        let ledger = Arc::new(InfractionLedger::new(db.clone()));
        let policies = Arc::new(PolicyStore::new(db.clone(), config.policy.clone()));
        let engine = EnforcementEngine::new(matcher.clone(), ledger.clone(), policies.clone());

        Self {
            gate: PermissionGate::new(db.clone()),
            registry: Registry::new(),
            config,
            db,
            matcher,
            ledger,
            policies,
            engine,
            outbound,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn matcher(&self) -> &BadwordMatcher {
        &self.matcher
    }

    pub fn ledger(&self) -> &InfractionLedger {
        &self.ledger
    }

    pub fn policies(&self) -> &PolicyStore {
        &self.policies
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Decide what to do about one PRIVMSG.
    ///
    /// Trigger-prefixed text is a command, wherever it was sent. Channel
    /// messages go through the blocklist unless they named a known command.
    /// Failures are logged and turned into notices by the command layer;
    /// enforcement failures are only logged.
    pub async fn handle_privmsg(&self, caller: &Identity, target: &str, text: &str) -> Vec<Directive> {
        let in_channel = is_channel_name(target);

        if let Some((name, args)) = commands::parse(text, self.config.general.trigger) {
            let known = self.registry.get(&name).is_some();
            let mut directives = self.registry.dispatch(self, caller, &name, &args).await;
            // Unknown trigger text in a channel is still ordinary channel text
            if !known && in_channel {
                directives.extend(self.check_message(caller, target, text).await);
            }
            return directives;
        }

        if !in_channel {
            return Vec::new();
        }

        self.check_message(caller, target, text).await
    }

    /// Blocklist check and enforcement for one channel message.
    async fn check_message(&self, caller: &Identity, target: &str, text: &str) -> Vec<Directive> {
        match self.engine.on_message(caller, target, text).await {
            Ok(Some(enforcement)) => enforcement.directives,
            Ok(None) => Vec::new(),
            Err(ModerationError::PolicyMissing(channel)) => {
                error!(channel = %channel, nick = %caller.nick, "message in a channel without policy dropped");
                Vec::new()
            }
            Err(e) => {
                warn!(channel = %target, nick = %caller.nick, error = %e, "blocklist check failed");
                Vec::new()
            }
        }
    }

    /// Run [`handle_privmsg`](Self::handle_privmsg) on the runtime and queue
    /// its directives, so a slow store never stalls protocol reads.
    pub fn spawn_privmsg(self: &Arc<Self>, caller: Identity, target: String, text: String) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let directives = session.handle_privmsg(&caller, &target, &text).await;
            session.emit(directives).await;
        });
    }

    /// Queue directives for the protocol writer.
    pub async fn emit(&self, directives: Vec<Directive>) {
        for directive in directives {
            if self.outbound.send(directive).await.is_err() {
                debug!("outbound queue closed; dropping directives");
                return;
            }
        }
    }

    /// The warden joined `channel`: make sure it has a policy.
    pub async fn on_joined(&self, channel: &str) {
        match self.policies.ensure(channel).await {
            Ok(policy) => info!(channel = %policy.channel, "joined channel"),
            Err(e) => error!(channel = %channel, error = %e, "could not initialize channel policy"),
        }
    }

    /// The warden was kicked: rejoin.
    pub fn on_kicked(&self, channel: &str, by: &str, reason: &str) -> Vec<Directive> {
        info!(channel = %channel, by = %by, reason = %reason, "kicked from channel; rejoining");
        vec![Directive::Join {
            channel: channel_key(channel),
            key: None,
        }]
    }

    /// `nick` left the network: log out whatever account it was bound to.
    pub async fn on_quit(&self, nick: &str) {
        match self.db.accounts().logout_nick(nick).await {
            Ok(usernames) => {
                for username in usernames {
                    info!(username = %username, nick = %nick, "account logged out on quit");
                }
            }
            Err(e) => warn!(nick = %nick, error = %e, "logout on quit failed"),
        }
    }

    /// Follow a nick change on the bound account.
    pub async fn on_nick(&self, old: &str, new: &str) {
        match self.db.accounts().rename_nick(old, new).await {
            Ok(0) => {}
            Ok(_) => info!(old = %old, new = %new, "account nick updated"),
            Err(e) => warn!(old = %old, new = %new, error = %e, "nick update failed"),
        }
    }
}
