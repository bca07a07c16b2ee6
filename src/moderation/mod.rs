//! Moderation decision engine.
//!
//! Pattern matching, infraction bookkeeping, escalation policy and the
//! permission gate. Nothing in here writes to the network: components return
//! [`Directive`]s and the session hands them to the protocol writer.

pub mod enforcement;
pub mod ledger;
pub mod matcher;
pub mod permission;
pub mod policy;

pub use enforcement::EnforcementEngine;
pub use ledger::InfractionLedger;
pub use matcher::BadwordMatcher;
pub use permission::{PermissionGate, Role, ScopeCheck};
pub use policy::PolicyStore;

use crate::network::irc_to_lower;

/// Unified side-effect type returned by the engine and command handlers.
///
/// These are the only protocol-level actions the core may request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// NOTICE to a user or channel.
    Notice { target: String, text: String },

    /// PRIVMSG to a user or channel.
    Message { target: String, text: String },

    /// Join a channel, optionally with a key.
    Join {
        channel: String,
        key: Option<String>,
    },

    /// Leave a channel.
    Part { channel: String },

    /// Change the warden's own nickname.
    Nick { nick: String },

    /// Rendered enforcer command (kick or timed ban) for the channel service.
    Enforce {
        enforcer: String,
        command: String,
        kind: EnforcementKind,
    },

    /// End the session.
    Quit { message: String },
}

impl Directive {
    /// Private notice helper.
    pub fn notice(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Notice {
            target: target.into(),
            text: text.into(),
        }
    }

    /// Message helper.
    pub fn message(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Message {
            target: target.into(),
            text: text.into(),
        }
    }
}

/// Which tier an [`Directive::Enforce`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementKind {
    Kick,
    Ban,
}

/// A connected actor: the stable `user@host` key plus the display nick.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub key: String,
    pub nick: String,
}

impl Identity {
    pub fn new(nick: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            nick: nick.into(),
        }
    }

    /// Parse a `nick!user@host` prefix. Server prefixes yield `None`.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        let (nick, key) = prefix.split_once('!')?;
        if nick.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self::new(nick, key))
    }
}

/// Canonical key for a channel name: trimmed and RFC 1459 case-folded.
pub fn channel_key(channel: &str) -> String {
    irc_to_lower(channel.trim())
}
