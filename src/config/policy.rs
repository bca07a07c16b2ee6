//! Channel policy defaults.
//!
//! A `ChannelPolicy` row is created from these values the first time the
//! warden joins a channel. Later changes go through the `set` command.

use super::defaults::{
    default_ban_duration, default_ban_reason, default_ban_template, default_enforcer,
    default_kick_reason, default_kick_template, default_kick_to_ban, default_true,
    default_warn_to_kick,
};
use serde::Deserialize;

/// `[policy]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyDefaults {
    /// Warnings before a kick.
    #[serde(default = "default_warn_to_kick")]
    pub warn_to_kick: u32,
    /// Kicks before a timed ban.
    #[serde(default = "default_kick_to_ban")]
    pub kick_to_ban: u32,
    #[serde(default = "default_true")]
    pub kick_enabled: bool,
    #[serde(default)]
    pub ban_enabled: bool,
    /// Deliver warnings as a private NOTICE instead of to the channel.
    #[serde(default = "default_true")]
    pub private_notify: bool,
    /// Timed ban length in seconds.
    #[serde(default = "default_ban_duration")]
    pub ban_duration: u64,
    /// Enforcer command for kicks. Placeholders: `{channel}`, `{user}`, `{reason}`.
    #[serde(default = "default_kick_template")]
    pub kick_template: String,
    /// Enforcer command for bans. Adds `{bantime}`.
    #[serde(default = "default_ban_template")]
    pub ban_template: String,
    #[serde(default = "default_kick_reason")]
    pub kick_reason: String,
    #[serde(default = "default_ban_reason")]
    pub ban_reason: String,
    /// Service that receives enforcer commands.
    #[serde(default = "default_enforcer")]
    pub enforcer: String,
}

impl Default for PolicyDefaults {
    fn default() -> Self {
        Self {
            warn_to_kick: default_warn_to_kick(),
            kick_to_ban: default_kick_to_ban(),
            kick_enabled: true,
            ban_enabled: false,
            private_notify: true,
            ban_duration: default_ban_duration(),
            kick_template: default_kick_template(),
            ban_template: default_ban_template(),
            kick_reason: default_kick_reason(),
            ban_reason: default_ban_reason(),
            enforcer: default_enforcer(),
        }
    }
}
