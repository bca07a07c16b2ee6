//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Network Defaults
// =============================================================================

pub fn default_port() -> u16 {
    6667
}

pub fn default_reconnect_max() -> u64 {
    300
}

// =============================================================================
// General Defaults
// =============================================================================

/// Seconds between outgoing lines.
pub fn default_linerate() -> f64 {
    1.0
}

pub fn default_trigger() -> char {
    '@'
}

pub fn default_outbound_queue() -> usize {
    256
}

pub fn default_database_path() -> String {
    "warden.db".to_string()
}

// =============================================================================
// Policy Defaults
// =============================================================================

pub fn default_warn_to_kick() -> u32 {
    3
}

pub fn default_kick_to_ban() -> u32 {
    3
}

pub fn default_ban_duration() -> u64 {
    3600
}

pub fn default_kick_template() -> String {
    "KICK {channel} {user} {reason}".to_string()
}

pub fn default_ban_template() -> String {
    "TBAN {channel} {bantime} {user} {reason}".to_string()
}

pub fn default_kick_reason() -> String {
    "Watch your language.".to_string()
}

pub fn default_ban_reason() -> String {
    "Repeated use of blocked language.".to_string()
}

pub fn default_enforcer() -> String {
    "ChanServ".to_string()
}
