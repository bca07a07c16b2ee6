//! Channel policy access with a read-through cache.
//!
//! Policies are read on every enforcement decision and written only by the
//! `set` command and on first join. Reads are served from a `DashMap`; a
//! write drops the cached entry while holding the write side of a lock whose
//! read side guards cache fills, so a fill can never reinstate a stale row.

use crate::config::PolicyDefaults;
use crate::db::{ChannelPolicy, Database};
use crate::error::{ModerationError, ModerationResult};
use crate::moderation::channel_key;
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Keys accepted by `set`, in the order `policy` prints them.
pub const SETTING_KEYS: &[&str] = &[
    "warn_to_kick",
    "kick_to_ban",
    "kick",
    "ban",
    "private_notify",
    "ban_time",
    "kick_template",
    "ban_template",
    "kick_reason",
    "ban_reason",
    "enforcer",
];

/// Cached access to [`ChannelPolicy`] rows.
pub struct PolicyStore {
    db: Database,
    defaults: PolicyDefaults,
    cache: DashMap<String, ChannelPolicy>,
    write_gate: RwLock<()>,
}

impl PolicyStore {
    pub fn new(db: Database, defaults: PolicyDefaults) -> Self {
        Self {
            db,
            defaults,
            cache: DashMap::new(),
            write_gate: RwLock::new(()),
        }
    }

    /// Policy for a channel, if it was ever initialized.
    pub async fn get(&self, channel: &str) -> ModerationResult<Option<ChannelPolicy>> {
        let key = channel_key(channel);
        if let Some(policy) = self.cache.get(&key) {
            return Ok(Some(policy.clone()));
        }

        let _fill = self.write_gate.read().await;
        if let Some(policy) = self.cache.get(&key) {
            return Ok(Some(policy.clone()));
        }

        let policy = self.db.policies().find(&key).await?;
        if let Some(ref policy) = policy {
            self.cache.insert(key, policy.clone());
        }
        Ok(policy)
    }

    /// Policy for a channel the warden is active in. A miss is an internal
    /// invariant violation, not a caller error.
    pub async fn require(&self, channel: &str) -> ModerationResult<ChannelPolicy> {
        self.get(channel)
            .await?
            .ok_or_else(|| ModerationError::PolicyMissing(channel_key(channel)))
    }

    /// Create the policy from defaults unless it already exists.
    pub async fn ensure(&self, channel: &str) -> ModerationResult<ChannelPolicy> {
        let key = channel_key(channel);
        let _write = self.write_gate.write().await;

        let policy = self.db.policies().ensure(&key, &self.defaults).await?;
        self.cache.remove(&key);
        Ok(policy)
    }

    /// Load, mutate and persist a policy.
    ///
    /// Fails with [`ModerationError::RecordNotFound`] if the channel has no
    /// policy yet.
    pub async fn update<F>(&self, channel: &str, mutate: F) -> ModerationResult<ChannelPolicy>
    where
        F: FnOnce(&mut ChannelPolicy) -> ModerationResult<()>,
    {
        let key = channel_key(channel);
        let _write = self.write_gate.write().await;

        let mut policy = self
            .db
            .policies()
            .find(&key)
            .await?
            .ok_or_else(|| ModerationError::RecordNotFound(key.clone()))?;

        mutate(&mut policy)?;

        if !self.db.policies().save(&policy).await? {
            return Err(ModerationError::RecordNotFound(key));
        }
        self.cache.remove(&key);

        info!(channel = %policy.channel, "channel policy updated");
        Ok(policy)
    }
}

/// Apply one `set <key> <value>` to a policy.
pub fn apply_setting(policy: &mut ChannelPolicy, key: &str, value: &str) -> ModerationResult<()> {
    let value = value.trim();
    match key.to_ascii_lowercase().as_str() {
        "warn_to_kick" => policy.warn_to_kick = parse_threshold("warn_to_kick", value)?,
        "kick_to_ban" => policy.kick_to_ban = parse_threshold("kick_to_ban", value)?,
        "kick" => policy.kick_enabled = parse_switch("kick", value)?,
        "ban" => policy.ban_enabled = parse_switch("ban", value)?,
        "private_notify" => policy.private_notify = parse_switch("private_notify", value)?,
        "ban_time" => {
            policy.ban_duration = value
                .parse()
                .map_err(|_| invalid_value("ban_time", "a number of seconds"))?
        }
        "kick_template" => policy.kick_template = non_empty("kick_template", value)?,
        "ban_template" => policy.ban_template = non_empty("ban_template", value)?,
        "kick_reason" => policy.kick_reason = non_empty("kick_reason", value)?,
        "ban_reason" => policy.ban_reason = non_empty("ban_reason", value)?,
        "enforcer" => {
            if value.is_empty() || value.contains(char::is_whitespace) {
                return Err(invalid_value("enforcer", "a single nickname"));
            }
            policy.enforcer = value.to_string();
        }
        _ => {
            return Err(ModerationError::InvalidArguments(format!(
                "set <channel> <key> <value>, key one of: {}",
                SETTING_KEYS.join(", ")
            )));
        }
    }
    Ok(())
}

/// Human-readable `key = value` lines for a policy.
pub fn describe(policy: &ChannelPolicy) -> Vec<String> {
    vec![
        format!("warn_to_kick = {}", policy.warn_to_kick),
        format!("kick_to_ban = {}", policy.kick_to_ban),
        format!("kick = {}", on_off(policy.kick_enabled)),
        format!("ban = {}", on_off(policy.ban_enabled)),
        format!("private_notify = {}", on_off(policy.private_notify)),
        format!("ban_time = {}", policy.ban_duration),
        format!("kick_template = {}", policy.kick_template),
        format!("ban_template = {}", policy.ban_template),
        format!("kick_reason = {}", policy.kick_reason),
        format!("ban_reason = {}", policy.ban_reason),
        format!("enforcer = {}", policy.enforcer),
    ]
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn parse_threshold(key: &str, value: &str) -> ModerationResult<u32> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid_value(key, "a number greater than zero")),
    }
}

fn parse_switch(key: &str, value: &str) -> ModerationResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(invalid_value(key, "on|off")),
    }
}

fn non_empty(key: &str, value: &str) -> ModerationResult<String> {
    if value.is_empty() {
        return Err(invalid_value(key, "a non-empty value"));
    }
    Ok(value.to_string())
}

fn invalid_value(key: &str, expected: &str) -> ModerationError {
    ModerationError::InvalidArguments(format!("set <channel> {} <{}>", key, expected))
}
