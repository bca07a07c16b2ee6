//! Channel policy repository.

use super::{DbError, to_count};
use crate::config::PolicyDefaults;
use sqlx::SqlitePool;

type PolicyRow = (
    String,
    i64,
    i64,
    bool,
    bool,
    bool,
    i64,
    String,
    String,
    String,
    String,
    String,
);

const POLICY_COLUMNS: &str = "channel, warn_to_kick, kick_to_ban, kick_enabled, ban_enabled, \
     private_notify, ban_duration, kick_template, ban_template, kick_reason, ban_reason, enforcer";

/// Enforcement settings for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPolicy {
    pub channel: String,
    pub warn_to_kick: u32,
    pub kick_to_ban: u32,
    pub kick_enabled: bool,
    pub ban_enabled: bool,
    pub private_notify: bool,
    /// Seconds.
    pub ban_duration: u64,
    pub kick_template: String,
    pub ban_template: String,
    pub kick_reason: String,
    pub ban_reason: String,
    /// Service nick that receives enforcer commands.
    pub enforcer: String,
}

impl ChannelPolicy {
    /// Build a policy for `channel` from configured defaults.
    pub fn from_defaults(channel: &str, defaults: &PolicyDefaults) -> Self {
        Self {
            channel: channel.to_string(),
            warn_to_kick: defaults.warn_to_kick,
            kick_to_ban: defaults.kick_to_ban,
            kick_enabled: defaults.kick_enabled,
            ban_enabled: defaults.ban_enabled,
            private_notify: defaults.private_notify,
            ban_duration: defaults.ban_duration,
            kick_template: defaults.kick_template.clone(),
            ban_template: defaults.ban_template.clone(),
            kick_reason: defaults.kick_reason.clone(),
            ban_reason: defaults.ban_reason.clone(),
            enforcer: defaults.enforcer.clone(),
        }
    }

    fn from_row(row: PolicyRow) -> Self {
        let (
            channel,
            warn_to_kick,
            kick_to_ban,
            kick_enabled,
            ban_enabled,
            private_notify,
            ban_duration,
            kick_template,
            ban_template,
            kick_reason,
            ban_reason,
            enforcer,
        ) = row;

        Self {
            channel,
            warn_to_kick: to_count(warn_to_kick),
            kick_to_ban: to_count(kick_to_ban),
            kick_enabled,
            ban_enabled,
            private_notify,
            ban_duration: u64::try_from(ban_duration).unwrap_or(0),
            kick_template,
            ban_template,
            kick_reason,
            ban_reason,
            enforcer,
        }
    }
}

/// Repository for channel policy operations.
pub struct PolicyRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PolicyRepository<'a> {
    /// Create a new policy repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Find the policy for a channel.
    pub async fn find(&self, channel: &str) -> Result<Option<ChannelPolicy>, DbError> {
        let row = sqlx::query_as::<_, PolicyRow>(&format!(
            "SELECT {POLICY_COLUMNS} FROM channel_policies WHERE channel = ?"
        ))
        .bind(channel)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ChannelPolicy::from_row))
    }

    /// Create the policy for a channel from defaults unless one exists.
    ///
    /// Returns the stored policy, which is left untouched if it already existed.
    pub async fn ensure(
        &self,
        channel: &str,
        defaults: &PolicyDefaults,
    ) -> Result<ChannelPolicy, DbError> {
        let policy = ChannelPolicy::from_defaults(channel, defaults);

        sqlx::query(&format!(
            "INSERT OR IGNORE INTO channel_policies ({POLICY_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&policy.channel)
        .bind(i64::from(policy.warn_to_kick))
        .bind(i64::from(policy.kick_to_ban))
        .bind(policy.kick_enabled)
        .bind(policy.ban_enabled)
        .bind(policy.private_notify)
        .bind(i64::try_from(policy.ban_duration).unwrap_or(i64::MAX))
        .bind(&policy.kick_template)
        .bind(&policy.ban_template)
        .bind(&policy.kick_reason)
        .bind(&policy.ban_reason)
        .bind(&policy.enforcer)
        .execute(self.pool)
        .await?;

        self.find(channel)
            .await?
            .ok_or_else(|| DbError::Internal(format!("policy for {channel} vanished")))
    }

    /// Overwrite an existing policy. Returns `false` if the channel has none.
    pub async fn save(&self, policy: &ChannelPolicy) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE channel_policies
            SET warn_to_kick = ?, kick_to_ban = ?, kick_enabled = ?, ban_enabled = ?,
                private_notify = ?, ban_duration = ?, kick_template = ?, ban_template = ?,
                kick_reason = ?, ban_reason = ?, enforcer = ?
            WHERE channel = ?
            "#,
        )
        .bind(i64::from(policy.warn_to_kick))
        .bind(i64::from(policy.kick_to_ban))
        .bind(policy.kick_enabled)
        .bind(policy.ban_enabled)
        .bind(policy.private_notify)
        .bind(i64::try_from(policy.ban_duration).unwrap_or(i64::MAX))
        .bind(&policy.kick_template)
        .bind(&policy.ban_template)
        .bind(&policy.kick_reason)
        .bind(&policy.ban_reason)
        .bind(&policy.enforcer)
        .bind(&policy.channel)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
