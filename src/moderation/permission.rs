//! Role- and channel-scoped permission checks.
//!
//! Roles form a single ordered level, `user < op < admin < owner`; holding a
//! level implies every level below it. Channel-scoped capabilities
//! additionally require the account to cover the target channel, either
//! explicitly or through the all-channels flag. The gate is deny-by-default:
//! an identity without an account is refused everything.

use crate::db::{Account, Database};
use crate::error::{ModerationError, ModerationResult};
use crate::moderation::{Identity, channel_key};
use std::fmt;
use tracing::debug;

/// Privilege level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    User,
    Op,
    Admin,
    Owner,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::User, Role::Op, Role::Admin, Role::Owner];

    /// Stored integer form.
    pub fn level(self) -> i64 {
        match self {
            Role::User => 0,
            Role::Op => 1,
            Role::Admin => 2,
            Role::Owner => 3,
        }
    }

    /// Inverse of [`level`](Self::level), clamping out-of-range values.
    pub fn from_level(level: i64) -> Self {
        match level {
            i64::MIN..=0 => Role::User,
            1 => Role::Op,
            2 => Role::Admin,
            _ => Role::Owner,
        }
    }

    /// Every role this one implies, lowest first.
    pub fn implied(self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|r| *r <= self).collect()
    }

    /// The level left after revoking this role.
    pub fn revoked(self) -> Role {
        match self {
            Role::User | Role::Op => Role::User,
            Role::Admin => Role::Op,
            Role::Owner => Role::Admin,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Op => "op",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel part of a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeCheck<'a> {
    /// The capability is not channel-scoped.
    Unscoped,
    /// Channel-scoped, but the caller supplied no channel.
    Missing,
    /// Channel-scoped, acting on this channel.
    Channel(&'a str),
}

/// Evaluates capability checks against the account directory.
#[derive(Clone)]
pub struct PermissionGate {
    db: Database,
}

impl PermissionGate {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Pure decision for an already resolved account.
    ///
    /// A missing channel argument is reported as such even before the
    /// account is looked at; every other failure is `PermissionDenied`.
    pub fn evaluate(
        account: Option<&Account>,
        required: Role,
        scope: ScopeCheck<'_>,
    ) -> ModerationResult<()> {
        if scope == ScopeCheck::Missing {
            return Err(ModerationError::MissingChannelArgument);
        }

        let Some(account) = account else {
            return Err(ModerationError::PermissionDenied);
        };

        if !account.has_role(required) {
            return Err(ModerationError::PermissionDenied);
        }

        if let ScopeCheck::Channel(channel) = scope
            && !account.covers_channel(&channel_key(channel))
        {
            return Err(ModerationError::PermissionDenied);
        }

        Ok(())
    }

    /// The account currently bound to an identity.
    pub async fn account_for(&self, identity: &Identity) -> ModerationResult<Option<Account>> {
        Ok(self.db.accounts().find_by_identity(&identity.key).await?)
    }

    /// Resolve the caller's account and evaluate the check.
    pub async fn authorize(
        &self,
        identity: &Identity,
        required: Role,
        scope: ScopeCheck<'_>,
    ) -> ModerationResult<Account> {
        let account = self.account_for(identity).await?;
        if let Err(e) = Self::evaluate(account.as_ref(), required, scope) {
            debug!(
                nick = %identity.nick,
                identity = %identity.key,
                required = %required,
                reason = e.error_code(),
                "capability denied"
            );
            return Err(e);
        }
        account.ok_or(ModerationError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn account(level: Role, channels: &[&str], all: bool) -> Account {
        Account {
            id: 1,
            username: "alice".to_string(),
            identity: Some("alice@host".to_string()),
            nick: Some("Alice".to_string()),
            level,
            all_channels: all,
            channels: channels.iter().map(|c| c.to_string()).collect::<BTreeSet<_>>(),
            registered_at: 0,
        }
    }

    #[test]
    fn test_role_ordering_and_implication() {
        assert!(Role::Owner > Role::Admin && Role::Admin > Role::Op && Role::Op > Role::User);
        assert_eq!(Role::Admin.implied(), vec![Role::User, Role::Op, Role::Admin]);
        assert_eq!(Role::User.implied(), vec![Role::User]);
        for role in Role::ALL {
            assert_eq!(Role::from_level(role.level()), role);
        }
        assert_eq!(Role::from_level(-5), Role::User);
        assert_eq!(Role::from_level(42), Role::Owner);
        assert_eq!(Role::Op.revoked(), Role::User);
        assert_eq!(Role::Admin.revoked(), Role::Op);
    }

    #[test]
    fn test_no_account_denied_everything() {
        for role in Role::ALL {
            for scope in [ScopeCheck::Unscoped, ScopeCheck::Channel("#rust")] {
                assert!(matches!(
                    PermissionGate::evaluate(None, role, scope),
                    Err(ModerationError::PermissionDenied)
                ));
            }
        }
    }

    #[test]
    fn test_missing_channel_is_distinct() {
        let admin = account(Role::Admin, &[], true);
        assert!(matches!(
            PermissionGate::evaluate(Some(&admin), Role::Op, ScopeCheck::Missing),
            Err(ModerationError::MissingChannelArgument)
        ));
    }

    #[test]
    fn test_role_required() {
        let user = account(Role::User, &["#rust"], false);
        assert!(PermissionGate::evaluate(Some(&user), Role::User, ScopeCheck::Unscoped).is_ok());
        assert!(matches!(
            PermissionGate::evaluate(Some(&user), Role::Op, ScopeCheck::Unscoped),
            Err(ModerationError::PermissionDenied)
        ));
    }

    #[test]
    fn test_user_denied_admin_scoped_command() {
        // Member of the channel as a plain user, no scopes
        let user = account(Role::User, &[], false);
        assert!(matches!(
            PermissionGate::evaluate(Some(&user), Role::Admin, ScopeCheck::Channel("#rust")),
            Err(ModerationError::PermissionDenied)
        ));
    }

    #[test]
    fn test_channel_scope() {
        let op = account(Role::Op, &["#rust"], false);
        assert!(PermissionGate::evaluate(Some(&op), Role::Op, ScopeCheck::Channel("#Rust")).is_ok());
        assert!(matches!(
            PermissionGate::evaluate(Some(&op), Role::Op, ScopeCheck::Channel("#go")),
            Err(ModerationError::PermissionDenied)
        ));

        let global = account(Role::Op, &[], true);
        assert!(
            PermissionGate::evaluate(Some(&global), Role::Op, ScopeCheck::Channel("#go")).is_ok()
        );
    }

    #[tokio::test]
    async fn test_authorize_resolves_identity() {
        let db = Database::new(":memory:").await.unwrap();
        db.accounts()
            .register("alice", "pw", Some("alice@host"), Some("Alice"), Role::Op)
            .await
            .unwrap();
        db.accounts().set_all_channels("alice", true).await.unwrap();

        let gate = PermissionGate::new(db);
        let alice = Identity::new("Alice", "alice@host");
        let mallory = Identity::new("Alice", "mallory@elsewhere");

        let account = gate
            .authorize(&alice, Role::Op, ScopeCheck::Channel("#rust"))
            .await
            .unwrap();
        assert_eq!(account.username, "alice");

        // Same nick, different connection identity
        assert!(matches!(
            gate.authorize(&mallory, Role::User, ScopeCheck::Unscoped).await,
            Err(ModerationError::PermissionDenied)
        ));
    }
}
