//! Account repository.
//!
//! Handles account registration, authentication, identity binding and
//! privilege changes. An account is bound to at most one connection identity
//! at a time; binding it elsewhere releases the previous binding.

use super::DbError;
use crate::moderation::Role;
use crate::security::password::{dummy_verify, hash_password, verify_password};
use sqlx::SqlitePool;
use std::collections::BTreeSet;

type AccountRow = (i64, String, Option<String>, Option<String>, i64, bool, i64);

const ACCOUNT_COLUMNS: &str =
    "id, username, identity, nick, level, all_channels, registered_at";

/// A registered warden account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub username: String,
    /// `user@host` of the connection currently authenticated as this account.
    pub identity: Option<String>,
    pub nick: Option<String>,
    pub level: Role,
    /// Channel-scoped capabilities apply to every channel.
    pub all_channels: bool,
    /// Channels where channel-scoped capabilities apply.
    pub channels: BTreeSet<String>,
    pub registered_at: i64,
}

impl Account {
    /// Whether the account holds `role` (levels are cumulative).
    pub fn has_role(&self, role: Role) -> bool {
        self.level >= role
    }

    /// The full implied role set, lowest first.
    pub fn roles(&self) -> Vec<Role> {
        self.level.implied()
    }

    /// Whether channel-scoped capabilities apply to `channel`.
    pub fn covers_channel(&self, channel: &str) -> bool {
        self.all_channels || self.channels.contains(channel)
    }
}

/// Repository for account operations.
pub struct AccountRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new account.
    ///
    /// The username is unique (case-insensitive); a conflict yields
    /// [`DbError::AccountExists`].
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        identity: Option<&str>,
        nick: Option<&str>,
        level: Role,
    ) -> Result<Account, DbError> {
        let password_hash =
            hash_password(password).map_err(|e| DbError::Internal(e.to_string()))?;
        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;

        if let Some(identity) = identity {
            sqlx::query("UPDATE accounts SET identity = NULL, nick = NULL WHERE identity = ?")
                .bind(identity)
                .execute(&mut *tx)
                .await?;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO accounts (username, password_hash, identity, nick, level, all_channels, registered_at)
            VALUES (?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .bind(identity)
        .bind(nick)
        .bind(level.level())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::AccountExists(username.to_string());
            }
            DbError::from(e)
        })?;

        tx.commit().await?;

        Ok(Account {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            identity: identity.map(String::from),
            nick: nick.map(String::from),
            level,
            all_channels: false,
            channels: BTreeSet::new(),
            registered_at: now,
        })
    }

    /// Verify credentials and return the account.
    ///
    /// A missing account costs the same hashing work as a wrong password.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Account, DbError> {
        let row = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, password_hash FROM accounts WHERE username = ? COLLATE NOCASE",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        let Some((id, password_hash)) = row else {
            dummy_verify(password);
            return Err(DbError::AccountNotFound(username.to_string()));
        };

        if !verify_password(password, &password_hash) {
            return Err(DbError::InvalidPassword);
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::AccountNotFound(username.to_string()))
    }

    /// Bind a connection identity and nick to an account.
    pub async fn bind_identity(&self, id: i64, identity: &str, nick: &str) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE accounts SET identity = NULL, nick = NULL WHERE identity = ? AND id != ?",
        )
        .bind(identity)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE accounts SET identity = ?, nick = ? WHERE id = ?")
            .bind(identity)
            .bind(nick)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Find account by username.
    pub async fn find_by_name(&self, username: &str) -> Result<Option<Account>, DbError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ? COLLATE NOCASE"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        self.hydrate(row).await
    }

    /// Find the account bound to a connection identity.
    pub async fn find_by_identity(&self, identity: &str) -> Result<Option<Account>, DbError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE identity = ? ORDER BY id LIMIT 1"
        ))
        .bind(identity)
        .fetch_optional(self.pool)
        .await?;

        self.hydrate(row).await
    }

    /// Find account by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Account>, DbError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        self.hydrate(row).await
    }

    /// Logically log out every account bound to `nick`.
    ///
    /// Returns the usernames that were logged out.
    pub async fn logout_nick(&self, nick: &str) -> Result<Vec<String>, DbError> {
        let mut tx = self.pool.begin().await?;

        let usernames = sqlx::query_scalar::<_, String>(
            "SELECT username FROM accounts WHERE nick = ? COLLATE NOCASE",
        )
        .bind(nick)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("UPDATE accounts SET identity = NULL, nick = NULL WHERE nick = ? COLLATE NOCASE")
            .bind(nick)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(usernames)
    }

    /// Follow a nick change. Returns the number of accounts updated.
    pub async fn rename_nick(&self, old: &str, new: &str) -> Result<u64, DbError> {
        let result = sqlx::query("UPDATE accounts SET nick = ? WHERE nick = ? COLLATE NOCASE")
            .bind(new)
            .bind(old)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete an account after verifying its credentials.
    pub async fn delete(&self, username: &str, password: &str) -> Result<(), DbError> {
        let account = self.authenticate(username, password).await?;

        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(account.id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Set the privilege level. The level column encodes the whole implied
    /// role set, so a single update keeps it consistent.
    ///
    /// Returns `false` if no such account exists.
    pub async fn set_level(&self, username: &str, level: Role) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE accounts SET level = ? WHERE username = ? COLLATE NOCASE")
            .bind(level.level())
            .bind(username)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Grant or revoke the all-channels scope.
    pub async fn set_all_channels(&self, username: &str, all: bool) -> Result<bool, DbError> {
        let result =
            sqlx::query("UPDATE accounts SET all_channels = ? WHERE username = ? COLLATE NOCASE")
                .bind(all)
                .bind(username)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Add a channel scope. Returns `false` if no such account exists.
    pub async fn add_channel(&self, username: &str, channel: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO account_channels (account_id, channel)
            SELECT id, ? FROM accounts WHERE username = ? COLLATE NOCASE
            "#,
        )
        .bind(channel)
        .bind(username)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        Ok(self.find_by_name(username).await?.is_some())
    }

    /// Remove a channel scope. Returns `false` if no such account exists.
    pub async fn remove_channel(&self, username: &str, channel: &str) -> Result<bool, DbError> {
        let Some(account) = self.find_by_name(username).await? else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM account_channels WHERE account_id = ? AND channel = ?")
            .bind(account.id)
            .bind(channel)
            .execute(self.pool)
            .await?;

        Ok(true)
    }

    async fn hydrate(&self, row: Option<AccountRow>) -> Result<Option<Account>, DbError> {
        let Some((id, username, identity, nick, level, all_channels, registered_at)) = row else {
            return Ok(None);
        };

        let channels = sqlx::query_scalar::<_, String>(
            "SELECT channel FROM account_channels WHERE account_id = ?",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .collect();

        Ok(Some(Account {
            id,
            username,
            identity,
            nick,
            level: Role::from_level(level),
            all_channels,
            channels,
            registered_at,
        }))
    }
}
