//! Infraction counter repository.
//!
//! Records are created lazily and never deleted; a pardon zeroes the
//! counters instead. Callers serialize read-modify-write cycles per identity
//! (see `moderation::ledger`).

use super::{DbError, to_count};
use sqlx::SqlitePool;

/// Running warn/kick counters for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfractionRecord {
    pub identity: String,
    pub warn_count: u32,
    pub kick_count: u32,
}

impl InfractionRecord {
    /// A clean record.
    pub fn new(identity: &str) -> Self {
        Self {
            identity: identity.to_string(),
            warn_count: 0,
            kick_count: 0,
        }
    }
}

/// Repository for infraction operations.
pub struct InfractionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> InfractionRepository<'a> {
    /// Create a new infraction repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Find the record for an identity.
    pub async fn find(&self, identity: &str) -> Result<Option<InfractionRecord>, DbError> {
        let row = sqlx::query_as::<_, (String, i64, i64)>(
            "SELECT identity, warn_count, kick_count FROM infractions WHERE identity = ?",
        )
        .bind(identity)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(identity, warn, kick)| InfractionRecord {
            identity,
            warn_count: to_count(warn),
            kick_count: to_count(kick),
        }))
    }

    /// Fetch the record for an identity, creating a clean one if absent.
    pub async fn get_or_create(&self, identity: &str) -> Result<InfractionRecord, DbError> {
        sqlx::query("INSERT OR IGNORE INTO infractions (identity, warn_count, kick_count) VALUES (?, 0, 0)")
            .bind(identity)
            .execute(self.pool)
            .await?;

        self.find(identity)
            .await?
            .ok_or_else(|| DbError::Internal(format!("infraction record for {identity} vanished")))
    }

    /// Persist a record (upsert).
    pub async fn save(&self, record: &InfractionRecord) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO infractions (identity, warn_count, kick_count) VALUES (?, ?, ?)
            ON CONFLICT(identity) DO UPDATE SET
                warn_count = excluded.warn_count,
                kick_count = excluded.kick_count
            "#,
        )
        .bind(&record.identity)
        .bind(i64::from(record.warn_count))
        .bind(i64::from(record.kick_count))
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_created_lazily_with_zero_counts() {
        let db = Database::new(":memory:").await.unwrap();
        assert!(db.infractions().find("u@h").await.unwrap().is_none());

        let record = db.infractions().get_or_create("u@h").await.unwrap();
        assert_eq!(record, InfractionRecord::new("u@h"));
    }

    #[tokio::test]
    async fn test_save_overwrites_counts() {
        let db = Database::new(":memory:").await.unwrap();
        let mut record = db.infractions().get_or_create("u@h").await.unwrap();
        record.warn_count = 2;
        record.kick_count = 1;
        db.infractions().save(&record).await.unwrap();

        let stored = db.infractions().find("u@h").await.unwrap().unwrap();
        assert_eq!(stored.warn_count, 2);
        assert_eq!(stored.kick_count, 1);
    }
}
