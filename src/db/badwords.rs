//! Blocklist pattern repository.
//!
//! Pure storage: no trimming, normalization or regex handling happens here
//! (see `moderation::matcher`).

use super::DbError;
use sqlx::SqlitePool;

/// One blocklist pattern for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlocklistEntry {
    pub pattern: String,
    pub channel: String,
}

/// Repository for blocklist operations.
pub struct BadwordRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BadwordRepository<'a> {
    /// Create a new blocklist repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a pattern. Duplicates are allowed.
    pub async fn add(&self, pattern: &str, channel: &str) -> Result<(), DbError> {
        sqlx::query("INSERT INTO badwords (pattern, channel) VALUES (?, ?)")
            .bind(pattern)
            .bind(channel)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Remove every row matching both fields exactly. Returns the row count.
    pub async fn delete(&self, pattern: &str, channel: &str) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM badwords WHERE pattern = ? AND channel = ?")
            .bind(pattern)
            .bind(channel)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// All entries for a channel in storage order.
    pub async fn list(&self, channel: &str) -> Result<Vec<BlocklistEntry>, DbError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT pattern, channel FROM badwords WHERE channel = ? ORDER BY id",
        )
        .bind(channel)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(pattern, channel)| BlocklistEntry { pattern, channel })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_duplicates_and_exact_delete() {
        let db = Database::new(":memory:").await.unwrap();
        let repo = db.badwords();

        repo.add("spam", "#a").await.unwrap();
        repo.add("spam", "#a").await.unwrap();
        repo.add("eggs", "#a").await.unwrap();
        repo.add("spam", "#b").await.unwrap();

        assert_eq!(repo.list("#a").await.unwrap().len(), 3);

        // Both duplicates go, the other channel keeps its copy
        assert_eq!(repo.delete("spam", "#a").await.unwrap(), 2);
        assert_eq!(repo.delete("Spam", "#b").await.unwrap(), 0);

        let left: Vec<String> = repo
            .list("#a")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.pattern)
            .collect();
        assert_eq!(left, vec!["eggs".to_string()]);
        assert_eq!(repo.list("#b").await.unwrap().len(), 1);
    }
}
