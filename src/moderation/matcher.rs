//! Blocklist matching.
//!
//! Each channel carries a list of free-text patterns. A message is flagged if
//! any of them, compiled as a case-insensitive Unicode regex, matches anywhere
//! in the text. Compiled regexes are memoised by pattern string; the pattern
//! rows themselves are always read from the store.

use crate::db::{BlocklistEntry, Database};
use crate::error::{ModerationError, ModerationResult};
use crate::moderation::channel_key;
use dashmap::DashMap;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

/// Upper bound on the compiled size of a single pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Evaluates messages against a channel's blocklist.
pub struct BadwordMatcher {
    db: Database,
    /// `None` marks a pattern that failed to compile.
    compiled: DashMap<String, Option<Regex>>,
}

impl BadwordMatcher {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            compiled: DashMap::new(),
        }
    }

    /// Whether any of the channel's patterns matches `text`.
    ///
    /// Stops at the first hit.
    pub async fn check(&self, channel: &str, text: &str) -> ModerationResult<bool> {
        let channel = channel_key(channel);
        let entries = self.db.badwords().list(&channel).await?;

        for entry in entries {
            if let Some(re) = self.regex(&entry.pattern)
                && re.is_match(text)
            {
                debug!(channel = %channel, pattern = %entry.pattern, "blocklist hit");
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Add a pattern to a channel. Both fields are trimmed; duplicates are kept.
    pub async fn add(&self, pattern: &str, channel: &str) -> ModerationResult<()> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(ModerationError::InvalidPattern(String::new()));
        }
        if self.regex(pattern).is_none() {
            return Err(ModerationError::InvalidPattern(pattern.to_string()));
        }

        self.db.badwords().add(pattern, &channel_key(channel)).await?;
        Ok(())
    }

    /// Remove a pattern from a channel. A pair that was never added is a no-op.
    ///
    /// Returns how many rows were removed.
    pub async fn delete(&self, pattern: &str, channel: &str) -> ModerationResult<u64> {
        let removed = self
            .db
            .badwords()
            .delete(pattern.trim(), &channel_key(channel))
            .await?;
        Ok(removed)
    }

    /// All entries for a channel in storage order.
    pub async fn list(&self, channel: &str) -> ModerationResult<Vec<BlocklistEntry>> {
        Ok(self.db.badwords().list(&channel_key(channel)).await?)
    }

    fn regex(&self, pattern: &str) -> Option<Regex> {
        if let Some(cached) = self.compiled.get(pattern) {
            return cached.clone();
        }

        let compiled = match RegexBuilder::new(pattern)
            .case_insensitive(true)
            .unicode(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
        {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "blocklist pattern does not compile; skipping");
                None
            }
        };

        self.compiled.insert(pattern.to_string(), compiled.clone());
        compiled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn matcher() -> BadwordMatcher {
        BadwordMatcher::new(Database::new(":memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_case_insensitive_and_channel_scoped() {
        let m = matcher().await;
        m.add("badword", "#chan").await.unwrap();

        assert!(m.check("#chan", "this is a BADWORD here").await.unwrap());
        assert!(!m.check("#other", "badword").await.unwrap());
        assert!(!m.check("#chan", "all clean").await.unwrap());
    }

    #[tokio::test]
    async fn test_unicode_case_folding() {
        let m = matcher().await;
        m.add("straße", "#de").await.unwrap();
        m.add("ωμέγα", "#gr").await.unwrap();

        assert!(m.check("#de", "STRASSE oder STRAẞE").await.unwrap());
        assert!(m.check("#gr", "ΩΜΈΓΑ").await.unwrap());
    }

    #[tokio::test]
    async fn test_regex_patterns() {
        let m = matcher().await;
        m.add(r"\bf+o+\b", "#chan").await.unwrap();

        assert!(m.check("#chan", "well FOOOO then").await.unwrap());
        assert!(!m.check("#chan", "food").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_trims_and_normalizes_channel() {
        let m = matcher().await;
        m.add("  spam  ", "  #Chan ").await.unwrap();

        let entries = m.list("#chan").await.unwrap();
        assert_eq!(
            entries,
            vec![BlocklistEntry {
                pattern: "spam".to_string(),
                channel: "#chan".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let m = matcher().await;
        m.add("spam", "#chan").await.unwrap();

        assert_eq!(m.delete("eggs", "#chan").await.unwrap(), 0);
        assert_eq!(m.delete("spam", "#other").await.unwrap(), 0);
        assert_eq!(m.list("#chan").await.unwrap().len(), 1);

        assert_eq!(m.delete(" spam ", "#chan").await.unwrap(), 1);
        assert!(m.list("#chan").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_pattern_rejected() {
        let m = matcher().await;
        assert!(matches!(
            m.add("(unclosed", "#chan").await,
            Err(ModerationError::InvalidPattern(_))
        ));
        assert!(matches!(
            m.add("   ", "#chan").await,
            Err(ModerationError::InvalidPattern(_))
        ));
        assert!(m.list("#chan").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_broken_stored_pattern_is_skipped() {
        let db = Database::new(":memory:").await.unwrap();
        // Bypass validation to simulate a row written by an older release
        db.badwords().add("(unclosed", "#chan").await.unwrap();
        db.badwords().add("spam", "#chan").await.unwrap();

        let m = BadwordMatcher::new(db);
        assert!(m.check("#chan", "SPAM").await.unwrap());
        assert!(!m.check("#chan", "(unclosed").await.unwrap());
    }
}
