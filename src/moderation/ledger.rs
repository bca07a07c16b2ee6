//! Per-identity infraction counters.
//!
//! Badword checks run concurrently, so two matches from the same identity
//! can be decided at the same time. Every fetch-modify-persist cycle runs
//! under a per-identity async mutex; different identities never contend.

use crate::db::{Database, InfractionRecord};
use crate::error::ModerationResult;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Serialized access to [`InfractionRecord`]s.
pub struct InfractionLedger {
    db: Database,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl InfractionLedger {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            locks: DashMap::new(),
        }
    }

    /// Run `apply` on the identity's record (created clean if absent) and
    /// persist the result, all while holding the identity's lock.
    ///
    /// The record is saved even if `apply` changed nothing.
    pub async fn update<F, R>(&self, identity: &str, apply: F) -> ModerationResult<(InfractionRecord, R)>
    where
        F: FnOnce(&mut InfractionRecord) -> R,
    {
        let lock = self
            .locks
            .entry(identity.to_string())
            .or_default()
            .clone();

        let result = {
            let _guard = lock.lock().await;
            self.read_modify_write(identity, apply).await
        };

        // Drop our handle before pruning so an idle entry has exactly one owner
        drop(lock);
        self.locks
            .remove_if(identity, |_, l| Arc::strong_count(l) == 1);

        result
    }

    /// Zero both counters.
    pub async fn pardon(&self, identity: &str) -> ModerationResult<InfractionRecord> {
        let (record, ()) = self
            .update(identity, |r| {
                r.warn_count = 0;
                r.kick_count = 0;
            })
            .await?;
        Ok(record)
    }

    /// Current counters, if the identity ever offended.
    pub async fn get(&self, identity: &str) -> ModerationResult<Option<InfractionRecord>> {
        Ok(self.db.infractions().find(identity).await?)
    }

    async fn read_modify_write<F, R>(
        &self,
        identity: &str,
        apply: F,
    ) -> ModerationResult<(InfractionRecord, R)>
    where
        F: FnOnce(&mut InfractionRecord) -> R,
    {
        let mut record = self.db.infractions().get_or_create(identity).await?;
        let out = apply(&mut record);
        self.db.infractions().save(&record).await?;
        Ok((record, out))
    }

    #[cfg(test)]
    fn idle_locks(&self) -> usize {
        self.locks.len()
    }
}
