pub mod cache;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::inventory::model::{IdempotencyKey, IdempotencyRecord, Operation};
use crate::inventory::repository::InventoryRepository;
use crate::store::port::StoreError;
use crate::time;
use cache::ReplayCache;

/// Result of trying to claim an operation for a reservation.
pub enum ClaimOutcome {
    /// This caller owns the operation and must perform the mutation.
    Won,
    /// Another caller already claimed it; replay its recorded result.
    Lost(IdempotencyRecord),
}

/// Write-through record of `(operation, reservation_id) -> result` with a
/// TTL. The store-side table is authoritative; the in-process cache only
/// short-circuits replays and is never trusted on a miss.
///
/// The record doubles as the duplicate-commit gate: it is claimed with a
/// conditional put *before* the inventory mutation, so two racing commits
/// for one reservation can never both decrement.
pub struct IdempotencyLayer {
    repo: Arc<InventoryRepository>,
    cache: ReplayCache,
    ttl: Duration,
}

impl IdempotencyLayer {
    pub fn new(repo: Arc<InventoryRepository>, ttl: Duration, cache_size: usize) -> Self {
        Self {
            repo,
            cache: ReplayCache::new(cache_size),
            ttl,
        }
    }

    /// Unexpired recorded outcome for `(operation, reservation_id)`, if any.
    #[instrument(skip(self), target = "idempotency")]
    pub async fn lookup(
        &self,
        operation: Operation,
        reservation_id: &str,
    ) -> Result<Option<IdempotencyRecord>, StoreError> {
        let key = IdempotencyKey::new(operation, reservation_id);
        let storage_key = key.storage_key();

        if let Some(rec) = self.cache.get(&storage_key, time::epoch_secs()) {
            debug!(target: "idempotency", key = %storage_key, "replay cache hit");
            return Ok(Some(rec));
        }

        let rec = self.repo.get_idempotency(&key).await?;
        if let Some(r) = &rec {
            self.cache.insert(storage_key, r.clone());
        }
        Ok(rec)
    }

    /// Claims `(operation, reservation_id)` with `result` as the recorded
    /// outcome. First writer wins for the TTL window; the loser gets the
    /// winner's record back. `ConditionFailed` with no record means the
    /// record expired between the put and the re-read; callers surface
    /// that as a retryable conflict.
    #[instrument(skip(self, result), target = "idempotency")]
    pub async fn claim(
        &self,
        operation: Operation,
        reservation_id: &str,
        event_id: &str,
        result: &str,
    ) -> Result<ClaimOutcome, StoreError> {
        let key = IdempotencyKey::new(operation, reservation_id);
        let created_at = time::now();
        let record = IdempotencyRecord {
            key: key.clone(),
            result: result.to_string(),
            event_id: event_id.to_string(),
            created_at,
            expires_at_epoch: created_at.timestamp() + self.ttl.as_secs() as i64,
        };

        match self.repo.put_idempotency_if_absent(&record).await {
            Ok(()) => {
                self.cache.insert(key.storage_key(), record);
                Ok(ClaimOutcome::Won)
            }
            Err(StoreError::ConditionFailed { .. }) => {
                match self.repo.get_idempotency(&key).await? {
                    Some(existing) => {
                        self.cache.insert(key.storage_key(), existing.clone());
                        Ok(ClaimOutcome::Lost(existing))
                    }
                    // Lost to a record that has since expired; let the
                    // caller retry from the top.
                    None => Err(StoreError::ConditionFailed {
                        unavailable: vec![],
                    }),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Rolls a claim back after a determinate mutation failure, so the
    /// terminal error is not sticky for the reservation. Best-effort: a
    /// failed delete only costs the reservation a replayed wrong answer
    /// until TTL expiry, which the caller has already logged.
    #[instrument(skip(self), target = "idempotency")]
    pub async fn forget(
        &self,
        operation: Operation,
        reservation_id: &str,
    ) -> Result<(), StoreError> {
        let key = IdempotencyKey::new(operation, reservation_id);
        self.cache.remove(&key.storage_key());
        self.repo.delete_idempotency(&key).await
    }

    /// Scrubber entry point; the sqlx backends have no server-side TTL
    /// expiry, so a periodic task calls this.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        let removed = self.repo.purge_expired_idempotency().await?;
        if removed > 0 {
            debug!(target: "idempotency", removed, "scrubbed expired idempotency records");
        }
        Ok(removed)
    }

    /// Records an outcome without gating on it (seat-mode release path,
    /// where the store guard itself is idempotent). Losing the put to an
    /// existing record is fine; any other failure is logged and swallowed.
    pub async fn record_best_effort(
        &self,
        operation: Operation,
        reservation_id: &str,
        event_id: &str,
        result: &str,
    ) {
        match self.claim(operation, reservation_id, event_id, result).await {
            Ok(_) => {}
            Err(e) => {
                warn!(
                    target: "idempotency",
                    reservation_id,
                    error = %e,
                    "failed to record outcome; next retry will re-run the guarded no-op"
                );
            }
        }
    }
}
