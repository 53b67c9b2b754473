//! The Store Port: the narrow seam between the engine and the backing
//! key-value store. Everything above this trait reasons in terms of rows and
//! typed guards; everything below it speaks a concrete store dialect.
//!
//! Contract required of every implementation:
//! - guarded single-row updates are linearizable,
//! - `transact_write_seats` is atomic across its legs,
//! - batch reads may be reissued safely,
//! - a predicate that does not hold surfaces as `StoreError::ConditionFailed`,
//!   never as any other error and never as silent success.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A conditional predicate did not hold. For seat transactions the
    /// rejected seat ids are carried so callers can report all of them.
    #[error("conditional predicate failed")]
    ConditionFailed { unavailable: Vec<String> },

    #[error("record not found")]
    NotFound,

    #[error("store call timed out")]
    Timeout,

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Quantity-inventory row as persisted. `updated_at` is RFC-3339.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventoryRow {
    pub event_id: String,
    pub remaining: i64,
    pub version: i64,
    pub total_seats: i64,
    pub updated_at: String,
}

/// Seat row as persisted. `reservation_id` is the empty string when the
/// seat is AVAILABLE; the repository turns that into `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeatRow {
    pub event_id: String,
    pub seat_id: String,
    pub status: String,
    pub reservation_id: String,
    pub updated_at: String,
}

/// Idempotency row. `k` is `"{operation}:{reservation_id}"`; `op_result`
/// holds the issued order id for commits and the literal `RELEASED` for
/// releases. `expires_at` is epoch seconds; rows at or past it are
/// indistinguishable from absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdempotencyRow {
    pub k: String,
    pub op_result: String,
    pub event_id: String,
    pub created_at: String,
    pub expires_at: i64,
}

/// Server-side predicate evaluated atomically with a quantity update.
#[derive(Clone, Copy, Debug)]
pub enum InventoryGuard {
    /// `remaining >= min_remaining AND version = version`. A guarded update
    /// also bumps `version` by exactly 1.
    RemainingAtVersion { min_remaining: i64, version: i64 },

    /// No predicate beyond row existence; `version` is untouched and the
    /// result is clamped into `[0, total_seats]`.
    Unconditional,
}

/// One leg of a seat transaction.
#[derive(Clone, Debug)]
pub struct SeatWrite {
    pub event_id: String,
    pub seat_id: String,
    pub status: String,
    pub reservation_id: String,
    pub updated_at: String,
    pub guard: SeatGuard,
}

#[derive(Clone, Debug)]
pub enum SeatGuard {
    /// Row absent, or AVAILABLE, or already HOLD/SOLD by this reservation.
    /// A failing leg aborts the whole transaction with `ConditionFailed`
    /// listing every rejected seat.
    AvailableOrOwnedBy(String),

    /// Row is HOLD by this reservation. A failing leg is skipped; the
    /// transaction still commits the matching legs.
    HeldBy(String),
}

#[async_trait]
pub trait StorePort: Send + Sync {
    async fn get_inventory(&self, event_id: &str) -> Result<Option<InventoryRow>, StoreError>;

    /// Unconditional upsert; seeding/admin path only.
    async fn put_inventory(&self, row: &InventoryRow) -> Result<(), StoreError>;

    /// Applies `remaining += delta` under the guard, atomically with the
    /// predicate evaluation. `NotFound` when the row is absent and the guard
    /// is `Unconditional`; a guarded miss on an absent row surfaces as
    /// `ConditionFailed` (the caller re-reads to classify).
    async fn update_inventory(
        &self,
        event_id: &str,
        delta: i64,
        guard: InventoryGuard,
        updated_at: &str,
    ) -> Result<(), StoreError>;

    /// Missing seats are simply absent from the result, not an error.
    async fn batch_get_seats(
        &self,
        event_id: &str,
        seat_ids: &[String],
    ) -> Result<Vec<SeatRow>, StoreError>;

    /// Unconditional upsert; seeding/admin path only.
    async fn put_seat(&self, row: &SeatRow) -> Result<(), StoreError>;

    /// All-or-nothing across legs guarded by `AvailableOrOwnedBy`;
    /// `HeldBy` legs that miss are skipped without aborting.
    async fn transact_write_seats(&self, writes: &[SeatWrite]) -> Result<(), StoreError>;

    /// Expired rows (`expires_at <= now_epoch`) read as absent.
    async fn get_idempotency(
        &self,
        key: &str,
        now_epoch: i64,
    ) -> Result<Option<IdempotencyRow>, StoreError>;

    /// Conditional put: succeeds when the key is absent or expired as of
    /// `now_epoch`, otherwise `ConditionFailed`.
    async fn put_idempotency_if_absent(
        &self,
        row: &IdempotencyRow,
        now_epoch: i64,
    ) -> Result<(), StoreError>;

    /// Claim rollback after a determinate mutation failure. Absent keys are
    /// fine (the delete may race the scrubber).
    async fn delete_idempotency(&self, key: &str) -> Result<(), StoreError>;

    /// Scrubber hook; returns the number of rows removed.
    async fn delete_expired_idempotency(&self, now_epoch: i64) -> Result<u64, StoreError>;
}
