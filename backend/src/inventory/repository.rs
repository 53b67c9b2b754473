use std::sync::Arc;
use std::time::Duration;

use crate::inventory::model::{
    IdempotencyKey, IdempotencyRecord, Inventory, Seat, SeatStatus,
};
use crate::logger::warn_if_slow;
use crate::store::port::{
    IdempotencyRow, InventoryGuard, InventoryRow, SeatGuard, SeatRow, SeatWrite, StoreError,
    StorePort,
};
use crate::time;

/// Typed wrapper over the Store Port: marshals the three record kinds and
/// encodes the conditional predicates the engine relies on. Responsible only
/// for persistence shape, never for business classification; callers decide
/// what a `ConditionFailed` means for their operation.
pub struct InventoryRepository {
    store: Arc<dyn StorePort>,
}

impl InventoryRepository {
    pub fn new(store: Arc<dyn StorePort>) -> Self {
        Self { store }
    }

    // =========================
    // Quantity inventory
    // =========================

    pub async fn get_inventory(&self, event_id: &str) -> Result<Option<Inventory>, StoreError> {
        let row = warn_if_slow("store_get_inventory", Duration::from_millis(50), async {
            self.store.get_inventory(event_id).await
        })
        .await?;
        row.map(inventory_from_row).transpose()
    }

    /// Seeding/admin path; the engine itself never creates inventory.
    pub async fn put_inventory(&self, inv: &Inventory) -> Result<(), StoreError> {
        self.store
            .put_inventory(&InventoryRow {
                event_id: inv.event_id.clone(),
                remaining: inv.remaining,
                version: inv.version,
                total_seats: inv.total_seats,
                updated_at: time::to_rfc3339(&inv.updated_at),
            })
            .await
    }

    /// The commit CAS: `remaining -= qty; version += 1` guarded by
    /// `remaining >= qty AND version = expected_version`.
    pub async fn decrement_remaining(
        &self,
        event_id: &str,
        qty: i64,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        self.store
            .update_inventory(
                event_id,
                -qty,
                InventoryGuard::RemainingAtVersion {
                    min_remaining: qty,
                    version: expected_version,
                },
                &time::now_rfc3339(),
            )
            .await
    }

    /// The release restock: unconditional, clamped at capacity by the port.
    pub async fn increment_remaining(&self, event_id: &str, qty: i64) -> Result<(), StoreError> {
        self.store
            .update_inventory(
                event_id,
                qty,
                InventoryGuard::Unconditional,
                &time::now_rfc3339(),
            )
            .await
    }

    // =========================
    // Seats
    // =========================

    pub async fn get_seats(
        &self,
        event_id: &str,
        seat_ids: &[String],
    ) -> Result<Vec<Seat>, StoreError> {
        let rows = warn_if_slow("store_batch_get_seats", Duration::from_millis(100), async {
            self.store.batch_get_seats(event_id, seat_ids).await
        })
        .await?;
        rows.into_iter().map(seat_from_row).collect()
    }

    /// Seeding/admin path.
    pub async fn put_seat(&self, seat: &Seat) -> Result<(), StoreError> {
        self.store
            .put_seat(&SeatRow {
                event_id: seat.event_id.clone(),
                seat_id: seat.seat_id.clone(),
                status: seat.status.as_str().to_string(),
                reservation_id: seat.reservation_id.clone().unwrap_or_default(),
                updated_at: time::to_rfc3339(&seat.updated_at),
            })
            .await
    }

    /// Transitions every named seat to SOLD by `reservation_id`, each leg
    /// guarded by: absent, or AVAILABLE, or already HOLD/SOLD by this same
    /// reservation. All-or-nothing; a rejected leg surfaces as
    /// `ConditionFailed` listing the offending seats.
    pub async fn mark_seats_sold(
        &self,
        event_id: &str,
        seat_ids: &[String],
        reservation_id: &str,
    ) -> Result<(), StoreError> {
        let updated_at = time::now_rfc3339();
        let writes: Vec<SeatWrite> = seat_ids
            .iter()
            .map(|seat_id| SeatWrite {
                event_id: event_id.to_string(),
                seat_id: seat_id.clone(),
                status: SeatStatus::Sold.as_str().to_string(),
                reservation_id: reservation_id.to_string(),
                updated_at: updated_at.clone(),
                guard: SeatGuard::AvailableOrOwnedBy(reservation_id.to_string()),
            })
            .collect();
        self.store.transact_write_seats(&writes).await
    }

    /// Returns every named seat that is HOLD by `reservation_id` to
    /// AVAILABLE with the owner cleared. Legs that no longer match are
    /// skipped by the store guard, which is what makes release replays
    /// harmless.
    pub async fn release_held_seats(
        &self,
        event_id: &str,
        seat_ids: &[String],
        reservation_id: &str,
    ) -> Result<(), StoreError> {
        let updated_at = time::now_rfc3339();
        let writes: Vec<SeatWrite> = seat_ids
            .iter()
            .map(|seat_id| SeatWrite {
                event_id: event_id.to_string(),
                seat_id: seat_id.clone(),
                status: SeatStatus::Available.as_str().to_string(),
                reservation_id: String::new(),
                updated_at: updated_at.clone(),
                guard: SeatGuard::HeldBy(reservation_id.to_string()),
            })
            .collect();
        self.store.transact_write_seats(&writes).await
    }

    // =========================
    // Idempotency records
    // =========================

    pub async fn get_idempotency(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<IdempotencyRecord>, StoreError> {
        let row = self
            .store
            .get_idempotency(&key.storage_key(), time::epoch_secs())
            .await?;
        row.map(idempotency_from_row).transpose()
    }

    /// First writer wins for the TTL window; `ConditionFailed` when a live
    /// record already exists.
    pub async fn put_idempotency_if_absent(
        &self,
        record: &IdempotencyRecord,
    ) -> Result<(), StoreError> {
        self.store
            .put_idempotency_if_absent(
                &IdempotencyRow {
                    k: record.key.storage_key(),
                    op_result: record.result.clone(),
                    event_id: record.event_id.clone(),
                    created_at: time::to_rfc3339(&record.created_at),
                    expires_at: record.expires_at_epoch,
                },
                time::epoch_secs(),
            )
            .await
    }

    pub async fn delete_idempotency(&self, key: &IdempotencyKey) -> Result<(), StoreError> {
        self.store.delete_idempotency(&key.storage_key()).await
    }

    pub async fn purge_expired_idempotency(&self) -> Result<u64, StoreError> {
        self.store
            .delete_expired_idempotency(time::epoch_secs())
            .await
    }
}

// =========================
// Row mapping
// =========================

fn inventory_from_row(row: InventoryRow) -> Result<Inventory, StoreError> {
    Ok(Inventory {
        updated_at: parse_ts(&row.updated_at, &row.event_id)?,
        event_id: row.event_id,
        remaining: row.remaining,
        version: row.version,
        total_seats: row.total_seats,
    })
}

fn seat_from_row(row: SeatRow) -> Result<Seat, StoreError> {
    let status = SeatStatus::parse(&row.status).ok_or_else(|| {
        StoreError::Backend(format!(
            "seat {}/{} has malformed status {:?}",
            row.event_id, row.seat_id, row.status
        ))
    })?;
    Ok(Seat {
        updated_at: parse_ts(&row.updated_at, &row.seat_id)?,
        // Empty string is the stored form of "no owner"; it must round-trip
        // as absent, not as an empty sentinel.
        reservation_id: (!row.reservation_id.is_empty()).then_some(row.reservation_id),
        event_id: row.event_id,
        seat_id: row.seat_id,
        status,
    })
}

fn idempotency_from_row(row: IdempotencyRow) -> Result<IdempotencyRecord, StoreError> {
    let (prefix, reservation_id) = row
        .k
        .split_once(':')
        .ok_or_else(|| StoreError::Backend(format!("malformed idempotency key {:?}", row.k)))?;
    let operation = match prefix {
        "commit" => crate::inventory::model::Operation::Commit,
        "release" => crate::inventory::model::Operation::Release,
        other => {
            return Err(StoreError::Backend(format!(
                "unknown idempotency operation {other:?}"
            )));
        }
    };
    Ok(IdempotencyRecord {
        key: IdempotencyKey::new(operation, reservation_id),
        result: row.op_result,
        event_id: row.event_id,
        created_at: parse_ts(&row.created_at, &row.k)?,
        expires_at_epoch: row.expires_at,
    })
}

fn parse_ts(raw: &str, context: &str) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
    time::parse_rfc3339(raw)
        .ok_or_else(|| StoreError::Backend(format!("malformed timestamp {raw:?} on {context}")))
}
