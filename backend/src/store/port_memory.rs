use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::store::port::{
    IdempotencyRow, InventoryGuard, InventoryRow, SeatGuard, SeatRow, SeatWrite, StoreError,
    StorePort,
};

#[derive(Default)]
struct Tables {
    inventory: HashMap<String, InventoryRow>,
    seats: HashMap<(String, String), SeatRow>,
    idempotency: HashMap<String, IdempotencyRow>,
}

/// In-memory Store Port. A single mutex over all three tables makes every
/// operation linearizable, which is the contract the engine's predicates
/// rely on. Used by unit and property tests and for local runs without a
/// database.
#[derive(Default)]
pub struct MemoryStorePort {
    tables: Mutex<Tables>,
}

impl MemoryStorePort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/seeding helper: current seat row, if any.
    pub fn seat(&self, event_id: &str, seat_id: &str) -> Option<SeatRow> {
        self.tables
            .lock()
            .seats
            .get(&(event_id.to_string(), seat_id.to_string()))
            .cloned()
    }

    /// Test/seeding helper: current inventory row, if any.
    pub fn inventory(&self, event_id: &str) -> Option<InventoryRow> {
        self.tables.lock().inventory.get(event_id).cloned()
    }

    pub fn idempotency_len(&self) -> usize {
        self.tables.lock().idempotency.len()
    }
}

fn seat_guard_holds(existing: Option<&SeatRow>, guard: &SeatGuard) -> bool {
    match guard {
        SeatGuard::AvailableOrOwnedBy(rid) => match existing {
            None => true,
            Some(row) => {
                row.status == "AVAILABLE"
                    || ((row.status == "HOLD" || row.status == "SOLD")
                        && row.reservation_id == *rid)
            }
        },
        SeatGuard::HeldBy(rid) => {
            matches!(existing, Some(row) if row.status == "HOLD" && row.reservation_id == *rid)
        }
    }
}

#[async_trait]
impl StorePort for MemoryStorePort {
    async fn get_inventory(&self, event_id: &str) -> Result<Option<InventoryRow>, StoreError> {
        Ok(self.tables.lock().inventory.get(event_id).cloned())
    }

    async fn put_inventory(&self, row: &InventoryRow) -> Result<(), StoreError> {
        self.tables
            .lock()
            .inventory
            .insert(row.event_id.clone(), row.clone());
        Ok(())
    }

    async fn update_inventory(
        &self,
        event_id: &str,
        delta: i64,
        guard: InventoryGuard,
        updated_at: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        match guard {
            InventoryGuard::RemainingAtVersion {
                min_remaining,
                version,
            } => {
                let Some(row) = tables.inventory.get_mut(event_id) else {
                    // Indistinguishable from a predicate miss at this layer;
                    // the caller re-reads to classify.
                    return Err(StoreError::ConditionFailed {
                        unavailable: vec![],
                    });
                };
                if row.remaining < min_remaining || row.version != version {
                    return Err(StoreError::ConditionFailed {
                        unavailable: vec![],
                    });
                }
                row.remaining += delta;
                row.version += 1;
                row.updated_at = updated_at.to_string();
                Ok(())
            }
            InventoryGuard::Unconditional => {
                let Some(row) = tables.inventory.get_mut(event_id) else {
                    return Err(StoreError::NotFound);
                };
                row.remaining = (row.remaining + delta).clamp(0, row.total_seats);
                row.updated_at = updated_at.to_string();
                Ok(())
            }
        }
    }

    async fn batch_get_seats(
        &self,
        event_id: &str,
        seat_ids: &[String],
    ) -> Result<Vec<SeatRow>, StoreError> {
        let tables = self.tables.lock();
        Ok(seat_ids
            .iter()
            .filter_map(|id| {
                tables
                    .seats
                    .get(&(event_id.to_string(), id.clone()))
                    .cloned()
            })
            .collect())
    }

    async fn put_seat(&self, row: &SeatRow) -> Result<(), StoreError> {
        self.tables
            .lock()
            .seats
            .insert((row.event_id.clone(), row.seat_id.clone()), row.clone());
        Ok(())
    }

    async fn transact_write_seats(&self, writes: &[SeatWrite]) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();

        // Phase 1: evaluate every aborting guard before touching anything.
        let mut rejected = Vec::new();
        for w in writes {
            if let SeatGuard::AvailableOrOwnedBy(_) = &w.guard {
                let key = (w.event_id.clone(), w.seat_id.clone());
                if !seat_guard_holds(tables.seats.get(&key), &w.guard) {
                    rejected.push(w.seat_id.clone());
                }
            }
        }
        if !rejected.is_empty() {
            return Err(StoreError::ConditionFailed {
                unavailable: rejected,
            });
        }

        // Phase 2: apply. HeldBy legs that miss are idempotent skips.
        for w in writes {
            let key = (w.event_id.clone(), w.seat_id.clone());
            if !seat_guard_holds(tables.seats.get(&key), &w.guard) {
                continue;
            }
            tables.seats.insert(
                key,
                SeatRow {
                    event_id: w.event_id.clone(),
                    seat_id: w.seat_id.clone(),
                    status: w.status.clone(),
                    reservation_id: w.reservation_id.clone(),
                    updated_at: w.updated_at.clone(),
                },
            );
        }
        Ok(())
    }

    async fn get_idempotency(
        &self,
        key: &str,
        now_epoch: i64,
    ) -> Result<Option<IdempotencyRow>, StoreError> {
        Ok(self
            .tables
            .lock()
            .idempotency
            .get(key)
            .filter(|r| r.expires_at > now_epoch)
            .cloned())
    }

    async fn put_idempotency_if_absent(
        &self,
        row: &IdempotencyRow,
        now_epoch: i64,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        if let Some(existing) = tables.idempotency.get(&row.k)
            && existing.expires_at > now_epoch
        {
            return Err(StoreError::ConditionFailed {
                unavailable: vec![],
            });
        }
        tables.idempotency.insert(row.k.clone(), row.clone());
        Ok(())
    }

    async fn delete_idempotency(&self, key: &str) -> Result<(), StoreError> {
        self.tables.lock().idempotency.remove(key);
        Ok(())
    }

    async fn delete_expired_idempotency(&self, now_epoch: i64) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock();
        let before = tables.idempotency.len();
        tables.idempotency.retain(|_, r| r.expires_at > now_epoch);
        Ok((before - tables.idempotency.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inv(event_id: &str, remaining: i64, version: i64, total: i64) -> InventoryRow {
        InventoryRow {
            event_id: event_id.to_string(),
            remaining,
            version,
            total_seats: total,
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn seat(event_id: &str, seat_id: &str, status: &str, rid: &str) -> SeatRow {
        SeatRow {
            event_id: event_id.to_string(),
            seat_id: seat_id.to_string(),
            status: status.to_string(),
            reservation_id: rid.to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn sold_write(seat_id: &str, rid: &str) -> SeatWrite {
        SeatWrite {
            event_id: "evt_1".to_string(),
            seat_id: seat_id.to_string(),
            status: "SOLD".to_string(),
            reservation_id: rid.to_string(),
            updated_at: "2026-01-01T00:00:01.000Z".to_string(),
            guard: SeatGuard::AvailableOrOwnedBy(rid.to_string()),
        }
    }

    #[tokio::test]
    async fn guarded_decrement_is_a_cas() {
        let store = MemoryStorePort::new();
        store.put_inventory(&inv("evt_1", 10, 0, 10)).await.unwrap();

        store
            .update_inventory(
                "evt_1",
                -3,
                InventoryGuard::RemainingAtVersion {
                    min_remaining: 3,
                    version: 0,
                },
                "2026-01-01T00:00:01.000Z",
            )
            .await
            .unwrap();

        let row = store.inventory("evt_1").unwrap();
        assert_eq!(row.remaining, 7);
        assert_eq!(row.version, 1);

        // Stale version misses.
        let err = store
            .update_inventory(
                "evt_1",
                -1,
                InventoryGuard::RemainingAtVersion {
                    min_remaining: 1,
                    version: 0,
                },
                "2026-01-01T00:00:02.000Z",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed { .. }));
        assert_eq!(store.inventory("evt_1").unwrap().remaining, 7);
    }

    #[tokio::test]
    async fn insufficient_remaining_misses_the_guard() {
        let store = MemoryStorePort::new();
        store.put_inventory(&inv("evt_1", 2, 5, 10)).await.unwrap();

        let err = store
            .update_inventory(
                "evt_1",
                -3,
                InventoryGuard::RemainingAtVersion {
                    min_remaining: 3,
                    version: 5,
                },
                "2026-01-01T00:00:01.000Z",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed { .. }));

        let row = store.inventory("evt_1").unwrap();
        assert_eq!((row.remaining, row.version), (2, 5));
    }

    #[tokio::test]
    async fn unconditional_increment_clamps_at_capacity() {
        let store = MemoryStorePort::new();
        store.put_inventory(&inv("evt_1", 9, 3, 10)).await.unwrap();

        store
            .update_inventory(
                "evt_1",
                4,
                InventoryGuard::Unconditional,
                "2026-01-01T00:00:01.000Z",
            )
            .await
            .unwrap();

        let row = store.inventory("evt_1").unwrap();
        assert_eq!(row.remaining, 10);
        // Unconditional updates never bump the optimistic-lock counter.
        assert_eq!(row.version, 3);
    }

    #[tokio::test]
    async fn transact_aborts_whole_batch_when_one_leg_fails() {
        let store = MemoryStorePort::new();
        store
            .put_seat(&seat("evt_1", "A-12", "HOLD", "rsv_d"))
            .await
            .unwrap();
        store
            .put_seat(&seat("evt_1", "A-13", "AVAILABLE", ""))
            .await
            .unwrap();

        let err = store
            .transact_write_seats(&[sold_write("A-12", "rsv_e"), sold_write("A-13", "rsv_e")])
            .await
            .unwrap_err();
        match err {
            StoreError::ConditionFailed { unavailable } => {
                assert_eq!(unavailable, vec!["A-12".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // No partial commit.
        assert_eq!(store.seat("evt_1", "A-12").unwrap().status, "HOLD");
        assert_eq!(store.seat("evt_1", "A-13").unwrap().status, "AVAILABLE");
    }

    #[tokio::test]
    async fn transact_admits_the_holding_reservation() {
        let store = MemoryStorePort::new();
        store
            .put_seat(&seat("evt_1", "A-12", "HOLD", "rsv_d"))
            .await
            .unwrap();

        store
            .transact_write_seats(&[sold_write("A-12", "rsv_d")])
            .await
            .unwrap();
        let row = store.seat("evt_1", "A-12").unwrap();
        assert_eq!(row.status, "SOLD");
        assert_eq!(row.reservation_id, "rsv_d");
    }

    #[tokio::test]
    async fn held_by_legs_skip_instead_of_aborting() {
        let store = MemoryStorePort::new();
        store
            .put_seat(&seat("evt_1", "A-12", "SOLD", "rsv_c"))
            .await
            .unwrap();
        store
            .put_seat(&seat("evt_1", "A-13", "HOLD", "rsv_c"))
            .await
            .unwrap();

        let release = |seat_id: &str| SeatWrite {
            event_id: "evt_1".to_string(),
            seat_id: seat_id.to_string(),
            status: "AVAILABLE".to_string(),
            reservation_id: String::new(),
            updated_at: "2026-01-01T00:00:01.000Z".to_string(),
            guard: SeatGuard::HeldBy("rsv_c".to_string()),
        };

        store
            .transact_write_seats(&[release("A-12"), release("A-13")])
            .await
            .unwrap();

        // SOLD seat untouched, HOLD seat released.
        assert_eq!(store.seat("evt_1", "A-12").unwrap().status, "SOLD");
        assert_eq!(store.seat("evt_1", "A-13").unwrap().status, "AVAILABLE");
        assert_eq!(store.seat("evt_1", "A-13").unwrap().reservation_id, "");
    }

    #[tokio::test]
    async fn idempotency_put_is_first_writer_wins_until_expiry() {
        let store = MemoryStorePort::new();
        let row = IdempotencyRow {
            k: "commit:rsv_a".to_string(),
            op_result: "ord_aaaaaaaaaaaa".to_string(),
            event_id: "evt_1".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            expires_at: 1_000,
        };
        store.put_idempotency_if_absent(&row, 500).await.unwrap();

        let mut dup = row.clone();
        dup.op_result = "ord_bbbbbbbbbbbb".to_string();
        let err = store.put_idempotency_if_absent(&dup, 500).await.unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed { .. }));

        // Expired records are replaceable and read as absent.
        assert!(store.get_idempotency("commit:rsv_a", 1_000).await.unwrap().is_none());
        store.put_idempotency_if_absent(&dup, 1_000).await.unwrap();
        let read = store
            .get_idempotency("commit:rsv_a", 999)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.op_result, "ord_bbbbbbbbbbbb");
    }

    #[tokio::test]
    async fn scrubber_removes_only_expired_rows() {
        let store = MemoryStorePort::new();
        for (k, exp) in [("commit:a", 100), ("commit:b", 200), ("release:a", 50)] {
            store
                .put_idempotency_if_absent(
                    &IdempotencyRow {
                        k: k.to_string(),
                        op_result: "x".to_string(),
                        event_id: "evt_1".to_string(),
                        created_at: "2026-01-01T00:00:00.000Z".to_string(),
                        expires_at: exp,
                    },
                    0,
                )
                .await
                .unwrap();
        }

        let removed = store.delete_expired_idempotency(100).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.idempotency_len(), 1);
    }
}
