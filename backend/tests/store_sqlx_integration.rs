use std::time::Duration;

use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use uuid::Uuid;

use backend::config::TableNames;
use backend::db::schema;
use backend::store::port::{
    IdempotencyRow, InventoryGuard, InventoryRow, SeatGuard, SeatRow, SeatWrite, StoreError,
    StorePort,
};
use backend::store::port_sqlx::SqlxStorePort;

fn tables() -> TableNames {
    TableNames {
        inventory: "inventory".to_string(),
        seats: "seats".to_string(),
        idempotency: "idempotency".to_string(),
    }
}

/// Isolated, uniquely-named in-memory SQLite database. The unique name keeps
/// parallel tests from seeing each other while shared cache keeps every
/// pooled connection on the same database.
async fn setup_store() -> SqlxStorePort {
    sqlx::any::install_default_drivers();

    let db_name = Uuid::new_v4().to_string();
    let conn_str = format!("sqlite:file:{db_name}?mode=memory&cache=shared");

    let pool: AnyPool = AnyPoolOptions::new()
        .max_connections(2)
        .connect(&conn_str)
        .await
        .unwrap();

    schema::migrate(&pool, &tables()).await.unwrap();

    SqlxStorePort::new(pool, tables(), Duration::from_millis(500), 2)
}

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

#[tokio::test]
async fn inventory_round_trips_through_sql() {
    let store = setup_store().await;
    store.put_inventory(&inv("evt_1", 10, 0, 10)).await.unwrap();

    let row = store.get_inventory("evt_1").await.unwrap().unwrap();
    assert_eq!(row, inv("evt_1", 10, 0, 10));

    assert!(store.get_inventory("evt_ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn guarded_decrement_hits_only_at_the_expected_version() {
    let store = setup_store().await;
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

    let row = store.get_inventory("evt_1").await.unwrap().unwrap();
    assert_eq!((row.remaining, row.version), (7, 1));

    // Same guard again: version has moved on, the CAS must miss and leave
    // the row untouched.
    let err = store
        .update_inventory(
            "evt_1",
            -3,
            InventoryGuard::RemainingAtVersion {
                min_remaining: 3,
                version: 0,
            },
            "2026-01-01T00:00:02.000Z",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ConditionFailed { .. }));

    let row = store.get_inventory("evt_1").await.unwrap().unwrap();
    assert_eq!((row.remaining, row.version), (7, 1));
}

#[tokio::test]
async fn guarded_decrement_refuses_insufficient_stock() {
    let store = setup_store().await;
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

    let row = store.get_inventory("evt_1").await.unwrap().unwrap();
    assert_eq!((row.remaining, row.version), (2, 5));
}

#[tokio::test]
async fn unconditional_restock_clamps_and_skips_version() {
    let store = setup_store().await;
    store.put_inventory(&inv("evt_1", 9, 4, 10)).await.unwrap();

    store
        .update_inventory(
            "evt_1",
            5,
            InventoryGuard::Unconditional,
            "2026-01-01T00:00:01.000Z",
        )
        .await
        .unwrap();

    let row = store.get_inventory("evt_1").await.unwrap().unwrap();
    assert_eq!((row.remaining, row.version), (10, 4));

    let err = store
        .update_inventory(
            "evt_ghost",
            1,
            InventoryGuard::Unconditional,
            "2026-01-01T00:00:01.000Z",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn batch_get_returns_only_existing_seats() {
    let store = setup_store().await;
    store
        .put_seat(&seat("evt_1", "A-12", "AVAILABLE", ""))
        .await
        .unwrap();
    store
        .put_seat(&seat("evt_1", "A-13", "HOLD", "rsv_d"))
        .await
        .unwrap();
    store
        .put_seat(&seat("evt_2", "A-12", "SOLD", "rsv_x"))
        .await
        .unwrap();

    let mut rows = store
        .batch_get_seats(
            "evt_1",
            &[
                "A-12".to_string(),
                "A-13".to_string(),
                "Z-99".to_string(),
            ],
        )
        .await
        .unwrap();
    rows.sort_by(|a, b| a.seat_id.cmp(&b.seat_id));

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].seat_id, "A-12");
    assert_eq!(rows[0].status, "AVAILABLE");
    assert_eq!(rows[1].seat_id, "A-13");
    assert_eq!(rows[1].reservation_id, "rsv_d");
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
async fn seat_transaction_is_all_or_nothing() {
    let store = setup_store().await;
    store
        .put_seat(&seat("evt_1", "A-12", "HOLD", "rsv_d"))
        .await
        .unwrap();
    store
        .put_seat(&seat("evt_1", "A-13", "AVAILABLE", ""))
        .await
        .unwrap();

    let err = store
        .transact_write_seats(&[sold_write("A-13", "rsv_e"), sold_write("A-12", "rsv_e")])
        .await
        .unwrap_err();
    match err {
        StoreError::ConditionFailed { unavailable } => {
            assert_eq!(unavailable, vec!["A-12".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The A-13 leg ran first inside the transaction and must have been
    // rolled back with it.
    let rows = store
        .batch_get_seats("evt_1", &["A-12".to_string(), "A-13".to_string()])
        .await
        .unwrap();
    for row in rows {
        match row.seat_id.as_str() {
            "A-12" => assert_eq!(row.status, "HOLD"),
            "A-13" => assert_eq!(row.status, "AVAILABLE"),
            other => panic!("unexpected seat {other}"),
        }
    }
}

#[tokio::test]
async fn seat_transaction_admits_owner_and_is_idempotent() {
    let store = setup_store().await;
    store
        .put_seat(&seat("evt_1", "A-12", "HOLD", "rsv_d"))
        .await
        .unwrap();

    store
        .transact_write_seats(&[sold_write("A-12", "rsv_d")])
        .await
        .unwrap();
    // Replay: SOLD -> SOLD under the same reservation still satisfies the
    // predicate.
    store
        .transact_write_seats(&[sold_write("A-12", "rsv_d")])
        .await
        .unwrap();

    let rows = store
        .batch_get_seats("evt_1", &["A-12".to_string()])
        .await
        .unwrap();
    assert_eq!(rows[0].status, "SOLD");
    assert_eq!(rows[0].reservation_id, "rsv_d");
}

#[tokio::test]
async fn held_by_release_legs_skip_mismatches_inside_the_transaction() {
    let store = setup_store().await;
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
        updated_at: "2026-01-01T00:00:02.000Z".to_string(),
        guard: SeatGuard::HeldBy("rsv_c".to_string()),
    };

    store
        .transact_write_seats(&[release("A-12"), release("A-13")])
        .await
        .unwrap();

    let mut rows = store
        .batch_get_seats("evt_1", &["A-12".to_string(), "A-13".to_string()])
        .await
        .unwrap();
    rows.sort_by(|a, b| a.seat_id.cmp(&b.seat_id));
    assert_eq!(rows[0].status, "SOLD");
    assert_eq!(rows[1].status, "AVAILABLE");
    assert_eq!(rows[1].reservation_id, "");
}

#[tokio::test]
async fn idempotency_put_is_conditional_on_liveness() {
    let store = setup_store().await;
    let row = IdempotencyRow {
        k: "commit:rsv_a".to_string(),
        op_result: "ord_aaaaaaaaaaaa".to_string(),
        event_id: "evt_1".to_string(),
        created_at: "2026-01-01T00:00:00.000Z".to_string(),
        expires_at: 1_000,
    };

    store.put_idempotency_if_absent(&row, 500).await.unwrap();

    // A live record wins against any second writer.
    let mut dup = row.clone();
    dup.op_result = "ord_bbbbbbbbbbbb".to_string();
    let err = store.put_idempotency_if_absent(&dup, 500).await.unwrap_err();
    assert!(matches!(err, StoreError::ConditionFailed { .. }));
    let read = store
        .get_idempotency("commit:rsv_a", 500)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(read.op_result, "ord_aaaaaaaaaaaa");

    // Past the window the row reads as absent and is replaceable.
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
async fn delete_and_scrub_idempotency_rows() {
    let store = setup_store().await;
    for (k, exp) in [("commit:a", 100i64), ("commit:b", 9_999), ("release:a", 50)] {
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

    store.delete_idempotency("commit:b").await.unwrap();
    // Deleting an absent key is not an error.
    store.delete_idempotency("commit:b").await.unwrap();

    let removed = store.delete_expired_idempotency(100).await.unwrap();
    assert_eq!(removed, 2);
    assert!(store.get_idempotency("commit:a", 0).await.unwrap().is_none());
}
