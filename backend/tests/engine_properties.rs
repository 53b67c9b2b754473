//! Property checks for the engine's universal invariants: zero oversell,
//! idempotence, monotonic sale, version monotonicity, release idempotence.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use backend::engine::{CommitRequest, ReleaseRequest, ReservationEngine};
use backend::error::EngineError;
use backend::idempotency::IdempotencyLayer;
use backend::inventory::model::SeatStatus;
use backend::inventory::repository::InventoryRepository;
use backend::metrics::Counters;
use backend::store::port::{InventoryRow, SeatRow, StorePort};
use backend::store::port_memory::MemoryStorePort;
use backend::time;

fn engine_over(store: Arc<MemoryStorePort>) -> Arc<ReservationEngine> {
    let repo = Arc::new(InventoryRepository::new(store));
    let idempotency = IdempotencyLayer::new(repo.clone(), Duration::from_secs(300), 4096);
    Arc::new(ReservationEngine::new(
        repo,
        idempotency,
        Counters::default(),
    ))
}

fn rt() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

async fn seed_inventory(store: &MemoryStorePort, event_id: &str, remaining: i64) {
    store
        .put_inventory(&InventoryRow {
            event_id: event_id.to_string(),
            remaining,
            version: 0,
            total_seats: remaining,
            updated_at: time::now_rfc3339(),
        })
        .await
        .unwrap();
}

fn commit_req(rsv: &str, event: &str, qty: i32, seats: &[String]) -> CommitRequest {
    CommitRequest {
        reservation_id: rsv.to_string(),
        event_id: event.to_string(),
        qty,
        seat_ids: seats.to_vec(),
        payment_intent_id: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Concurrent quantity commits with total demand above stock must sell
    /// exactly the stock that existed, never more.
    #[test]
    fn zero_oversell_under_concurrent_commits(
        initial in 1i64..32,
        qtys in prop::collection::vec(1i32..6, 1..12),
    ) {
        rt().block_on(async move {
            let store = Arc::new(MemoryStorePort::new());
            seed_inventory(&store, "evt_p", initial).await;
            let engine = engine_over(store.clone());

            let mut set = tokio::task::JoinSet::new();
            for (i, qty) in qtys.iter().copied().enumerate() {
                let engine = Arc::clone(&engine);
                set.spawn(async move {
                    let rsv = format!("rsv_{i}");
                    loop {
                        match engine.commit(commit_req(&rsv, "evt_p", qty, &[])).await {
                            Ok(_) => return i64::from(qty),
                            Err(EngineError::Conflict(_)) => continue,
                            Err(EngineError::InsufficientInventory { .. }) => return 0,
                            Err(other) => panic!("unexpected error: {other:?}"),
                        }
                    }
                });
            }

            let mut sold = 0;
            while let Some(res) = set.join_next().await {
                sold += res.unwrap();
            }

            let row = store.inventory("evt_p").unwrap();
            assert!(sold <= initial, "oversold: {sold} of {initial}");
            assert_eq!(row.remaining, initial - sold);
            assert!(row.remaining >= 0);
        });
    }

    /// Any number of identical commits yields exactly one order id and one
    /// decrement.
    #[test]
    fn replayed_commits_are_idempotent(
        initial in 1i64..32,
        qty in 1i32..8,
        replays in 1usize..6,
    ) {
        prop_assume!(i64::from(qty) <= initial);
        rt().block_on(async move {
            let store = Arc::new(MemoryStorePort::new());
            seed_inventory(&store, "evt_p", initial).await;
            let engine = engine_over(store.clone());

            let first = engine
                .commit(commit_req("rsv_fixed", "evt_p", qty, &[]))
                .await
                .unwrap();
            for _ in 0..replays {
                let next = engine
                    .commit(commit_req("rsv_fixed", "evt_p", qty, &[]))
                    .await
                    .unwrap();
                assert_eq!(next.order_id, first.order_id);
            }

            let row = store.inventory("evt_p").unwrap();
            assert_eq!(row.remaining, initial - i64::from(qty));
            assert_eq!(row.version, 1);
        });
    }

    /// No interleaving of commits and releases ever takes a seat out of
    /// SOLD, and version never decreases.
    #[test]
    fn sold_is_terminal_and_version_monotone(
        ops in prop::collection::vec((0u8..2, 0usize..4, 0usize..6), 1..24),
    ) {
        rt().block_on(async move {
            let store = Arc::new(MemoryStorePort::new());
            seed_inventory(&store, "evt_p", 16).await;
            let seat_ids: Vec<String> = (0..4).map(|i| format!("S-{i}")).collect();
            for id in &seat_ids {
                store
                    .put_seat(&SeatRow {
                        event_id: "evt_p".to_string(),
                        seat_id: id.clone(),
                        status: SeatStatus::Available.as_str().to_string(),
                        reservation_id: String::new(),
                        updated_at: time::now_rfc3339(),
                    })
                    .await
                    .unwrap();
            }
            let engine = engine_over(store.clone());

            let mut sold_to: Vec<Option<String>> = vec![None; seat_ids.len()];
            let mut last_version = 0i64;

            for (op, seat_idx, actor) in ops {
                let rsv = format!("rsv_{actor}");
                let seat = &seat_ids[seat_idx];
                match op {
                    0 => {
                        let _ = engine
                            .commit(commit_req(&rsv, "evt_p", 0, std::slice::from_ref(seat)))
                            .await;
                    }
                    _ => {
                        let _ = engine
                            .release(ReleaseRequest {
                                reservation_id: rsv.clone(),
                                event_id: "evt_p".to_string(),
                                qty: 0,
                                seat_ids: vec![seat.clone()],
                            })
                            .await;
                    }
                }

                // Monotonic sale: once SOLD, forever SOLD to the same buyer.
                for (i, id) in seat_ids.iter().enumerate() {
                    let row = store.seat("evt_p", id).unwrap();
                    if let Some(owner) = &sold_to[i] {
                        assert_eq!(row.status, "SOLD", "seat {id} left SOLD");
                        assert_eq!(&row.reservation_id, owner, "seat {id} changed buyer");
                    } else if row.status == "SOLD" {
                        sold_to[i] = Some(row.reservation_id.clone());
                    }
                }

                // Version monotonicity on the quantity row.
                let version = store.inventory("evt_p").unwrap().version;
                assert!(version >= last_version, "version went backwards");
                last_version = version;
            }
        });
    }

    /// A release followed by any number of repeats has the effect of a
    /// single release.
    #[test]
    fn releases_are_idempotent(
        initial in 4i64..32,
        qty in 1i32..4,
        repeats in 1usize..6,
    ) {
        rt().block_on(async move {
            let store = Arc::new(MemoryStorePort::new());
            seed_inventory(&store, "evt_p", initial).await;
            let engine = engine_over(store.clone());

            engine
                .commit(commit_req("rsv_a", "evt_p", qty, &[]))
                .await
                .unwrap();
            let after_commit = store.inventory("evt_p").unwrap().remaining;

            engine
                .release(ReleaseRequest {
                    reservation_id: "rsv_a".to_string(),
                    event_id: "evt_p".to_string(),
                    qty,
                    seat_ids: vec![],
                })
                .await
                .unwrap();
            let after_first = store.inventory("evt_p").unwrap();

            for _ in 0..repeats {
                engine
                    .release(ReleaseRequest {
                        reservation_id: "rsv_a".to_string(),
                        event_id: "evt_p".to_string(),
                        qty,
                        seat_ids: vec![],
                    })
                    .await
                    .unwrap();
                let row = store.inventory("evt_p").unwrap();
                assert_eq!(row.remaining, after_first.remaining);
                assert_eq!(row.version, after_first.version);
            }

            assert_eq!(after_first.remaining, after_commit + i64::from(qty));
        });
    }
}
