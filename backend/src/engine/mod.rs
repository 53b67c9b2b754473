//! The reservation engine: availability checks, reservation commits and
//! hold releases over the inventory repository.
//!
//! The engine holds no in-process locks and no mutable state beyond the
//! idempotency replay cache; every fact lives in the store, and concurrent
//! commits serialize there through the conditional predicates (version CAS
//! in quantity mode, per-seat ownership predicates in seat mode).

mod check;
mod commit;
mod release;

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::EngineError;
use crate::idempotency::IdempotencyLayer;
use crate::inventory::repository::InventoryRepository;
use crate::metrics::Counters;

pub const STATUS_CONFIRMED: &str = "CONFIRMED";
pub const STATUS_RELEASED: &str = "RELEASED";

pub struct ReservationEngine {
    repo: Arc<InventoryRepository>,
    idempotency: IdempotencyLayer,
    counters: Counters,
}

impl ReservationEngine {
    pub fn new(
        repo: Arc<InventoryRepository>,
        idempotency: IdempotencyLayer,
        counters: Counters,
    ) -> Self {
        Self {
            repo,
            idempotency,
            counters,
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub(crate) fn repo(&self) -> &InventoryRepository {
        &self.repo
    }

    pub(crate) fn idempotency(&self) -> &IdempotencyLayer {
        &self.idempotency
    }
}

/// What a request acts on: a positive unit count, or a set of distinct
/// seats. Both record kinds may exist for one event; the payload decides
/// the mode per request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Demand {
    Quantity(i64),
    Seats(Vec<String>),
}

impl Demand {
    /// Mode selection. The seat branch dominates: a request naming seats is
    /// a seat-mode request even when `qty` is also set.
    pub fn from_parts(qty: i32, seat_ids: Vec<String>) -> Result<Self, EngineError> {
        if !seat_ids.is_empty() {
            let mut seen = HashSet::with_capacity(seat_ids.len());
            for id in &seat_ids {
                if id.is_empty() {
                    return Err(EngineError::InvalidArgument(
                        "seat_ids must not contain empty ids".to_string(),
                    ));
                }
                if !seen.insert(id.as_str()) {
                    return Err(EngineError::InvalidArgument(format!(
                        "duplicate seat id: {id}"
                    )));
                }
            }
            return Ok(Self::Seats(seat_ids));
        }
        if qty > 0 {
            return Ok(Self::Quantity(i64::from(qty)));
        }
        Err(EngineError::InvalidArgument(
            "either a positive qty or a non-empty seat_ids list is required".to_string(),
        ))
    }
}

#[derive(Clone, Debug)]
pub struct CommitRequest {
    pub reservation_id: String,
    pub event_id: String,
    pub qty: i32,
    pub seat_ids: Vec<String>,
    /// Opaque; not persisted on the commit path.
    pub payment_intent_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    pub order_id: String,
}

#[derive(Clone, Debug)]
pub struct ReleaseRequest {
    pub reservation_id: String,
    pub event_id: String,
    pub qty: i32,
    pub seat_ids: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct CheckRequest {
    pub event_id: String,
    pub qty: i32,
    pub seat_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Availability {
    pub available: bool,
    pub unavailable_seats: Vec<String>,
}

pub(crate) fn require_id(value: &str, field: &'static str) -> Result<(), EngineError> {
    if value.is_empty() {
        return Err(EngineError::InvalidArgument(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

/// Freshly minted order identifier: `ord_` + 12-char slug.
pub fn mint_order_id() -> String {
    let slug = Uuid::new_v4().simple().to_string();
    format!("ord_{}", &slug[..12])
}
