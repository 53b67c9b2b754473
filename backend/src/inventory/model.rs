use chrono::{DateTime, Utc};

/// Seat lifecycle. SOLD is terminal: this engine never transitions a seat
/// out of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeatStatus {
    Available,
    Hold,
    Sold,
}

impl SeatStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Hold => "HOLD",
            Self::Sold => "SOLD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(Self::Available),
            "HOLD" => Some(Self::Hold),
            "SOLD" => Some(Self::Sold),
            _ => None,
        }
    }
}

/// Quantity-mode inventory for one event.
/// `remaining` counts sellable units; `version` is the optimistic-lock
/// counter a successful commit bumps by exactly 1.
#[derive(Clone, Debug)]
pub struct Inventory {
    pub event_id: String,
    pub remaining: i64,
    pub version: i64,
    pub total_seats: i64,
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    pub fn can_satisfy(&self, qty: i64) -> bool {
        self.remaining >= qty
    }
}

/// One seat of one event. `reservation_id` is present iff the seat is
/// HOLD or SOLD.
#[derive(Clone, Debug)]
pub struct Seat {
    pub event_id: String,
    pub seat_id: String,
    pub status: SeatStatus,
    pub reservation_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Seat {
    /// True when a commit by `rid` may take this seat: it is free, or this
    /// same reservation already holds or bought it (which is what makes a
    /// commit retry re-succeed instead of racing itself).
    pub fn commitable_by(&self, rid: &str) -> bool {
        match self.status {
            SeatStatus::Available => true,
            SeatStatus::Hold | SeatStatus::Sold => self.reservation_id.as_deref() == Some(rid),
        }
    }

    /// True when a release by `rid` returns this seat to AVAILABLE. SOLD
    /// seats are deliberately excluded: the sale is irreversible from this
    /// engine's perspective.
    pub fn releasable_by(&self, rid: &str) -> bool {
        self.status == SeatStatus::Hold && self.reservation_id.as_deref() == Some(rid)
    }
}

/// The two idempotency-gated operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Commit,
    Release,
}

impl Operation {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Release => "release",
        }
    }
}

/// Storage key of an idempotency record: `{operation}:{reservation_id}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdempotencyKey {
    pub operation: Operation,
    pub reservation_id: String,
}

impl IdempotencyKey {
    pub fn new(operation: Operation, reservation_id: impl Into<String>) -> Self {
        Self {
            operation,
            reservation_id: reservation_id.into(),
        }
    }

    pub fn storage_key(&self) -> String {
        format!("{}:{}", self.operation.prefix(), self.reservation_id)
    }
}

/// Replayable terminal outcome of an operation. `result` is the issued
/// order id for commits and the literal `RELEASED` for releases; it is
/// stable for the whole TTL window.
#[derive(Clone, Debug)]
pub struct IdempotencyRecord {
    pub key: IdempotencyKey,
    pub result: String,
    pub event_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at_epoch: i64,
}
