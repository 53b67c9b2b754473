use thiserror::Error;

use crate::store::port::StoreError;

/// Caller-visible failures of the reservation engine. The RPC facade maps
/// each variant onto a canonical status code; see `rpc`.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("insufficient inventory: remaining {remaining}, requested {requested}")]
    InsufficientInventory { remaining: i64, requested: i64 },

    #[error("seats unavailable: {seats:?}")]
    SeatUnavailable { seats: Vec<String> },

    /// Lost an optimistic-concurrency race while stock was still sufficient.
    /// Safe to retry with jitter.
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("internal store failure: {0}")]
    Internal(String),
}

impl EngineError {
    /// True when the store definitively rejected or never saw the write, so
    /// nothing was persisted and a pre-claimed idempotency record may be
    /// rolled back. Timeouts and backend failures are indeterminate: the
    /// write may have landed, so the claim must stay.
    pub fn is_determinate_rejection(&self) -> bool {
        matches!(
            self,
            Self::InsufficientInventory { .. }
                | Self::SeatUnavailable { .. }
                | Self::Conflict(_)
                | Self::NotFound(_)
                | Self::InvalidArgument(_)
        )
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            // Callers that can classify a predicate failure more precisely
            // (insufficient vs conflict vs seat rejection) match on
            // `StoreError::ConditionFailed` before converting.
            StoreError::ConditionFailed { unavailable } if !unavailable.is_empty() => {
                Self::SeatUnavailable { seats: unavailable }
            }
            StoreError::ConditionFailed { .. } => {
                Self::Conflict("conditional predicate failed".to_string())
            }
            StoreError::NotFound => Self::NotFound("record not found".to_string()),
            StoreError::Timeout => Self::DeadlineExceeded,
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}
