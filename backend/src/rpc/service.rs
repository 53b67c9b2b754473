use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tonic::{Request, Response, Status};

use turnstile_proto::inventory::v1::inventory_server::Inventory;
use turnstile_proto::inventory::v1::{
    CheckAvailabilityRequest, CheckAvailabilityResponse, CommitReservationRequest,
    CommitReservationResponse, ReleaseHoldRequest, ReleaseHoldResponse,
};

use crate::engine::{
    CheckRequest, CommitRequest, ReleaseRequest, ReservationEngine, STATUS_CONFIRMED,
    STATUS_RELEASED,
};
use crate::error::EngineError;
use crate::metrics::Counters;

pub struct InventoryService {
    engine: Arc<ReservationEngine>,
    limiter: Arc<Semaphore>,
    call_timeout: Duration,
}

impl InventoryService {
    pub fn new(
        engine: Arc<ReservationEngine>,
        call_timeout: Duration,
        max_concurrency: usize,
    ) -> Self {
        Self {
            engine,
            limiter: Arc::new(Semaphore::new(max_concurrency)),
            call_timeout,
        }
    }

    /// Above the cap new calls are rejected, never queued: a queue would
    /// only convert overload into deadline misses.
    fn admit(&self) -> Result<tokio::sync::OwnedSemaphorePermit, Status> {
        self.limiter.clone().try_acquire_owned().map_err(|_| {
            Counters::incr(&self.engine.counters().rpc_over_capacity);
            Status::resource_exhausted("concurrent-request cap reached; retry later")
        })
    }

    /// On expiry the in-flight store write is indeterminate; the client's
    /// retry resolves it through the idempotency protocol.
    async fn with_deadline<T>(
        &self,
        fut: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<T, Status> {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Err(_) => {
                Counters::incr(&self.engine.counters().rpc_deadline_hits);
                Err(Status::deadline_exceeded(
                    "per-call deadline exceeded; retry is safe under idempotency",
                ))
            }
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => {
                if matches!(e, EngineError::DeadlineExceeded) {
                    Counters::incr(&self.engine.counters().rpc_deadline_hits);
                }
                Err(e.into())
            }
        }
    }
}

#[tonic::async_trait]
impl Inventory for InventoryService {
    async fn check_availability(
        &self,
        request: Request<CheckAvailabilityRequest>,
    ) -> Result<Response<CheckAvailabilityResponse>, Status> {
        let _permit = self.admit()?;
        let msg = request.into_inner();

        let out = self
            .with_deadline(self.engine.check(CheckRequest {
                event_id: msg.event_id,
                qty: msg.qty,
                seat_ids: msg.seat_ids,
            }))
            .await?;

        Ok(Response::new(CheckAvailabilityResponse {
            available: out.available,
            unavailable_seats: out.unavailable_seats,
        }))
    }

    async fn commit_reservation(
        &self,
        request: Request<CommitReservationRequest>,
    ) -> Result<Response<CommitReservationResponse>, Status> {
        let _permit = self.admit()?;
        let msg = request.into_inner();

        let receipt = self
            .with_deadline(self.engine.commit(CommitRequest {
                reservation_id: msg.reservation_id,
                event_id: msg.event_id,
                qty: msg.qty,
                seat_ids: msg.seat_ids,
                payment_intent_id: msg.payment_intent_id,
            }))
            .await?;

        Ok(Response::new(CommitReservationResponse {
            order_id: receipt.order_id,
            status: STATUS_CONFIRMED.to_string(),
        }))
    }

    async fn release_hold(
        &self,
        request: Request<ReleaseHoldRequest>,
    ) -> Result<Response<ReleaseHoldResponse>, Status> {
        let _permit = self.admit()?;
        let msg = request.into_inner();

        self.with_deadline(self.engine.release(ReleaseRequest {
            reservation_id: msg.reservation_id,
            event_id: msg.event_id,
            qty: msg.qty,
            seat_ids: msg.seat_ids,
        }))
        .await?;

        Ok(Response::new(ReleaseHoldResponse {
            status: STATUS_RELEASED.to_string(),
        }))
    }
}
