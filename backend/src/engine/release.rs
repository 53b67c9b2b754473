use tracing::{instrument, warn};

use crate::error::EngineError;
use crate::idempotency::ClaimOutcome;
use crate::inventory::model::Operation;
use crate::metrics::Counters;
use crate::store::port::StoreError;

use super::{Demand, ReleaseRequest, ReservationEngine, STATUS_RELEASED, require_id};

impl ReservationEngine {
    /// Releases a hold. Idempotent: repeated calls answer `RELEASED` and
    /// leave the store unchanged after the first.
    ///
    /// Quantity mode is gated by the release idempotency record, because an
    /// unconditional restock applied twice would inflate stock. Seat mode is
    /// naturally idempotent (the store guard only matches seats still HOLD
    /// by this reservation), so its record is a post-mutation receipt,
    /// written best-effort.
    #[instrument(
        skip(self, req),
        target = "engine",
        fields(event_id = %req.event_id, reservation_id = %req.reservation_id)
    )]
    pub async fn release(&self, req: ReleaseRequest) -> Result<(), EngineError> {
        require_id(&req.reservation_id, "reservation_id")?;
        require_id(&req.event_id, "event_id")?;
        let demand = Demand::from_parts(req.qty, req.seat_ids.clone())?;

        if self
            .idempotency()
            .lookup(Operation::Release, &req.reservation_id)
            .await?
            .is_some()
        {
            Counters::incr(&self.counters().releases_replayed);
            return Ok(());
        }

        match &demand {
            Demand::Quantity(qty) => self.release_quantity(&req, *qty).await,
            Demand::Seats(seats) => self.release_seats(&req, seats).await,
        }
    }

    async fn release_quantity(&self, req: &ReleaseRequest, qty: i64) -> Result<(), EngineError> {
        match self
            .idempotency()
            .claim(
                Operation::Release,
                &req.reservation_id,
                &req.event_id,
                STATUS_RELEASED,
            )
            .await
        {
            Ok(ClaimOutcome::Won) => {}
            Ok(ClaimOutcome::Lost(_)) => {
                // A concurrent duplicate already released; restocking again
                // would inflate inventory.
                Counters::incr(&self.counters().claims_lost);
                Counters::incr(&self.counters().releases_replayed);
                return Ok(());
            }
            Err(StoreError::ConditionFailed { .. }) => {
                return Err(EngineError::Conflict(
                    "idempotency record expired mid-claim".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        match self.repo().increment_remaining(&req.event_id, qty).await {
            Ok(()) => {
                Counters::incr(&self.counters().releases_applied);
                Ok(())
            }
            Err(StoreError::NotFound) => {
                let e = EngineError::NotFound(format!("inventory for event {}", req.event_id));
                if let Err(del) = self
                    .idempotency()
                    .forget(Operation::Release, &req.reservation_id)
                    .await
                {
                    warn!(
                        target: "engine",
                        reservation_id = %req.reservation_id,
                        error = %del,
                        "failed to roll back release claim"
                    );
                }
                Err(e)
            }
            // Indeterminate: keep the claim, the retry replays RELEASED
            // rather than restocking a second time.
            Err(e) => Err(e.into()),
        }
    }

    async fn release_seats(&self, req: &ReleaseRequest, seat_ids: &[String]) -> Result<(), EngineError> {
        let seats = self.repo().get_seats(&req.event_id, seat_ids).await?;

        // Only seats this reservation still holds go back to AVAILABLE.
        // Seats owned by others or already SOLD are silently skipped; the
        // sale is irreversible from this engine's perspective.
        let held: Vec<String> = seats
            .iter()
            .filter(|s| s.releasable_by(&req.reservation_id))
            .map(|s| s.seat_id.clone())
            .collect();

        if !held.is_empty() {
            self.repo()
                .release_held_seats(&req.event_id, &held, &req.reservation_id)
                .await?;
        }

        Counters::incr(&self.counters().releases_applied);
        self.idempotency()
            .record_best_effort(
                Operation::Release,
                &req.reservation_id,
                &req.event_id,
                STATUS_RELEASED,
            )
            .await;
        Ok(())
    }
}
