use tracing::{instrument, warn};

use crate::error::EngineError;
use crate::idempotency::ClaimOutcome;
use crate::inventory::model::Operation;
use crate::metrics::Counters;
use crate::store::port::StoreError;

use super::{CommitReceipt, CommitRequest, Demand, ReservationEngine, mint_order_id, require_id};

impl ReservationEngine {
    /// Commits a reservation in quantity or seat mode.
    ///
    /// Order of operations: replay lookup, claim, then the guarded
    /// mutation. The claim is written *before* the mutation so two racing
    /// commits for one reservation can never both decrement; the loser
    /// replays the winner's order id without touching inventory.
    #[instrument(
        skip(self, req),
        target = "engine",
        fields(event_id = %req.event_id, reservation_id = %req.reservation_id)
    )]
    pub async fn commit(&self, req: CommitRequest) -> Result<CommitReceipt, EngineError> {
        require_id(&req.reservation_id, "reservation_id")?;
        require_id(&req.event_id, "event_id")?;
        let demand = Demand::from_parts(req.qty, req.seat_ids.clone())?;

        if let Some(rec) = self
            .idempotency()
            .lookup(Operation::Commit, &req.reservation_id)
            .await?
        {
            Counters::incr(&self.counters().commits_replayed);
            return Ok(CommitReceipt {
                order_id: rec.result,
            });
        }

        let order_id = mint_order_id();
        match self
            .idempotency()
            .claim(
                Operation::Commit,
                &req.reservation_id,
                &req.event_id,
                &order_id,
            )
            .await
        {
            Ok(ClaimOutcome::Won) => {}
            Ok(ClaimOutcome::Lost(existing)) => {
                Counters::incr(&self.counters().claims_lost);
                Counters::incr(&self.counters().commits_replayed);
                return Ok(CommitReceipt {
                    order_id: existing.result,
                });
            }
            Err(StoreError::ConditionFailed { .. }) => {
                // The winning record expired between the put and the
                // re-read; the caller retries from the top.
                return Err(EngineError::Conflict(
                    "idempotency record expired mid-claim".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        let mutation = match &demand {
            Demand::Quantity(qty) => self.commit_quantity(&req.event_id, *qty).await,
            Demand::Seats(seats) => {
                self.commit_seats(&req.event_id, seats, &req.reservation_id)
                    .await
            }
        };

        match mutation {
            Ok(()) => {
                Counters::incr(&self.counters().commits_confirmed);
                Ok(CommitReceipt { order_id })
            }
            Err(e) if e.is_determinate_rejection() => {
                // The store rejected the write outright; the claim must not
                // replay a confirmation that never happened.
                if let Err(del) = self
                    .idempotency()
                    .forget(Operation::Commit, &req.reservation_id)
                    .await
                {
                    warn!(
                        target: "engine",
                        reservation_id = %req.reservation_id,
                        error = %del,
                        "failed to roll back commit claim; replays will be wrong until TTL expiry"
                    );
                }
                Err(e)
            }
            // Indeterminate: the write may have landed. The claim stays so
            // the caller's retry resolves to this order id instead of
            // attempting a second decrement.
            Err(e) => Err(e),
        }
    }

    async fn commit_quantity(&self, event_id: &str, qty: i64) -> Result<(), EngineError> {
        let inv = self
            .repo()
            .get_inventory(event_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("inventory for event {event_id}")))?;

        match self
            .repo()
            .decrement_remaining(event_id, qty, inv.version)
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::ConditionFailed { .. }) => {
                // Insufficient stock and a lost version race are
                // indistinguishable at the store layer; re-read to classify.
                let current = self
                    .repo()
                    .get_inventory(event_id)
                    .await?
                    .ok_or_else(|| {
                        EngineError::NotFound(format!("inventory for event {event_id}"))
                    })?;
                if current.remaining < qty {
                    Counters::incr(&self.counters().commits_insufficient);
                    Err(EngineError::InsufficientInventory {
                        remaining: current.remaining,
                        requested: qty,
                    })
                } else {
                    Counters::incr(&self.counters().commits_conflict);
                    Err(EngineError::Conflict(format!(
                        "inventory version moved past {} for event {event_id}",
                        inv.version
                    )))
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn commit_seats(
        &self,
        event_id: &str,
        seat_ids: &[String],
        reservation_id: &str,
    ) -> Result<(), EngineError> {
        let seats = self.repo().get_seats(event_id, seat_ids).await?;

        let missing: Vec<String> = seat_ids
            .iter()
            .filter(|id| !seats.iter().any(|s| &s.seat_id == *id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::NotFound(format!(
                "seats not provisioned for event {event_id}: {missing:?}"
            )));
        }

        // Advisory precheck so the caller sees every offender, not just the
        // first leg the transaction would trip on. Scan order is irrelevant;
        // the transactional write below is what decides.
        let offending: Vec<String> = seats
            .iter()
            .filter(|s| !s.commitable_by(reservation_id))
            .map(|s| s.seat_id.clone())
            .collect();
        if !offending.is_empty() {
            Counters::incr(&self.counters().commits_seat_rejected);
            return Err(EngineError::SeatUnavailable { seats: offending });
        }

        match self
            .repo()
            .mark_seats_sold(event_id, seat_ids, reservation_id)
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::ConditionFailed { unavailable }) => {
                Counters::incr(&self.counters().commits_seat_rejected);
                Err(EngineError::SeatUnavailable { seats: unavailable })
            }
            Err(e) => Err(e.into()),
        }
    }
}
