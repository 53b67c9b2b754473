use tracing::instrument;

use crate::error::EngineError;
use crate::inventory::model::SeatStatus;
use crate::metrics::Counters;

use super::{Availability, CheckRequest, Demand, ReservationEngine, require_id};

impl ReservationEngine {
    /// Advisory availability read. No lock, no write: state may change
    /// between this answer and a commit, and only the commit's conditional
    /// predicate is authoritative.
    #[instrument(skip(self, req), target = "engine", fields(event_id = %req.event_id))]
    pub async fn check(&self, req: CheckRequest) -> Result<Availability, EngineError> {
        require_id(&req.event_id, "event_id")?;
        let demand = Demand::from_parts(req.qty, req.seat_ids.clone())?;

        let availability = match &demand {
            Demand::Quantity(qty) => {
                let inv = self
                    .repo()
                    .get_inventory(&req.event_id)
                    .await?
                    .ok_or_else(|| {
                        EngineError::NotFound(format!("inventory for event {}", req.event_id))
                    })?;
                Availability {
                    available: inv.can_satisfy(*qty),
                    unavailable_seats: vec![],
                }
            }
            Demand::Seats(seat_ids) => {
                let seats = self.repo().get_seats(&req.event_id, seat_ids).await?;
                // Missing rows and non-AVAILABLE rows are both "not
                // available" to a prospective buyer.
                let unavailable: Vec<String> = seat_ids
                    .iter()
                    .filter(|id| {
                        !seats
                            .iter()
                            .any(|s| &s.seat_id == *id && s.status == SeatStatus::Available)
                    })
                    .cloned()
                    .collect();
                Availability {
                    available: unavailable.is_empty(),
                    unavailable_seats: unavailable,
                }
            }
        };

        Counters::incr(&self.counters().checks_served);
        Ok(availability)
    }
}
