use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility. Cloning shares the
/// underlying atomics.
#[derive(Clone, Default)]
pub struct Counters {
    pub commits_confirmed: Arc<AtomicU64>,
    pub commits_replayed: Arc<AtomicU64>,
    pub commits_insufficient: Arc<AtomicU64>,
    pub commits_conflict: Arc<AtomicU64>,
    pub commits_seat_rejected: Arc<AtomicU64>,

    pub releases_applied: Arc<AtomicU64>,
    pub releases_replayed: Arc<AtomicU64>,

    pub checks_served: Arc<AtomicU64>,

    pub claims_lost: Arc<AtomicU64>,

    pub rpc_over_capacity: Arc<AtomicU64>,
    pub rpc_deadline_hits: Arc<AtomicU64>,
}

impl Counters {
    pub fn incr(counter: &Arc<AtomicU64>) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view for the periodic metrics log line.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        let read = |c: &Arc<AtomicU64>| c.load(Ordering::Relaxed);
        vec![
            ("commits_confirmed", read(&self.commits_confirmed)),
            ("commits_replayed", read(&self.commits_replayed)),
            ("commits_insufficient", read(&self.commits_insufficient)),
            ("commits_conflict", read(&self.commits_conflict)),
            ("commits_seat_rejected", read(&self.commits_seat_rejected)),
            ("releases_applied", read(&self.releases_applied)),
            ("releases_replayed", read(&self.releases_replayed)),
            ("checks_served", read(&self.checks_served)),
            ("claims_lost", read(&self.claims_lost)),
            ("rpc_over_capacity", read(&self.rpc_over_capacity)),
            ("rpc_deadline_hits", read(&self.rpc_deadline_hits)),
        ]
    }
}
