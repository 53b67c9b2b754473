use std::sync::Arc;
use std::time::Duration;

use backend::{
    config::AppConfig,
    db::Db,
    engine::ReservationEngine,
    idempotency::IdempotencyLayer,
    inventory::repository::InventoryRepository,
    logger::init_tracing,
    metrics::Counters,
    rpc,
    store::port_sqlx::SqlxStorePort,
};

/// Initializes the database, runs migrations, and wires the store port and
/// repository. Inventory and seat rows themselves are seeded out-of-band.
async fn init_repository(cfg: &AppConfig) -> anyhow::Result<Arc<InventoryRepository>> {
    let db = Db::connect(&cfg.database_url).await?;
    db.migrate(&cfg.tables).await?;

    let store = Arc::new(SqlxStorePort::new(
        db.pool.clone(),
        cfg.tables.clone(),
        cfg.store_timeout,
        cfg.store_max_retries,
    ));
    Ok(Arc::new(InventoryRepository::new(store)))
}

/// The sqlx backends have no server-side TTL expiry, so a periodic task
/// deletes idempotency rows past their window. Reads already filter them,
/// this only reclaims space.
fn spawn_idempotency_scrubber(repo: Arc<InventoryRepository>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match repo.purge_expired_idempotency().await {
                Ok(removed) if removed > 0 => {
                    tracing::info!(removed, "scrubbed expired idempotency records");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "idempotency scrub failed"),
            }
        }
    });
}

fn spawn_metrics_flush(counters: Counters, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let snapshot = counters.snapshot();
            tracing::info!(target: "metrics", ?snapshot, "counter snapshot");
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sqlx::any::install_default_drivers();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    let cfg = AppConfig::from_env();
    tracing::info!(
        service = %cfg.service_name,
        version = %cfg.service_version,
        port = cfg.server_port,
        metrics_port = cfg.metrics_port,
        trace_collector = cfg.trace_collector_endpoint.as_deref().unwrap_or("none"),
        "starting inventory service"
    );

    let repo = init_repository(&cfg).await?;
    let counters = Counters::default();

    let idempotency =
        IdempotencyLayer::new(repo.clone(), cfg.idempotency_ttl, cfg.idempotency_cache_size);
    let engine = Arc::new(ReservationEngine::new(
        repo.clone(),
        idempotency,
        counters.clone(),
    ));

    spawn_idempotency_scrubber(repo, cfg.idempotency_ttl);
    spawn_metrics_flush(counters, cfg.metrics_flush_interval);

    rpc::serve(engine, &cfg, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    })
    .await
}
