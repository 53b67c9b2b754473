//! gRPC facade: translates wire messages into engine calls and engine
//! errors into canonical status codes. The only non-trivial job here is the
//! error mapping; everything domain-shaped lives in `engine`.

pub mod service;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tonic::transport::Server;
use turnstile_proto::inventory::v1::inventory_server::InventoryServer;

use crate::config::AppConfig;
use crate::engine::ReservationEngine;
use crate::error::EngineError;

pub use service::InventoryService;

/// Canonical status mapping:
///
/// | engine error            | status             | client action           |
/// |-------------------------|--------------------|-------------------------|
/// | InsufficientInventory   | ABORTED            | do not retry            |
/// | SeatUnavailable         | ABORTED            | do not retry            |
/// | Conflict                | ABORTED            | retry with jitter       |
/// | NotFound                | NOT_FOUND          | do not retry            |
/// | InvalidArgument         | INVALID_ARGUMENT   | fix request             |
/// | DeadlineExceeded        | DEADLINE_EXCEEDED  | retry, idempotency-safe |
/// | Internal                | INTERNAL           | retry with backoff      |
impl From<EngineError> for tonic::Status {
    fn from(e: EngineError) -> Self {
        match &e {
            EngineError::InsufficientInventory { .. }
            | EngineError::SeatUnavailable { .. }
            | EngineError::Conflict(_) => tonic::Status::aborted(e.to_string()),
            EngineError::NotFound(_) => tonic::Status::not_found(e.to_string()),
            EngineError::InvalidArgument(_) => tonic::Status::invalid_argument(e.to_string()),
            EngineError::DeadlineExceeded => tonic::Status::deadline_exceeded(e.to_string()),
            EngineError::Internal(_) => tonic::Status::internal(e.to_string()),
        }
    }
}

pub async fn serve(
    engine: Arc<ReservationEngine>,
    cfg: &AppConfig,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], cfg.server_port).into();
    let service = InventoryService::new(engine, cfg.server_timeout, cfg.server_max_concurrency);

    tracing::info!(%addr, "gRPC server listening");

    Server::builder()
        .add_service(InventoryServer::new(service))
        .serve_with_shutdown(addr, shutdown)
        .await?;

    Ok(())
}
