pub mod port;
pub mod port_memory;
pub mod port_sqlx;

pub use port::{
    IdempotencyRow, InventoryGuard, InventoryRow, SeatGuard, SeatRow, SeatWrite, StoreError,
    StorePort,
};
pub use port_memory::MemoryStorePort;
pub use port_sqlx::SqlxStorePort;
