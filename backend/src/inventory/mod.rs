pub mod model;
pub mod repository;

pub use model::{
    IdempotencyKey, IdempotencyRecord, Inventory, Operation, Seat, SeatStatus,
};
pub use repository::InventoryRepository;
