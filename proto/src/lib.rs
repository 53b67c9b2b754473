//! Wire types for the Turnstile inventory service.
//!
//! The generated code is checked in; rebuild it with the `generate` feature
//! when `proto/inventory.proto` changes.

#[path = ""]
pub mod inventory {
    #[path = "turnstile.inventory.v1.rs"]
    pub mod v1;
}
