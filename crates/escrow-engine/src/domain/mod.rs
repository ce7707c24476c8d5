//! # Domain Layer (Inner Hexagon)
//!
//! Pure business logic for the escrow pool.
//! NO I/O, NO async, NO external dependencies.
//!
//! The `Pool` aggregate owns all mutable state; operations needing an
//! outbound transfer are split into pure planning and infallible commit
//! steps so the service layer can roll back by simply not committing.

pub mod entities;
pub mod invariants;
pub mod ledger;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use invariants::*;
pub use ledger::*;
pub use services::*;
pub use value_objects::*;
