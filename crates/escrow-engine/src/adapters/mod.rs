//! # Adapters Layer (Outer Hexagon)
//!
//! In-memory implementations of the outbound ports, used by the unit and
//! integration suites and by local runs. Production deployments supply
//! their own gateway implementations backed by the execution environment.

pub mod bank;
pub mod token;

pub use bank::*;
pub use token::*;
