//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions for the escrow engine.
//! These are the interfaces between the domain and the outside world.
//!
//! - **Driving Ports (Inbound)**: `EscrowApi`
//! - **Driven Ports (Outbound)**: `FundsGateway`, `TokenGateway`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
