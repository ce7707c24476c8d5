//! # escrow-engine - Pooled-Funds Escrow
//!
//! A balance-accounting and authorization state machine: participants
//! deposit native currency into a shared pool, the privileged creator can
//! close the pool toward a payout address or terminate it, and after close
//! participants convert their frozen deposit records into a pro-rata share
//! of an attached token supply.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Conservation: live-balance sum == total deposits == held custody | `domain/invariants.rs` - `check_conservation()` |
//! | Frozen record sum == frozen total | `domain/invariants.rs` - `check_frozen_conservation()` |
//! | Terminated pool is drained | `domain/invariants.rs` - `check_terminated_drained()` |
//! | Token only on a closed pool | `domain/invariants.rs` - `check_token_lifecycle()` |
//!
//! ## Lifecycle
//!
//! ```text
//! [Open] ──close / close_allow_all──→ [Closed] ──kill──→ [Terminated]
//!    │                                                         ↑
//!    └────────────────────── kill ──────────────────────────────┘
//! ```
//!
//! Transitions are one-way; `Terminated` is absorbing. A failed payout
//! transfer rolls the close back entirely, so an unpayable recipient can
//! never lock the pool.
//!
//! ## Error Policy
//!
//! Every precondition is validated before any mutation; a returned error
//! means the call had no observable effect. The two idempotent no-ops
//! (double refund, double claim) succeed with a zero amount.
//!
//! ## Usage Example
//!
//! ```ignore
//! use escrow_engine::prelude::*;
//!
//! let service = create_test_service(creator);
//! service.deposit(buyer, 5).await?;
//! service.close_allow_all(creator, payout).await?;
//! service.set_token(creator, token).await?;
//! let share = service.claim(buyer).await?;
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{Lifecycle, Pool, SweepPlan};

    // Value objects
    pub use crate::domain::value_objects::{Address, Amount, TokenUnits};

    // Ledger
    pub use crate::domain::ledger::Ledger;

    // Domain services
    pub use crate::domain::services::{pro_rata_share, sweep_partition};

    // Invariants
    pub use crate::domain::invariants::{
        check_all_invariants, InvariantCheckResult, InvariantViolation,
    };

    // Ports
    pub use crate::ports::inbound::{CloseOutcome, EscrowApi, PoolRequest};
    pub use crate::ports::outbound::{FundsGateway, TokenGateway};

    // Events
    pub use crate::events::{
        DepositReceived, EscrowEvent, PoolClosed, PoolTerminated, RefundIssued, TokenAttached,
        TokensClaimed,
    };

    // Errors
    pub use crate::errors::{EscrowError, LedgerError, TokenError, TransferError};

    // Adapters
    pub use crate::adapters::{InMemoryBank, InMemoryToken};

    // Service
    pub use crate::service::{create_test_service, EscrowService, ServiceConfig, ServiceStats};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// TESTS
// =============================================================================
