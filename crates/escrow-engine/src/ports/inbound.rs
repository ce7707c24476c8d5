//! # Driving Ports (API - Inbound)
//!
//! The interfaces the escrow engine exposes to its execution environment.
//! The environment delivers value transfers tagged with a sender identity
//! and privileged operator calls; both arrive through `EscrowApi`.

use crate::domain::entities::Lifecycle;
use crate::domain::value_objects::{Address, Amount, TokenUnits};
use crate::errors::EscrowError;
use async_trait::async_trait;
use std::collections::HashSet;

// =============================================================================
// TAGGED REQUESTS
// =============================================================================

/// Explicit pool request, replacing the legacy zero-value sentinel.
///
/// The original wire contract reused a deposit of amount 0 as implicit
/// control flow meaning "refund" (or "claim" once a token was attached).
/// The public API makes the intent a tagged variant instead; the boundary
/// alias lives in [`EscrowApi::receive`], which still accepts `amount == 0`
/// and infers the variant deterministically from the pool state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolRequest {
    /// Credit a native-currency deposit.
    Deposit {
        /// Amount to credit (must be non-zero).
        amount: Amount,
    },
    /// Return the sender's refundable balance.
    Refund,
    /// Convert the sender's frozen deposit record into token units.
    Claim,
}

// =============================================================================
// RECEIPTS
// =============================================================================

/// Amounts reported back from a committed close.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloseOutcome {
    /// Payout address that received the sweep.
    pub payout: Address,
    /// Native currency transferred out.
    pub swept: Amount,
    /// Native currency retained for whitelisted identities.
    pub retained: Amount,
}

// =============================================================================
// ESCROW API (Primary Driving Port)
// =============================================================================

/// Primary API for the pooled-funds escrow engine.
///
/// Mutating operations execute as indivisible units of work: the
/// implementation serializes them, and a returned error guarantees no
/// observable state change (see the crate-level error policy).
#[async_trait]
pub trait EscrowApi: Send + Sync {
    /// Boundary entry point for inbound value transfers.
    ///
    /// `amount > 0` is a deposit. `amount == 0` keeps the legacy alias:
    /// it resolves to [`PoolRequest::Claim`] when the pool is Closed with a
    /// token attached, and to [`PoolRequest::Refund`] otherwise.
    async fn receive(&self, sender: Address, amount: Amount) -> Result<(), EscrowError>;

    /// Submits an explicit tagged request.
    async fn submit(&self, sender: Address, request: PoolRequest) -> Result<(), EscrowError>;

    /// Credits a deposit to the sender's balance. Open-only, non-zero.
    async fn deposit(&self, sender: Address, amount: Amount) -> Result<(), EscrowError>;

    /// Refunds the sender's full refundable balance, returning the amount
    /// transferred. A zero balance is a successful no-op returning 0.
    async fn refund(&self, sender: Address) -> Result<Amount, EscrowError>;

    /// Converts the sender's frozen deposit record into a pro-rata share of
    /// the custody-held token supply, returning the units transferred.
    /// An already-cleared record is a successful no-op returning 0.
    async fn claim(&self, sender: Address) -> Result<TokenUnits, EscrowError>;

    /// Sweeps all deposits to `payout` and closes the pool. Creator-only,
    /// Open-only; rolls back fully if the payout transfer fails.
    async fn close_allow_all(
        &self,
        caller: Address,
        payout: Address,
    ) -> Result<CloseOutcome, EscrowError>;

    /// Sweeps non-whitelisted deposits to `payout` and closes the pool;
    /// whitelisted identities keep their balance and stay refundable.
    /// Creator-only, Open-only, all-or-nothing on transfer failure.
    async fn close(
        &self,
        caller: Address,
        payout: Address,
        whitelist: HashSet<Address>,
    ) -> Result<CloseOutcome, EscrowError>;

    /// Attaches the distribution token. Creator-only, Closed-only.
    async fn set_token(&self, caller: Address, token: Address) -> Result<(), EscrowError>;

    /// Sweeps all residual custody to the creator and terminates the pool,
    /// returning the residual amount. Creator-only; a failed sweep transfer
    /// is logged and termination completes regardless.
    async fn kill(&self, caller: Address) -> Result<Amount, EscrowError>;

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Current refundable balance of an identity.
    async fn balance_of(&self, identity: Address) -> Amount;

    /// Frozen deposit record of an identity (claimable pro rata).
    async fn distributable_of(&self, identity: Address) -> Amount;

    /// Aggregate of all refundable balances.
    async fn total_deposits(&self) -> Amount;

    /// True once the pool has been closed or terminated.
    async fn closed(&self) -> bool;

    /// Current lifecycle state.
    async fn lifecycle(&self) -> Lifecycle;

    /// The privileged creator identity.
    async fn creator(&self) -> Address;

    /// Attached distribution token, if any.
    async fn token(&self) -> Option<Address>;

    /// True if the identity was whitelisted at close time.
    async fn is_whitelisted(&self, identity: Address) -> bool;
}

// =============================================================================
// TESTS
// =============================================================================
