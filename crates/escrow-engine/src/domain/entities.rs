//! # Core Domain Entities
//!
//! The pool lifecycle and the `Pool` aggregate: one explicit owned value
//! holding the live ledger, the frozen distribution record, custody
//! bookkeeping, and lifecycle state. Every operation handler borrows the
//! aggregate; there are no module-level mutable singletons.
//!
//! Operations that require an outbound transfer are split into a pure
//! `plan_*` step (validates preconditions, computes amounts, mutates
//! nothing) and an infallible `commit_*` step applied only after the
//! transfer succeeded. A transfer failure between the two steps therefore
//! rolls the operation back for free.

use crate::domain::ledger::Ledger;
use crate::domain::services::sweep_partition;
use crate::domain::value_objects::{Address, Amount};
use crate::errors::EscrowError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Pool lifecycle state.
///
/// Transitions are one-way: `Open → Closed → Terminated`, with `Terminated`
/// also reachable directly from `Open` via kill. `Terminated` is absorbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Accepting deposits and refunds.
    Open,
    /// Funds swept to the payout address; claims and residual refunds only.
    Closed,
    /// All residual funds swept to the creator; every operation rejected.
    Terminated,
}

impl Lifecycle {
    /// True once the pool has been closed or terminated.
    #[must_use]
    pub fn closed(self) -> bool {
        matches!(self, Self::Closed | Self::Terminated)
    }

    /// True while the pool still accepts deposits.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// True once the pool reached its final state.
    #[must_use]
    pub fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

// =============================================================================
// SWEEP PLAN
// =============================================================================

/// Amounts computed by the close planning step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepPlan {
    /// Total leaving the pool with the payout transfer.
    pub swept_total: Amount,
    /// Total staying in the pool for whitelisted identities.
    pub retained_total: Amount,
}

// =============================================================================
// POOL AGGREGATE
// =============================================================================

/// The pooled-funds escrow aggregate.
///
/// ## Bookkeeping
///
/// - `live`: refundable balances, always equal in sum to `held` custody.
/// - `frozen`: deposit amounts captured at close time for swept balances,
///   consumed by pro-rata token claims.
/// - `held`: native currency in the pool's custody, maintained
///   independently of the ledgers and reconciled by the conservation
///   invariant after every mutation.
#[derive(Debug, Clone)]
pub struct Pool {
    /// Privileged identity fixed at creation.
    creator: Address,
    /// Current lifecycle state.
    lifecycle: Lifecycle,
    /// Refundable participant balances.
    live: Ledger,
    /// Frozen distribution record (populated at close).
    frozen: Ledger,
    /// Native currency held in custody.
    held: Amount,
    /// Attached distribution token, if any.
    token: Option<Address>,
    /// Identities whose deposits were retained at close time.
    whitelist: HashSet<Address>,
}

impl Pool {
    /// Creates an open pool with zero balances and a fixed creator.
    #[must_use]
    pub fn new(creator: Address) -> Self {
        Self {
            creator,
            lifecycle: Lifecycle::Open,
            live: Ledger::new(),
            frozen: Ledger::new(),
            held: 0,
            token: None,
            whitelist: HashSet::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// The privileged creator identity.
    #[must_use]
    pub fn creator(&self) -> Address {
        self.creator
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Attached distribution token, if any.
    #[must_use]
    pub fn token(&self) -> Option<Address> {
        self.token
    }

    /// True once the pool has been closed or terminated.
    #[must_use]
    pub fn closed(&self) -> bool {
        self.lifecycle.closed()
    }

    /// Native currency currently in custody.
    #[must_use]
    pub fn held(&self) -> Amount {
        self.held
    }

    /// Live (refundable) balance of a participant.
    #[must_use]
    pub fn balance_of(&self, participant: Address) -> Amount {
        self.live.balance(participant)
    }

    /// Frozen deposit record of a participant (claimable pro rata).
    #[must_use]
    pub fn distributable_of(&self, participant: Address) -> Amount {
        self.frozen.balance(participant)
    }

    /// Aggregate of all live balances.
    #[must_use]
    pub fn total_deposits(&self) -> Amount {
        self.live.total()
    }

    /// Aggregate of the frozen distribution record.
    #[must_use]
    pub fn frozen_total(&self) -> Amount {
        self.frozen.total()
    }

    /// Recomputed sum over the live ledger, for invariant checks.
    #[must_use]
    pub fn live_balances_sum(&self) -> Amount {
        self.live.balances_sum()
    }

    /// Recomputed sum over the frozen record, for invariant checks.
    #[must_use]
    pub fn frozen_balances_sum(&self) -> Amount {
        self.frozen.balances_sum()
    }

    /// Number of participants holding a live balance.
    #[must_use]
    pub fn live_participants(&self) -> usize {
        self.live.participant_count()
    }

    /// True if the identity was whitelisted at close time.
    #[must_use]
    pub fn is_whitelisted(&self, identity: Address) -> bool {
        self.whitelist.contains(&identity)
    }

    // -------------------------------------------------------------------------
    // Access control
    // -------------------------------------------------------------------------

    /// Fails unless `caller` is the pool creator. Checked before any state
    /// mutation, so a rejected privileged call is an atomic no-op.
    pub fn require_creator(&self, caller: Address) -> Result<(), EscrowError> {
        if caller == self.creator {
            Ok(())
        } else {
            Err(EscrowError::Unauthorized { caller })
        }
    }

    // -------------------------------------------------------------------------
    // Deposit
    // -------------------------------------------------------------------------

    /// Credits a deposit to the sender's live balance and custody.
    ///
    /// # Errors
    ///
    /// * `InvalidState` unless the pool is Open.
    /// * `Ledger` on a zero amount or arithmetic overflow.
    pub fn deposit(&mut self, sender: Address, amount: Amount) -> Result<(), EscrowError> {
        if !self.lifecycle.is_open() {
            return Err(EscrowError::InvalidState {
                operation: "deposit",
                actual: self.lifecycle,
            });
        }
        self.live.credit(sender, amount)?;
        // credit validated the aggregate total; custody mirrors it.
        self.held += amount;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Refund (two-phase)
    // -------------------------------------------------------------------------

    /// Validates a refund request and returns the refundable amount.
    ///
    /// A zero result is a legal idempotent no-op, not an error.
    ///
    /// # Errors
    ///
    /// * `InvalidState` once the pool is Terminated.
    pub fn plan_refund(&self, sender: Address) -> Result<Amount, EscrowError> {
        if self.lifecycle.is_terminated() {
            return Err(EscrowError::InvalidState {
                operation: "refund",
                actual: self.lifecycle,
            });
        }
        Ok(self.live.balance(sender))
    }

    /// Clears the sender's live balance after the refund transfer
    /// succeeded, returning the cleared amount.
    pub fn commit_refund(&mut self, sender: Address) -> Amount {
        let amount = self.live.zero(sender);
        self.held -= amount;
        amount
    }

    // -------------------------------------------------------------------------
    // Close (two-phase)
    // -------------------------------------------------------------------------

    /// Validates a close request and computes the sweep amounts.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` unless `caller` is the creator.
    /// * `AlreadyClosed` if the pool left the Open state.
    pub fn plan_close(
        &self,
        caller: Address,
        whitelist: &HashSet<Address>,
    ) -> Result<SweepPlan, EscrowError> {
        self.require_creator(caller)?;
        if self.lifecycle.closed() {
            return Err(EscrowError::AlreadyClosed);
        }
        let (_, swept_total, retained_total) = sweep_partition(&self.live, whitelist);
        Ok(SweepPlan {
            swept_total,
            retained_total,
        })
    }

    /// Applies a close after the payout transfer succeeded: moves every
    /// non-whitelisted balance into the frozen record, releases the swept
    /// custody, and transitions to Closed. Infallible by construction so a
    /// committed close can never half-apply.
    pub fn commit_close(&mut self, whitelist: HashSet<Address>) -> Amount {
        let mut swept_total: Amount = 0;
        for participant in self.live.participants() {
            if whitelist.contains(&participant) {
                continue;
            }
            let amount = self.live.zero(participant);
            if amount > 0 {
                self.frozen.absorb(participant, amount);
                swept_total += amount;
            }
        }
        self.held -= swept_total;
        self.whitelist = whitelist;
        self.lifecycle = Lifecycle::Closed;
        swept_total
    }

    // -------------------------------------------------------------------------
    // Token attachment
    // -------------------------------------------------------------------------

    /// Attaches the distribution token. Creator-only, Closed-only.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` unless `caller` is the creator.
    /// * `InvalidState` unless the pool is Closed.
    pub fn set_token(&mut self, caller: Address, token: Address) -> Result<(), EscrowError> {
        self.require_creator(caller)?;
        if self.lifecycle != Lifecycle::Closed {
            return Err(EscrowError::InvalidState {
                operation: "set_token",
                actual: self.lifecycle,
            });
        }
        self.token = Some(token);
        Ok(())
    }

    /// Returns the attached token if the pool is ready for claims.
    ///
    /// # Errors
    ///
    /// * `InvalidState` unless the pool is Closed.
    /// * `TokenNotAttached` if no token has been set.
    pub fn require_claim_ready(&self) -> Result<Address, EscrowError> {
        if self.lifecycle != Lifecycle::Closed {
            return Err(EscrowError::InvalidState {
                operation: "claim",
                actual: self.lifecycle,
            });
        }
        self.token.ok_or(EscrowError::TokenNotAttached)
    }

    /// Clears the sender's frozen record after the token transfer
    /// succeeded, returning the cleared amount. The frozen total shrinks in
    /// step, so later claimants split the remaining custody exactly.
    pub fn commit_claim(&mut self, sender: Address) -> Amount {
        self.frozen.zero(sender)
    }

    // -------------------------------------------------------------------------
    // Kill (two-phase, transfer failure tolerated)
    // -------------------------------------------------------------------------

    /// Validates a kill request and returns the residual custody that will
    /// be swept to the creator.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` unless `caller` is the creator.
    /// * `InvalidState` if the pool is already Terminated.
    pub fn plan_kill(&self, caller: Address) -> Result<Amount, EscrowError> {
        self.require_creator(caller)?;
        if self.lifecycle.is_terminated() {
            return Err(EscrowError::InvalidState {
                operation: "kill",
                actual: self.lifecycle,
            });
        }
        Ok(self.held)
    }

    /// Drains the live ledger and custody and transitions to Terminated.
    pub fn commit_kill(&mut self) {
        for participant in self.live.participants() {
            self.live.zero(participant);
        }
        self.held = 0;
        self.lifecycle = Lifecycle::Terminated;
    }
}

// =============================================================================
// TESTS
// =============================================================================
