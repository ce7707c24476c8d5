//! # Domain Invariants
//!
//! Critical invariants that MUST hold between operations on the pool.
//! The service re-checks them after every mutation when enabled in its
//! configuration; a violation means a bookkeeping bug, never a caller
//! mistake.

use crate::domain::entities::{Lifecycle, Pool};
use crate::domain::value_objects::Amount;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Conservation: the recomputed live-balance sum, the maintained aggregate
/// total, and the custody counter all agree. Sweeps deduct from all three
/// atomically, so this holds at every observable point.
#[must_use]
pub fn check_conservation(pool: &Pool) -> bool {
    pool.live_balances_sum() == pool.total_deposits() && pool.total_deposits() == pool.held()
}

/// Frozen-record conservation: the distribution record's maintained total
/// matches its recomputed balance sum.
#[must_use]
pub fn check_frozen_conservation(pool: &Pool) -> bool {
    pool.frozen_balances_sum() == pool.frozen_total()
}

/// A terminated pool holds nothing: custody is zero and no live balance
/// survives the final sweep.
#[must_use]
pub fn check_terminated_drained(pool: &Pool) -> bool {
    if pool.lifecycle() == Lifecycle::Terminated {
        pool.held() == 0 && pool.live_participants() == 0
    } else {
        true
    }
}

/// A distribution token only exists on a pool that has been closed;
/// `set_token` is gated on the Closed state.
#[must_use]
pub fn check_token_lifecycle(pool: &Pool) -> bool {
    pool.token().is_none() || pool.closed()
}

/// Check all invariants at once.
#[must_use]
pub fn check_all_invariants(pool: &Pool) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_conservation(pool) {
        violations.push(InvariantViolation::ConservationBroken {
            balances_sum: pool.live_balances_sum(),
            total_deposits: pool.total_deposits(),
            held: pool.held(),
        });
    }

    if !check_frozen_conservation(pool) {
        violations.push(InvariantViolation::FrozenRecordBroken {
            balances_sum: pool.frozen_balances_sum(),
            frozen_total: pool.frozen_total(),
        });
    }

    if !check_terminated_drained(pool) {
        violations.push(InvariantViolation::TerminatedNotDrained {
            held: pool.held(),
            live_participants: pool.live_participants(),
        });
    }

    if !check_token_lifecycle(pool) {
        violations.push(InvariantViolation::TokenBeforeClose);
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Ledger sum, maintained total, and custody disagree.
    ConservationBroken {
        /// Recomputed sum over live balances.
        balances_sum: Amount,
        /// Incrementally maintained aggregate.
        total_deposits: Amount,
        /// Custody counter.
        held: Amount,
    },
    /// Frozen record total diverged from its balances.
    FrozenRecordBroken {
        /// Recomputed sum over the frozen record.
        balances_sum: Amount,
        /// Maintained frozen total.
        frozen_total: Amount,
    },
    /// A terminated pool still holds funds or balances.
    TerminatedNotDrained {
        /// Custody remaining after termination.
        held: Amount,
        /// Live balances remaining after termination.
        live_participants: usize,
    },
    /// A token was attached before the pool closed.
    TokenBeforeClose,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConservationBroken {
                balances_sum,
                total_deposits,
                held,
            } => write!(
                f,
                "conservation broken: sum {balances_sum}, total {total_deposits}, held {held}"
            ),
            Self::FrozenRecordBroken {
                balances_sum,
                frozen_total,
            } => write!(
                f,
                "frozen record broken: sum {balances_sum}, total {frozen_total}"
            ),
            Self::TerminatedNotDrained {
                held,
                live_participants,
            } => write!(
                f,
                "terminated pool not drained: held {held}, {live_participants} live balances"
            ),
            Self::TokenBeforeClose => write!(f, "token attached before close"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
