//! # Error Types
//!
//! All error types for escrow pool operations.
//!
//! Every precondition violation is detected before any mutation, so a
//! returned error always means the operation had no observable effect.
//! The two idempotent no-ops (double refund, double claim) are successful
//! zero-amount operations, not errors.

use crate::domain::entities::Lifecycle;
use crate::domain::value_objects::{Address, Amount, TokenUnits};
use thiserror::Error;

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Errors from ledger balance mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Crediting would overflow the participant balance or aggregate total.
    #[error("balance overflow: balance {balance} + credit {credit} exceeds u128 range")]
    BalanceOverflow {
        /// Balance prior to the credit.
        balance: Amount,
        /// Amount that could not be applied.
        credit: Amount,
    },

    /// Zero-amount credits are rejected; a zero inbound transfer is a
    /// refund/claim request, never a deposit.
    #[error("zero-amount credit rejected")]
    ZeroCredit,

    /// Pro-rata share computation overflowed before the division.
    #[error("share computation overflow: {balance} * {supply} exceeds u128 range")]
    ShareOverflow {
        /// Frozen deposit record being converted.
        balance: Amount,
        /// Token supply held in custody.
        supply: TokenUnits,
    },
}

// =============================================================================
// OUTBOUND TRANSFER ERRORS
// =============================================================================

/// Errors from outbound native-currency transfers.
///
/// Returned as values rather than panicking because a failed payout must be
/// recoverable inside close (full rollback, retry allowed).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The recipient rejected the transfer (e.g. a non-payable address).
    #[error("recipient {recipient} rejected transfer of {amount} units")]
    Rejected {
        /// Intended recipient.
        recipient: Address,
        /// Amount that was refused.
        amount: Amount,
    },

    /// The funds gateway is unreachable.
    #[error("funds gateway unavailable: {0}")]
    Unavailable(String),
}

/// Errors from outbound token-unit transfers and custody queries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The pool's custody holds fewer units than requested.
    #[error("token custody insufficient: requested {requested}, held {held}")]
    InsufficientCustody {
        /// Units the claim tried to move.
        requested: TokenUnits,
        /// Units actually held in custody.
        held: TokenUnits,
    },

    /// The recipient rejected the token transfer.
    #[error("token recipient {recipient} rejected transfer")]
    Rejected {
        /// Intended recipient.
        recipient: Address,
    },

    /// The token gateway is unreachable.
    #[error("token gateway unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// ESCROW ERRORS
// =============================================================================

/// Top-level error taxonomy for pool operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// A non-creator invoked a privileged operation.
    #[error("unauthorized: {caller} is not the pool creator")]
    Unauthorized {
        /// Identity that made the call.
        caller: Address,
    },

    /// The operation is illegal for the current lifecycle state.
    #[error("{operation} is not allowed while the pool is {actual}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// Lifecycle state the pool was in.
        actual: Lifecycle,
    },

    /// A second close attempt on an already-closed pool.
    #[error("pool already closed")]
    AlreadyClosed,

    /// Claim attempted before the creator attached a distribution token.
    #[error("no distribution token attached")]
    TokenNotAttached,

    /// An outbound native-currency transfer failed.
    #[error("payout transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// An outbound token transfer or custody query failed.
    #[error("token transfer failed: {0}")]
    Token(#[from] TokenError),

    /// A ledger mutation was rejected.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl EscrowError {
    /// Returns true if the caller may retry the same operation later.
    ///
    /// Transfer failures are recoverable: close rolls back fully and may be
    /// retried once the recipient becomes payable. Authorization and state
    /// errors never resolve by retrying.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transfer(_) | Self::Token(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
