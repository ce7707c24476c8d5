//! # Event Schema
//!
//! Payloads the service publishes on its broadcast channel after each
//! committed mutation. Subscribers (auditing, UIs, test assertions) receive
//! the full stream; publishing is best-effort and a missing subscriber is
//! not an error.
//!
//! Every payload carries a fresh `event_id` so downstream consumers can
//! deduplicate and correlate.

use crate::domain::value_objects::{Address, Amount, TokenUnits};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// EVENT PAYLOADS
// =============================================================================

/// A deposit was credited to a participant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DepositReceived {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Depositing identity.
    pub participant: Address,
    /// Amount credited.
    pub amount: Amount,
    /// Aggregate total after the credit.
    pub total_deposits: Amount,
}

/// A refund was paid back to a participant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefundIssued {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Refunded identity.
    pub participant: Address,
    /// Amount transferred back.
    pub amount: Amount,
}

/// The pool was closed and swept to the payout address.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolClosed {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Payout address that received the sweep.
    pub payout: Address,
    /// Amount transferred out.
    pub swept: Amount,
    /// Amount retained for whitelisted identities.
    pub retained: Amount,
}

/// The creator attached a distribution token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenAttached {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Attached token reference.
    pub token: Address,
}

/// A participant converted their frozen record into token units.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokensClaimed {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Claiming identity.
    pub participant: Address,
    /// Token units transferred.
    pub share: TokenUnits,
    /// Frozen deposit record consumed by the claim.
    pub consumed: Amount,
}

/// The pool was killed and residual custody swept to the creator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolTerminated {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Creator that received the residual.
    pub creator: Address,
    /// Residual custody swept.
    pub residual: Amount,
}

// =============================================================================
// EVENT ENVELOPE
// =============================================================================

/// All events the service can publish.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EscrowEvent {
    /// See [`DepositReceived`].
    Deposit(DepositReceived),
    /// See [`RefundIssued`].
    Refund(RefundIssued),
    /// See [`PoolClosed`].
    Closed(PoolClosed),
    /// See [`TokenAttached`].
    TokenAttached(TokenAttached),
    /// See [`TokensClaimed`].
    Claimed(TokensClaimed),
    /// See [`PoolTerminated`].
    Terminated(PoolTerminated),
}

// =============================================================================
// TESTS
// =============================================================================
