//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the escrow engine depends on. The execution environment
//! implements these to move native currency and token units out of the
//! pool's custody.
//!
//! Both gateways return failures as values: a rejected payout must be
//! recoverable inside close (full rollback, retry allowed), so no transfer
//! failure may propagate as a panic mid-mutation.

use crate::domain::value_objects::{Address, Amount, TokenUnits};
use crate::errors::{TokenError, TransferError};
use async_trait::async_trait;

// =============================================================================
// NATIVE-CURRENCY OUTBOUND
// =============================================================================

/// Outbound native-currency transfers (refunds, payout sweeps, kill).
///
/// ## Implementation Notes
///
/// The engine never calls `send` with a zero amount; idempotent no-op
/// refunds are short-circuited before reaching the gateway.
#[async_trait]
pub trait FundsGateway: Send + Sync {
    /// Transfers `amount` native-currency units to `to`.
    ///
    /// # Errors
    ///
    /// * `TransferError::Rejected` if the recipient refuses the transfer
    ///   (e.g. a non-payable address).
    /// * `TransferError::Unavailable` if the environment is unreachable.
    async fn send(&self, to: Address, amount: Amount) -> Result<(), TransferError>;
}

// =============================================================================
// TOKEN OUTBOUND
// =============================================================================

/// Token custody queries and outbound token-unit transfers.
#[async_trait]
pub trait TokenGateway: Send + Sync {
    /// Token units of `token` currently held in the pool's custody.
    async fn held_supply(&self, token: Address) -> Result<TokenUnits, TokenError>;

    /// Transfers `amount` units of `token` from custody to `to`.
    ///
    /// # Errors
    ///
    /// * `TokenError::InsufficientCustody` if custody holds fewer units.
    /// * `TokenError::Rejected` if the recipient refuses the transfer.
    async fn transfer(&self, token: Address, to: Address, amount: TokenUnits)
        -> Result<(), TokenError>;
}

// =============================================================================
// TESTS
// =============================================================================
