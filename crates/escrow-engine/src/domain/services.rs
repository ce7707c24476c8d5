//! # Domain Services
//!
//! Pure business logic functions for the escrow engine.
//! These functions are deterministic and have no side effects:
//! no I/O, no async code, no external dependencies.

use crate::domain::ledger::Ledger;
use crate::domain::value_objects::{Address, Amount, TokenUnits};
use crate::errors::LedgerError;
use std::collections::HashSet;

// =============================================================================
// PRO-RATA SHARE
// =============================================================================

/// Computes a participant's pro-rata token share.
///
/// `share = balance * supply / total`, with the multiplication performed
/// before the floor division so every participant loses at most one unit to
/// rounding, consistently in the same direction.
///
/// A zero `total` or zero `balance` yields a zero share (nothing to
/// distribute / nothing recorded).
///
/// # Errors
///
/// * `LedgerError::ShareOverflow` if `balance * supply` exceeds `u128`.
pub fn pro_rata_share(
    balance: Amount,
    supply: TokenUnits,
    total: Amount,
) -> Result<TokenUnits, LedgerError> {
    if balance == 0 || total == 0 {
        return Ok(0);
    }
    let numerator = balance
        .checked_mul(supply)
        .ok_or(LedgerError::ShareOverflow { balance, supply })?;
    Ok(numerator / total)
}

// =============================================================================
// SWEEP PARTITION
// =============================================================================

/// Splits a ledger's balances into the swept portion (identities NOT in the
/// whitelist, whose funds leave with the payout transfer) and the retained
/// total (whitelisted identities that stay refundable).
///
/// Returns `(swept_entries, swept_total, retained_total)`. An empty
/// whitelist sweeps everything (the close-allow-all case).
#[must_use]
pub fn sweep_partition(
    ledger: &Ledger,
    whitelist: &HashSet<Address>,
) -> (Vec<(Address, Amount)>, Amount, Amount) {
    let mut swept = Vec::new();
    let mut swept_total: Amount = 0;
    let mut retained_total: Amount = 0;

    for (participant, balance) in ledger.entries() {
        if whitelist.contains(&participant) {
            retained_total += balance;
        } else {
            swept_total += balance;
            swept.push((participant, balance));
        }
    }

    (swept, swept_total, retained_total)
}

// =============================================================================
// TESTS
// =============================================================================
