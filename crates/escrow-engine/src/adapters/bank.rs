//! # Bank Adapter
//!
//! In-memory funds gateway for testing and local runs.
//! Production implementations forward to the surrounding execution
//! environment's native-currency transfer primitive.

use crate::domain::value_objects::{Address, Amount};
use crate::errors::TransferError;
use crate::ports::outbound::FundsGateway;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// In-memory external account balances.
///
/// Recipients can be marked as rejecting to model a non-payable payout
/// address; the close-rollback tests flip that flag between attempts.
#[derive(Debug, Default)]
pub struct InMemoryBank {
    /// External account balances.
    accounts: RwLock<HashMap<Address, Amount>>,
    /// Recipients that refuse incoming transfers.
    rejecting: RwLock<HashSet<Address>>,
}

impl InMemoryBank {
    /// Create a new empty bank.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks or unmarks a recipient as refusing incoming transfers.
    pub fn set_rejecting(&self, recipient: Address, rejecting: bool) {
        let mut set = self.rejecting.write().unwrap();
        if rejecting {
            set.insert(recipient);
        } else {
            set.remove(&recipient);
        }
    }

    /// External balance of an account.
    #[must_use]
    pub fn balance_of(&self, account: Address) -> Amount {
        self.accounts
            .read()
            .unwrap()
            .get(&account)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl FundsGateway for InMemoryBank {
    async fn send(&self, to: Address, amount: Amount) -> Result<(), TransferError> {
        if self.rejecting.read().unwrap().contains(&to) {
            return Err(TransferError::Rejected {
                recipient: to,
                amount,
            });
        }

        let mut accounts = self.accounts.write().unwrap();
        let balance = accounts.entry(to).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::Unavailable("recipient balance overflow".into()))?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
