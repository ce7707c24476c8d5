//! # Token Adapter
//!
//! In-memory token gateway for testing and local runs. Tracks the pool's
//! custody pot per token plus holder balances; `fund_custody` models the
//! operator transferring the distribution supply into the pool's custody
//! after attaching the token.

use crate::domain::value_objects::{Address, TokenUnits};
use crate::errors::TokenError;
use crate::ports::outbound::TokenGateway;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory token custody and holder balances.
#[derive(Debug, Default)]
pub struct InMemoryToken {
    /// Units held in the pool's custody, per token.
    custody: RwLock<HashMap<Address, TokenUnits>>,
    /// Holder balances, keyed by (token, holder).
    holdings: RwLock<HashMap<(Address, Address), TokenUnits>>,
}

impl InMemoryToken {
    /// Create a new empty token gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `units` of `token` to the pool's custody.
    pub fn fund_custody(&self, token: Address, units: TokenUnits) {
        let mut custody = self.custody.write().unwrap();
        *custody.entry(token).or_insert(0) += units;
    }

    /// Units of `token` held by `holder`.
    #[must_use]
    pub fn holding_of(&self, token: Address, holder: Address) -> TokenUnits {
        self.holdings
            .read()
            .unwrap()
            .get(&(token, holder))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl TokenGateway for InMemoryToken {
    async fn held_supply(&self, token: Address) -> Result<TokenUnits, TokenError> {
        Ok(self
            .custody
            .read()
            .unwrap()
            .get(&token)
            .copied()
            .unwrap_or(0))
    }

    async fn transfer(
        &self,
        token: Address,
        to: Address,
        amount: TokenUnits,
    ) -> Result<(), TokenError> {
        let mut custody = self.custody.write().unwrap();
        let held = custody.entry(token).or_insert(0);
        if *held < amount {
            return Err(TokenError::InsufficientCustody {
                requested: amount,
                held: *held,
            });
        }
        *held -= amount;

        let mut holdings = self.holdings.write().unwrap();
        *holdings.entry((token, to)).or_insert(0) += amount;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
