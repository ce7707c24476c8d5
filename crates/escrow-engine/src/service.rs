//! # Escrow Service
//!
//! Production service wiring the `Pool` aggregate to the outbound gateways
//! and exposing the `EscrowApi` driving port.
//!
//! ## Serialization
//!
//! Every mutating operation takes the pool's write lock for its entire
//! duration, including the outbound transfer it may perform, so each call
//! executes as one indivisible unit of work and no caller observes a
//! partially-applied effect.
//!
//! ## Rollback discipline
//!
//! Operations that move funds out run in two phases: plan (pure validation
//! and amount computation), transfer through the gateway, then commit. A
//! failed transfer skips the commit, which IS the rollback: no domain state
//! was touched yet. The single exception is kill, where a failed residual
//! transfer is logged and termination completes regardless.

use crate::adapters::{InMemoryBank, InMemoryToken};
use crate::domain::entities::{Lifecycle, Pool};
use crate::domain::invariants::{check_all_invariants, InvariantCheckResult};
use crate::domain::services::pro_rata_share;
use crate::domain::value_objects::{Address, Amount, TokenUnits};
use crate::errors::EscrowError;
use crate::events::{
    DepositReceived, EscrowEvent, PoolClosed, PoolTerminated, RefundIssued, TokenAttached,
    TokensClaimed,
};
use crate::ports::inbound::{CloseOutcome, EscrowApi, PoolRequest};
use crate::ports::outbound::{FundsGateway, TokenGateway};

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Escrow service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Re-check domain invariants after every mutation.
    pub check_invariants: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            event_capacity: 64,
            check_invariants: true,
        }
    }
}

impl ServiceConfig {
    /// Load configuration with environment overrides.
    ///
    /// * `ESCROW_EVENT_CAPACITY` — broadcast channel capacity.
    /// * `ESCROW_CHECK_INVARIANTS` — set to `0` or `false` to disable the
    ///   per-mutation invariant re-check.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(capacity) = std::env::var("ESCROW_EVENT_CAPACITY") {
            if let Ok(parsed) = capacity.parse() {
                config.event_capacity = parsed;
            }
        }
        if let Ok(flag) = std::env::var("ESCROW_CHECK_INVARIANTS") {
            config.check_invariants = !matches!(flag.as_str(), "0" | "false" | "off");
        }

        config
    }
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Operation counters for the escrow service.
#[derive(Debug, Default, Clone)]
pub struct ServiceStats {
    /// Deposits credited.
    pub deposits: u64,
    /// Refunds paid (including zero-amount no-ops).
    pub refunds: u64,
    /// Claims paid (including zero-share no-ops).
    pub claims: u64,
    /// Requests rejected before any mutation.
    pub rejected_requests: u64,
    /// Outbound transfers refused by the gateway (all rolled back except
    /// inside kill).
    pub failed_transfers: u64,
}

// =============================================================================
// SERVICE
// =============================================================================

/// The main escrow service.
///
/// Owns the pool aggregate, publishes an event per committed mutation, and
/// maintains operation statistics.
pub struct EscrowService<F: FundsGateway, T: TokenGateway> {
    /// Service configuration.
    config: ServiceConfig,
    /// The pool aggregate, serialized behind a write lock.
    pool: RwLock<Pool>,
    /// Native-currency outbound gateway.
    funds: Arc<F>,
    /// Token outbound gateway.
    tokens: Arc<T>,
    /// Event broadcast channel.
    events: broadcast::Sender<EscrowEvent>,
    /// Operation statistics.
    stats: RwLock<ServiceStats>,
}

impl<F: FundsGateway, T: TokenGateway> EscrowService<F, T> {
    /// Create a new escrow service with an open pool.
    pub fn new(creator: Address, funds: F, tokens: T, config: ServiceConfig) -> Self {
        info!(%creator, "creating escrow pool");
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            pool: RwLock::new(Pool::new(creator)),
            funds: Arc::new(funds),
            tokens: Arc::new(tokens),
            events,
            stats: RwLock::new(ServiceStats::default()),
        }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EscrowEvent> {
        self.events.subscribe()
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Handle to the funds gateway (test suites flip adapter flags here).
    pub fn funds(&self) -> Arc<F> {
        Arc::clone(&self.funds)
    }

    /// Handle to the token gateway.
    pub fn tokens(&self) -> Arc<T> {
        Arc::clone(&self.tokens)
    }

    /// Publish an event; missing subscribers are not an error.
    fn publish(&self, event: EscrowEvent) {
        let _ = self.events.send(event);
    }

    /// Re-check domain invariants after a mutation when enabled.
    fn verify_invariants(&self, pool: &Pool) {
        if !self.config.check_invariants {
            return;
        }
        if let InvariantCheckResult::Invalid(violations) = check_all_invariants(pool) {
            for violation in &violations {
                error!(%violation, "domain invariant violated");
            }
            debug_assert!(violations.is_empty(), "domain invariant violated");
        }
    }

    async fn bump_rejected(&self) {
        self.stats.write().await.rejected_requests += 1;
    }

    async fn bump_failed_transfer(&self) {
        self.stats.write().await.failed_transfers += 1;
    }

    // -------------------------------------------------------------------------
    // Operation handlers
    // -------------------------------------------------------------------------

    /// Credit a deposit. Open-only, non-zero amount.
    #[instrument(skip(self))]
    async fn handle_deposit(&self, sender: Address, amount: Amount) -> Result<(), EscrowError> {
        let mut pool = self.pool.write().await;
        if let Err(err) = pool.deposit(sender, amount) {
            self.bump_rejected().await;
            debug!(%err, "deposit rejected");
            return Err(err);
        }
        self.verify_invariants(&pool);
        let total_deposits = pool.total_deposits();
        drop(pool);

        self.stats.write().await.deposits += 1;
        debug!(total_deposits, "deposit credited");
        self.publish(EscrowEvent::Deposit(DepositReceived {
            event_id: Uuid::new_v4(),
            participant: sender,
            amount,
            total_deposits,
        }));
        Ok(())
    }

    /// Refund the sender's full refundable balance.
    #[instrument(skip(self))]
    async fn handle_refund(&self, sender: Address) -> Result<Amount, EscrowError> {
        let mut pool = self.pool.write().await;
        let amount = match pool.plan_refund(sender) {
            Ok(amount) => amount,
            Err(err) => {
                self.bump_rejected().await;
                debug!(%err, "refund rejected");
                return Err(err);
            }
        };

        if amount == 0 {
            // Nothing deposited, or already refunded: silent idempotent no-op.
            drop(pool);
            self.stats.write().await.refunds += 1;
            debug!("refund no-op, balance already zero");
            return Ok(0);
        }

        if let Err(err) = self.funds.send(sender, amount).await {
            self.bump_failed_transfer().await;
            warn!(amount, %err, "refund transfer failed; balance restored");
            return Err(err.into());
        }

        let cleared = pool.commit_refund(sender);
        self.verify_invariants(&pool);
        drop(pool);

        self.stats.write().await.refunds += 1;
        info!(amount = cleared, "refund paid");
        self.publish(EscrowEvent::Refund(RefundIssued {
            event_id: Uuid::new_v4(),
            participant: sender,
            amount: cleared,
        }));
        Ok(cleared)
    }

    /// Convert the sender's frozen record into a pro-rata token share.
    #[instrument(skip(self))]
    async fn handle_claim(&self, sender: Address) -> Result<TokenUnits, EscrowError> {
        let mut pool = self.pool.write().await;
        let token = match pool.require_claim_ready() {
            Ok(token) => token,
            Err(err) => {
                self.bump_rejected().await;
                debug!(%err, "claim rejected");
                return Err(err);
            }
        };

        let recorded = pool.distributable_of(sender);
        if recorded == 0 {
            // Never swept in, or already claimed: silent idempotent no-op.
            drop(pool);
            self.stats.write().await.claims += 1;
            debug!("claim no-op, frozen record already zero");
            return Ok(0);
        }

        let supply = match self.tokens.held_supply(token).await {
            Ok(supply) => supply,
            Err(err) => {
                self.bump_failed_transfer().await;
                warn!(%err, "custody query failed; claim aborted");
                return Err(err.into());
            }
        };

        let share = match pro_rata_share(recorded, supply, pool.frozen_total()) {
            Ok(share) => share,
            Err(err) => {
                self.bump_rejected().await;
                return Err(err.into());
            }
        };

        if share > 0 {
            if let Err(err) = self.tokens.transfer(token, sender, share).await {
                self.bump_failed_transfer().await;
                warn!(share, %err, "token transfer failed; record restored");
                return Err(err.into());
            }
        }

        let consumed = pool.commit_claim(sender);
        self.verify_invariants(&pool);
        drop(pool);

        self.stats.write().await.claims += 1;
        info!(share, consumed, "claim paid");
        self.publish(EscrowEvent::Claimed(TokensClaimed {
            event_id: Uuid::new_v4(),
            participant: sender,
            share,
            consumed,
        }));
        Ok(share)
    }

    /// Close the pool, sweeping non-whitelisted deposits to `payout`.
    #[instrument(skip(self, whitelist))]
    async fn handle_close(
        &self,
        caller: Address,
        payout: Address,
        whitelist: HashSet<Address>,
    ) -> Result<CloseOutcome, EscrowError> {
        let mut pool = self.pool.write().await;
        let plan = match pool.plan_close(caller, &whitelist) {
            Ok(plan) => plan,
            Err(err) => {
                self.bump_rejected().await;
                debug!(%err, "close rejected");
                return Err(err);
            }
        };

        if plan.swept_total > 0 {
            if let Err(err) = self.funds.send(payout, plan.swept_total).await {
                self.bump_failed_transfer().await;
                warn!(
                    swept = plan.swept_total,
                    %err,
                    "payout transfer failed; close rolled back, pool stays open"
                );
                return Err(err.into());
            }
        }

        let swept = pool.commit_close(whitelist);
        self.verify_invariants(&pool);
        drop(pool);

        info!(swept, retained = plan.retained_total, "pool closed");
        self.publish(EscrowEvent::Closed(PoolClosed {
            event_id: Uuid::new_v4(),
            payout,
            swept,
            retained: plan.retained_total,
        }));
        Ok(CloseOutcome {
            payout,
            swept,
            retained: plan.retained_total,
        })
    }

    /// Terminate the pool, sweeping residual custody to the creator.
    #[instrument(skip(self))]
    async fn handle_kill(&self, caller: Address) -> Result<Amount, EscrowError> {
        let mut pool = self.pool.write().await;
        let residual = match pool.plan_kill(caller) {
            Ok(residual) => residual,
            Err(err) => {
                self.bump_rejected().await;
                debug!(%err, "kill rejected");
                return Err(err);
            }
        };
        let creator = pool.creator();

        if residual > 0 {
            // Terminal and operator-triggered: a refused residual transfer
            // does not block termination.
            if let Err(err) = self.funds.send(creator, residual).await {
                self.bump_failed_transfer().await;
                warn!(residual, %err, "kill payout refused; terminating regardless");
            }
        }

        pool.commit_kill();
        self.verify_invariants(&pool);
        drop(pool);

        info!(residual, "pool terminated");
        self.publish(EscrowEvent::Terminated(PoolTerminated {
            event_id: Uuid::new_v4(),
            creator,
            residual,
        }));
        Ok(residual)
    }
}

// =============================================================================
// ESCROW API IMPLEMENTATION
// =============================================================================

#[async_trait]
impl<F: FundsGateway, T: TokenGateway> EscrowApi for EscrowService<F, T> {
    async fn receive(&self, sender: Address, amount: Amount) -> Result<(), EscrowError> {
        if amount > 0 {
            return self.handle_deposit(sender, amount).await;
        }

        // Legacy zero-value alias: infer the tagged request from the pool
        // state. Closed with a token attached means claim; anything else
        // still standing means refund.
        let request = {
            let pool = self.pool.read().await;
            if pool.lifecycle() == Lifecycle::Closed && pool.token().is_some() {
                PoolRequest::Claim
            } else {
                PoolRequest::Refund
            }
        };
        self.submit(sender, request).await
    }

    async fn submit(&self, sender: Address, request: PoolRequest) -> Result<(), EscrowError> {
        match request {
            PoolRequest::Deposit { amount } => self.handle_deposit(sender, amount).await,
            PoolRequest::Refund => self.handle_refund(sender).await.map(|_| ()),
            PoolRequest::Claim => self.handle_claim(sender).await.map(|_| ()),
        }
    }

    async fn deposit(&self, sender: Address, amount: Amount) -> Result<(), EscrowError> {
        self.handle_deposit(sender, amount).await
    }

    async fn refund(&self, sender: Address) -> Result<Amount, EscrowError> {
        self.handle_refund(sender).await
    }

    async fn claim(&self, sender: Address) -> Result<TokenUnits, EscrowError> {
        self.handle_claim(sender).await
    }

    async fn close_allow_all(
        &self,
        caller: Address,
        payout: Address,
    ) -> Result<CloseOutcome, EscrowError> {
        self.handle_close(caller, payout, HashSet::new()).await
    }

    async fn close(
        &self,
        caller: Address,
        payout: Address,
        whitelist: HashSet<Address>,
    ) -> Result<CloseOutcome, EscrowError> {
        self.handle_close(caller, payout, whitelist).await
    }

    async fn set_token(&self, caller: Address, token: Address) -> Result<(), EscrowError> {
        let mut pool = self.pool.write().await;
        if let Err(err) = pool.set_token(caller, token) {
            self.bump_rejected().await;
            debug!(%err, "set_token rejected");
            return Err(err);
        }
        drop(pool);

        info!(%token, "distribution token attached");
        self.publish(EscrowEvent::TokenAttached(TokenAttached {
            event_id: Uuid::new_v4(),
            token,
        }));
        Ok(())
    }

    async fn kill(&self, caller: Address) -> Result<Amount, EscrowError> {
        self.handle_kill(caller).await
    }

    async fn balance_of(&self, identity: Address) -> Amount {
        self.pool.read().await.balance_of(identity)
    }

    async fn distributable_of(&self, identity: Address) -> Amount {
        self.pool.read().await.distributable_of(identity)
    }

    async fn total_deposits(&self) -> Amount {
        self.pool.read().await.total_deposits()
    }

    async fn closed(&self) -> bool {
        self.pool.read().await.closed()
    }

    async fn lifecycle(&self) -> Lifecycle {
        self.pool.read().await.lifecycle()
    }

    async fn creator(&self) -> Address {
        self.pool.read().await.creator()
    }

    async fn token(&self) -> Option<Address> {
        self.pool.read().await.token()
    }

    async fn is_whitelisted(&self, identity: Address) -> bool {
        self.pool.read().await.is_whitelisted(identity)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

/// Create a service wired to in-memory gateways, for tests and local runs.
#[must_use]
pub fn create_test_service(creator: Address) -> EscrowService<InMemoryBank, InMemoryToken> {
    EscrowService::new(
        creator,
        InMemoryBank::new(),
        InMemoryToken::new(),
        ServiceConfig::default(),
    )
}

// =============================================================================
// TESTS
// =============================================================================
