//! # Lifecycle Integration Flows
//!
//! Deposit, refund, close, and kill flows driven through the public API
//! with in-memory gateways, asserting ledger totals, external account
//! balances, and lifecycle gating at every step.

#[cfg(test)]
mod tests {
    use crate::support::{addr, test_service, CREATOR, PAYOUT};
    use escrow_engine::prelude::*;
    use std::collections::HashSet;

    // =============================================================================
    // DEPOSIT FLOWS
    // =============================================================================

    /// Two buyers fund the pool; ledger and total track both.
    #[tokio::test]
    async fn test_two_buyers_fund_pool() {
        let service = test_service();

        service.deposit(addr(1), 5).await.unwrap();
        service.deposit(addr(2), 3).await.unwrap();

        assert_eq!(service.total_deposits().await, 8);
        assert_eq!(service.balance_of(addr(1)).await, 5);
        assert_eq!(service.balance_of(addr(2)).await, 3);
        assert_eq!(service.lifecycle().await, Lifecycle::Open);
    }

    /// Repeated deposits from one identity accumulate in a single balance.
    #[tokio::test]
    async fn test_repeat_deposits_accumulate() {
        let service = test_service();

        service.deposit(addr(1), 5).await.unwrap();
        service.deposit(addr(1), 2).await.unwrap();

        assert_eq!(service.balance_of(addr(1)).await, 7);
        assert_eq!(service.total_deposits().await, 7);
    }

    /// The boundary entry point treats a positive transfer as a deposit.
    #[tokio::test]
    async fn test_receive_positive_amount_is_deposit() {
        let service = test_service();

        service.receive(addr(1), 5).await.unwrap();
        assert_eq!(service.balance_of(addr(1)).await, 5);
    }

    // =============================================================================
    // REFUND FLOWS
    // =============================================================================

    /// Deposit then self-refund via the zero-value alias: balance cleared,
    /// total cleared, funds back in the buyer's external account.
    #[tokio::test]
    async fn test_deposit_then_refund_returns_funds() {
        let service = test_service();

        service.deposit(addr(1), 5).await.unwrap();
        service.receive(addr(1), 0).await.unwrap();

        assert_eq!(service.balance_of(addr(1)).await, 0);
        assert_eq!(service.total_deposits().await, 0);
        assert_eq!(service.funds().balance_of(addr(1)), 5);
    }

    /// Refund with no deposit on record succeeds and moves nothing.
    #[tokio::test]
    async fn test_refund_without_deposit_is_noop() {
        let service = test_service();

        assert_eq!(service.refund(addr(1)).await.unwrap(), 0);
        assert_eq!(service.funds().balance_of(addr(1)), 0);
    }

    /// Refunding one buyer leaves the other untouched.
    #[tokio::test]
    async fn test_refund_is_scoped_to_sender() {
        let service = test_service();
        service.deposit(addr(1), 5).await.unwrap();
        service.deposit(addr(2), 3).await.unwrap();

        service.refund(addr(1)).await.unwrap();

        assert_eq!(service.balance_of(addr(2)).await, 3);
        assert_eq!(service.total_deposits().await, 3);
    }

    // =============================================================================
    // CLOSE FLOWS
    // =============================================================================

    /// Close-allow-all drains the pool to the payout address and freezes
    /// the deposit records for later distribution.
    #[tokio::test]
    async fn test_close_allow_all_sweeps_everything() {
        let service = test_service();
        service.deposit(addr(1), 5).await.unwrap();
        service.deposit(addr(2), 3).await.unwrap();

        let outcome = service.close_allow_all(CREATOR, PAYOUT).await.unwrap();

        assert_eq!(outcome.swept, 8);
        assert_eq!(outcome.retained, 0);
        assert_eq!(service.funds().balance_of(PAYOUT), 8);
        assert!(service.closed().await);
        assert_eq!(service.total_deposits().await, 0);
        assert_eq!(service.distributable_of(addr(1)).await, 5);
        assert_eq!(service.distributable_of(addr(2)).await, 3);
    }

    /// A second close is rejected and does not sweep twice.
    #[tokio::test]
    async fn test_double_close_rejected_without_duplicate_sweep() {
        let service = test_service();
        service.deposit(addr(2), 3).await.unwrap();

        service.close_allow_all(CREATOR, PAYOUT).await.unwrap();
        let err = service.close_allow_all(CREATOR, PAYOUT).await.unwrap_err();

        assert!(matches!(err, EscrowError::AlreadyClosed));
        assert!(service.closed().await);
        assert_eq!(service.funds().balance_of(PAYOUT), 3);
    }

    /// Whitelisted identities keep their balance through a close and can
    /// still self-refund afterwards; swept identities cannot.
    #[tokio::test]
    async fn test_whitelist_close_preserves_refund_eligibility() {
        let service = test_service();
        service.deposit(addr(1), 5).await.unwrap();
        service.deposit(addr(2), 3).await.unwrap();

        let whitelist: HashSet<Address> = [addr(2)].into_iter().collect();
        let outcome = service.close(CREATOR, PAYOUT, whitelist).await.unwrap();

        assert_eq!(outcome.swept, 5);
        assert_eq!(outcome.retained, 3);
        assert_eq!(service.funds().balance_of(PAYOUT), 5);
        assert!(service.is_whitelisted(addr(2)).await);

        // Post-close refund for the retained balance only.
        assert_eq!(service.refund(addr(2)).await.unwrap(), 3);
        assert_eq!(service.refund(addr(1)).await.unwrap(), 0);
        assert_eq!(service.funds().balance_of(addr(2)), 3);
        assert_eq!(service.funds().balance_of(addr(1)), 0);
    }

    /// Deposits are rejected once the pool closed, and the rejection leaves
    /// the frozen records intact.
    #[tokio::test]
    async fn test_deposit_rejected_after_close() {
        let service = test_service();
        service.deposit(addr(1), 5).await.unwrap();
        service.close_allow_all(CREATOR, PAYOUT).await.unwrap();

        let err = service.deposit(addr(1), 1).await.unwrap_err();
        assert!(matches!(
            err,
            EscrowError::InvalidState {
                operation: "deposit",
                actual: Lifecycle::Closed,
            }
        ));
        assert_eq!(service.distributable_of(addr(1)).await, 5);
    }

    /// Closing an empty pool is legal: nothing to sweep, state flips.
    #[tokio::test]
    async fn test_close_empty_pool() {
        let service = test_service();

        let outcome = service.close_allow_all(CREATOR, PAYOUT).await.unwrap();
        assert_eq!(outcome.swept, 0);
        assert!(service.closed().await);
        assert_eq!(service.funds().balance_of(PAYOUT), 0);
    }

    // =============================================================================
    // KILL FLOWS
    // =============================================================================

    /// Kill sweeps the residual to the creator and terminates the pool.
    #[tokio::test]
    async fn test_kill_sweeps_to_creator_and_terminates() {
        let service = test_service();
        service.deposit(addr(2), 5).await.unwrap();

        let residual = service.kill(CREATOR).await.unwrap();

        assert_eq!(residual, 5);
        assert_eq!(service.funds().balance_of(CREATOR), 5);
        assert_eq!(service.lifecycle().await, Lifecycle::Terminated);

        let err = service.deposit(addr(2), 1).await.unwrap_err();
        assert!(matches!(err, EscrowError::InvalidState { .. }));
    }

    /// Kill is reachable from the Closed state and collects what the close
    /// retained for whitelisted identities.
    #[tokio::test]
    async fn test_kill_after_whitelist_close_collects_retained() {
        let service = test_service();
        service.deposit(addr(1), 5).await.unwrap();
        service.deposit(addr(2), 3).await.unwrap();

        let whitelist: HashSet<Address> = [addr(2)].into_iter().collect();
        service.close(CREATOR, PAYOUT, whitelist).await.unwrap();

        let residual = service.kill(CREATOR).await.unwrap();
        assert_eq!(residual, 3);
        assert_eq!(service.funds().balance_of(CREATOR), 3);
        assert_eq!(service.lifecycle().await, Lifecycle::Terminated);
    }

    /// Terminated pools reject every request, including the zero alias.
    #[tokio::test]
    async fn test_terminated_pool_rejects_everything() {
        let service = test_service();
        service.deposit(addr(1), 5).await.unwrap();
        service.kill(CREATOR).await.unwrap();

        assert!(service.deposit(addr(1), 1).await.is_err());
        assert!(service.refund(addr(1)).await.is_err());
        assert!(service.claim(addr(1)).await.is_err());
        assert!(service.receive(addr(1), 0).await.is_err());
        assert!(service.kill(CREATOR).await.is_err());
    }

    // =============================================================================
    // SWEEP GRANULARITY
    // =============================================================================

    /// Records every outbound transfer the engine requests.
    #[derive(Default)]
    struct RecordingBank {
        sent: std::sync::Mutex<Vec<(Address, Amount)>>,
    }

    #[async_trait::async_trait]
    impl FundsGateway for RecordingBank {
        async fn send(&self, to: Address, amount: Amount) -> Result<(), TransferError> {
            self.sent.lock().unwrap().push((to, amount));
            Ok(())
        }
    }

    /// Close sweeps with ONE aggregate payout transfer, never one transfer
    /// per participant: a single unpayable participant must not be able to
    /// wedge the sweep halfway.
    #[tokio::test]
    async fn test_close_issues_single_aggregate_transfer() {
        let service = EscrowService::new(
            CREATOR,
            RecordingBank::default(),
            InMemoryToken::new(),
            ServiceConfig::default(),
        );
        service.deposit(addr(1), 5).await.unwrap();
        service.deposit(addr(2), 3).await.unwrap();
        service.deposit(addr(3), 2).await.unwrap();

        let whitelist: HashSet<Address> = [addr(3)].into_iter().collect();
        service.close(CREATOR, PAYOUT, whitelist).await.unwrap();

        let sent = service.funds().sent.lock().unwrap().clone();
        assert_eq!(sent, vec![(PAYOUT, 8)]);
    }

    // =============================================================================
    // EVENT STREAM
    // =============================================================================

    /// A full lifecycle publishes one event per committed mutation, in
    /// order.
    #[tokio::test]
    async fn test_event_stream_follows_lifecycle() {
        let service = test_service();
        let mut events = service.subscribe();

        service.deposit(addr(1), 5).await.unwrap();
        service.close_allow_all(CREATOR, PAYOUT).await.unwrap();
        service.kill(CREATOR).await.unwrap();

        assert!(matches!(
            events.recv().await.unwrap(),
            EscrowEvent::Deposit(_)
        ));
        match events.recv().await.unwrap() {
            EscrowEvent::Closed(payload) => {
                assert_eq!(payload.swept, 5);
                assert_eq!(payload.payout, PAYOUT);
            }
            other => panic!("expected close event, got {other:?}"),
        }
        match events.recv().await.unwrap() {
            EscrowEvent::Terminated(payload) => {
                assert_eq!(payload.creator, CREATOR);
                assert_eq!(payload.residual, 0);
            }
            other => panic!("expected termination event, got {other:?}"),
        }
    }
}
