//! Shared fixtures for the escrow test suites.

use escrow_engine::prelude::*;

/// Fixed creator identity used across the suites.
pub const CREATOR: Address = Address::new([0xCC; 20]);

/// Fixed payout address used across the suites.
pub const PAYOUT: Address = Address::new([0xFF; 20]);

/// Fixed distribution token used across the suites.
pub const TOKEN: Address = Address::new([0xEE; 20]);

/// Shorthand for a test identity.
#[must_use]
pub fn addr(byte: u8) -> Address {
    Address::new([byte; 20])
}

/// Initialize a fmt subscriber once; respects `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A service wired to in-memory gateways, owned pool creator `CREATOR`.
#[must_use]
pub fn test_service() -> EscrowService<InMemoryBank, InMemoryToken> {
    init_tracing();
    create_test_service(CREATOR)
}
