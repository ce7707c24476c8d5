//! # Escrow Engine Benchmarks
//!
//! Throughput checks for the hot paths:
//!
//! | Path | Target |
//! |------|--------|
//! | Ledger credit/zero | < 1us |
//! | Deposit through the service | < 10us |
//! | Close with many participants | linear in pool size |

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use escrow_engine::prelude::*;

const CREATOR: Address = Address::new([0xCC; 20]);
const PAYOUT: Address = Address::new([0xFF; 20]);

fn participant(index: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[..8].copy_from_slice(&index.to_be_bytes());
    bytes[19] = 1;
    Address::new(bytes)
}

// ============================================================================
// Ledger primitives
// ============================================================================

fn bench_ledger_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger");

    group.throughput(Throughput::Elements(1));
    group.bench_function("credit_single", |b| {
        let mut ledger = Ledger::new();
        let mut index = 0u64;
        b.iter(|| {
            index += 1;
            ledger.credit(participant(index), 1).unwrap();
            black_box(ledger.total())
        })
    });

    group.bench_function("credit_then_zero", |b| {
        let mut ledger = Ledger::new();
        let addr = participant(7);
        b.iter(|| {
            ledger.credit(addr, 5).unwrap();
            black_box(ledger.zero(addr))
        })
    });

    group.finish();
}

// ============================================================================
// Service paths
// ============================================================================

fn bench_service_deposit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("service");

    group.throughput(Throughput::Elements(1));
    group.bench_function("deposit", |b| {
        let service = create_test_service(CREATOR);
        let buyer = participant(1);
        b.iter(|| {
            rt.block_on(async { service.deposit(buyer, 1).await.unwrap() });
        })
    });

    group.bench_function("deposit_refund_cycle", |b| {
        let service = create_test_service(CREATOR);
        let buyer = participant(1);
        b.iter(|| {
            rt.block_on(async {
                service.deposit(buyer, 5).await.unwrap();
                black_box(service.refund(buyer).await.unwrap())
            })
        })
    });

    group.finish();
}

fn bench_close_scaling(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("close");

    for pool_size in [10u64, 100, 1000] {
        group.throughput(Throughput::Elements(pool_size));
        group.bench_with_input(
            BenchmarkId::new("close_allow_all", pool_size),
            &pool_size,
            |b, &size| {
                b.iter_batched(
                    || {
                        let service = create_test_service(CREATOR);
                        rt.block_on(async {
                            for index in 0..size {
                                service.deposit(participant(index), 10).await.unwrap();
                            }
                        });
                        service
                    },
                    |service| {
                        rt.block_on(async {
                            black_box(service.close_allow_all(CREATOR, PAYOUT).await.unwrap())
                        })
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_ledger_ops,
    bench_service_deposit,
    bench_close_scaling
);
criterion_main!(benches);
