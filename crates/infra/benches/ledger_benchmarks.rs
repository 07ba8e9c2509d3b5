use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use credits_core::{Nonce, OwnerId, TenantId};
use credits_infra::LedgerEngine;
use credits_infra::ledger_store::{InMemoryLedgerStore, LedgerStore};
use credits_ledger::{NewLedgerEntry, OperationKind, OperationValues, TenantConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Runtime;

fn engine() -> LedgerEngine<InMemoryLedgerStore> {
    let config = TenantConfig::health_ai();
    let store = InMemoryLedgerStore::new(config.tenant.clone());
    LedgerEngine::from_config(&config, Arc::new(OperationValues::standard()), store).unwrap()
}

fn nonce(counter: &AtomicU64) -> Nonce {
    format!("n{}", counter.fetch_add(1, Ordering::Relaxed))
        .parse()
        .unwrap()
}

/// Append throughput for credits (plain append) vs debits (covered append).
fn bench_add_entry(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let owner: OwnerId = "bench-user".parse().unwrap();
    let counter = AtomicU64::new(0);

    let mut group = c.benchmark_group("add_entry");
    group.throughput(Throughput::Elements(1));

    let credits = engine();
    group.bench_function("credit", |b| {
        b.iter(|| {
            rt.block_on(credits.add_entry(
                owner.clone(),
                OperationKind::parse("DAILY_REWARD").unwrap(),
                nonce(&counter),
            ))
            .unwrap()
        })
    });

    let debits = engine();
    rt.block_on(debits.store().append(NewLedgerEntry::new(
        owner.clone(),
        OperationKind::parse("CREDIT_ADD").unwrap(),
        1_000_000_000,
        nonce(&counter),
    )))
    .unwrap();
    group.bench_function("debit", |b| {
        b.iter(|| {
            rt.block_on(debits.add_entry(
                owner.clone(),
                OperationKind::parse("CREDIT_SPEND").unwrap(),
                nonce(&counter),
            ))
        })
    });

    group.finish();
}

/// Balance reads scale with the owner's history length.
fn bench_get_balance(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let counter = AtomicU64::new(0);
    let mut group = c.benchmark_group("get_balance");

    for history in [10usize, 100, 1_000] {
        let engine = engine();
        let owner: OwnerId = format!("owner-{history}").parse().unwrap();
        rt.block_on(async {
            for _ in 0..history {
                engine
                    .add_entry(owner.clone(), OperationKind::parse("DAILY_REWARD").unwrap(), nonce(&counter))
                    .await
                    .unwrap();
            }
        });

        group.bench_with_input(BenchmarkId::from_parameter(history), &history, |b, _| {
            b.iter(|| rt.block_on(engine.get_balance(black_box(&owner))).unwrap())
        });
    }

    group.finish();
}

fn bench_tenant_lookup(c: &mut Criterion) {
    let tenant = TenantId::parse("HealthAI").unwrap();
    c.bench_function("tenant_id_parse", |b| {
        b.iter(|| TenantId::parse(black_box(tenant.as_str())).unwrap())
    });
}

criterion_group!(benches, bench_add_entry, bench_get_balance, bench_tenant_lookup);
criterion_main!(benches);
