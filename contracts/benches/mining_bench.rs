// Mining and ledger benchmarks for Regalium.
//
// Covers the proof digest, the full verify path, nonce search at a few
// difficulties, and the hot ledger operations a node applies per request.

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use regalium_contracts::mining::{search_nonce, verify, Blake3Pow, ProofOfWork};
use regalium_contracts::{Operation, RegaliumToken, TokenConfig};
use regalium_protocol::Address;

fn bench_digest(c: &mut Criterion) {
    let miner = Address::from("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");

    c.bench_function("pow/blake3_digest", |b| {
        b.iter(|| Blake3Pow.digest(black_box(&miner), black_box(42), black_box(1_000)));
    });

    c.bench_function("pow/verify", |b| {
        b.iter(|| verify(&Blake3Pow, black_box(&miner), black_box(42), black_box(1_000)));
    });
}

fn bench_search(c: &mut Criterion) {
    let miner = Address::from("0xminer");
    let mut group = c.benchmark_group("pow/search_nonce");

    for difficulty in [16u64, 256, 4_096] {
        group.bench_with_input(
            BenchmarkId::from_parameter(difficulty),
            &difficulty,
            |b, &difficulty| {
                b.iter(|| search_nonce(&Blake3Pow, &miner, difficulty, 0, u64::MAX));
            },
        );
    }

    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let owner = Address::from("owner");
    let alice = Address::from("alice");
    let token = RegaliumToken::deploy(owner.clone(), &TokenConfig::default());
    let now = Utc::now() - Duration::days(1);

    let transfer = Operation::Transfer {
        to: alice.clone(),
        amount: 1_000,
    };
    c.bench_function("ledger/apply_transfer", |b| {
        b.iter_batched(
            || token.clone(),
            |mut t| t.apply(&owner, &transfer, now),
            criterion::BatchSize::SmallInput,
        );
    });

    let stake = Operation::Stake { amount: 1_000 };
    c.bench_function("ledger/apply_stake", |b| {
        b.iter_batched(
            || token.clone(),
            |mut t| t.apply(&owner, &stake, now),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_digest, bench_search, bench_apply);
criterion_main!(benches);
