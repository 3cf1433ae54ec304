//! # Masternode Subsystem Benchmarks
//!
//! | Subsystem | Operation |
//! |-----------|-----------|
//! | shared-types | Canonical block hash |
//! | qc-08 | Contender group validation (Ed25519) |
//! | qc-08 | Vote tally for a full committee |

use std::collections::BTreeSet;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_08_subblock_consensus::{ContenderValidator, Ed25519Verifier, VoteTally};
use qc_tests::fixtures::{contender_group, delegates};
use shared_types::{CanonicalHasher, PublicKey, SubBlock, SubBlockSignature, Wallet, GENESIS_HASH};

// ============================================================================
// Canonical hashing
// ============================================================================

fn bench_canonical_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonical-hash");
    group.measurement_time(Duration::from_secs(5));

    let signer = Wallet::from_seed([1u8; 32]);
    for slots in [1u32, 4, 16] {
        let sub_blocks: Vec<SubBlock> = contender_group(&signer, GENESIS_HASH, 2, slots)
            .contenders
            .iter()
            .map(|sbc| {
                let signature = SubBlockSignature {
                    signer: sbc.signer,
                    signature: sbc.signature,
                };
                SubBlock::from_contender(sbc, vec![signature])
            })
            .collect();

        group.throughput(Throughput::Elements(slots as u64));
        group.bench_with_input(BenchmarkId::new("hash", slots), &sub_blocks, |b, sub_blocks| {
            b.iter(|| black_box(CanonicalHasher::hash(sub_blocks, &GENESIS_HASH)))
        });
    }
    group.finish();
}

// ============================================================================
// qc-08: validation and tally
// ============================================================================

fn bench_group_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-08-validation");

    let signer = Wallet::from_seed([1u8; 32]);
    let committee: BTreeSet<PublicKey> = [signer.public_key()].into_iter().collect();
    for slots in [1u32, 4, 16] {
        let contenders = contender_group(&signer, GENESIS_HASH, 2, slots).contenders;
        group.throughput(Throughput::Elements(slots as u64));
        group.bench_with_input(BenchmarkId::new("group", slots), &contenders, |b, contenders| {
            b.iter(|| {
                black_box(ContenderValidator::validate_group(
                    contenders,
                    slots,
                    &GENESIS_HASH,
                    &committee,
                    &Ed25519Verifier,
                ))
            })
        });
    }
    group.finish();
}

fn bench_vote_tally(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-08-tally");
    const SLOTS: u32 = 4;

    for size in [4u8, 16, 64] {
        let groups: Vec<_> = delegates(size)
            .iter()
            .map(|delegate| contender_group(delegate, GENESIS_HASH, 2, SLOTS).contenders)
            .collect();
        let quorum = (size as usize * 2).div_ceil(3);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("committee", size), &groups, |b, groups| {
            b.iter(|| {
                let mut tally = VoteTally::new(size as usize, quorum);
                for contenders in groups {
                    tally.add_contenders(contenders.clone());
                }
                black_box(tally.is_finalized(SLOTS))
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_canonical_hash,
    bench_group_validation,
    bench_vote_tally
);
criterion_main!(benches);
