use super::*;
use crate::adapters::{contender_channel, ContenderSender, Ed25519Verifier, StaticCommittee};
use shared_types::{
    InMemoryBlockStore, StateChange, SubBlockContender, TransactionData, Wallet,
    FAILED_BLOCK_HASH, GENESIS_HASH,
};
use std::time::Duration;

/// Accepts every signature. Used where crypto is not under test.
struct MockSigVerifier;

impl SignatureVerifier for MockSigVerifier {
    fn verify(&self, _pk: &PublicKey, _msg: &[u8], _sig: &shared_types::Signature) -> bool {
        true
    }
}

type TestAggregator<S> =
    BlockAggregator<crate::adapters::ChannelContenderFeed, S, StaticCommittee, InMemoryBlockStore>;

struct Harness<S: SignatureVerifier> {
    members: Vec<Wallet>,
    sender: ContenderSender,
    store: Arc<InMemoryBlockStore>,
    aggregator: TestAggregator<S>,
}

fn harness_with<S: SignatureVerifier>(
    committee_size: u8,
    config: AggregatorConfig,
    verifier: S,
) -> Harness<S> {
    let members: Vec<Wallet> = (1..=committee_size)
        .map(|i| Wallet::from_seed([i; 32]))
        .collect();
    let (sender, feed) = contender_channel(64);
    let store = Arc::new(InMemoryBlockStore::new());
    let roster = StaticCommittee::new(members.iter().map(Wallet::public_key).collect());

    let aggregator = BlockAggregator::new(AggregatorDependencies {
        feed: Arc::new(feed),
        verifier: Arc::new(verifier),
        roster: Arc::new(roster),
        store: Arc::clone(&store),
        config,
    });

    Harness {
        members,
        sender,
        store,
        aggregator,
    }
}

fn harness(committee_size: u8) -> Harness<Ed25519Verifier> {
    harness_with(committee_size, AggregatorConfig::default(), Ed25519Verifier)
}

fn tx(payload: &[u8]) -> TransactionData {
    TransactionData {
        transaction: payload.to_vec(),
        status: 0,
        state: vec![StateChange {
            key: "currency.balances".to_string(),
            value: String::from_utf8_lossy(payload).into_owned(),
        }],
        stamps_used: 2,
    }
}

/// One contender per slot; an empty payload produces an empty slot.
fn group(wallet: &Wallet, prev: Hash, payloads: &[&[u8]]) -> ContenderGroup {
    let contenders = payloads
        .iter()
        .enumerate()
        .map(|(slot, payload)| {
            let txs = if payload.is_empty() {
                vec![]
            } else {
                vec![tx(payload)]
            };
            SubBlockContender::build(wallet, [slot as u8 + 1; 32], txs, slot as u32, prev).unwrap()
        })
        .collect();
    ContenderGroup {
        sender: wallet.public_key(),
        contenders,
    }
}

#[tokio::test]
async fn test_unanimous_round_is_new() {
    let h = harness(4);
    for member in &h.members[..3] {
        h.sender
            .submit(group(member, GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
            .await;
    }

    let outcome = h.aggregator.gather_round().await.unwrap();

    assert_eq!(outcome.kind, BlockKind::New);
    assert_eq!(outcome.quorum, 3);
    assert_eq!(outcome.block.block_num, 2);
    assert_eq!(outcome.block.sub_blocks.len(), 4);
    assert!(CanonicalHasher::verify(
        &outcome.block.sub_blocks,
        &GENESIS_HASH,
        &outcome.block.block_hash
    ));
    assert_eq!(outcome.block.block_owners.len(), 3);
}

#[tokio::test]
async fn test_late_vote_joins_decided_slot() {
    let config = AggregatorConfig {
        slot_count: 2,
        ..AggregatorConfig::default()
    };
    let h = harness_with(4, config, Ed25519Verifier);
    // Slot 1 splits 2:1 after three groups, so the round keeps gathering.
    h.sender
        .submit(group(&h.members[0], GENESIS_HASH, &[b"a", b"x"]))
        .await;
    h.sender
        .submit(group(&h.members[1], GENESIS_HASH, &[b"a", b"x"]))
        .await;
    h.sender
        .submit(group(&h.members[2], GENESIS_HASH, &[b"a", b"y"]))
        .await;
    h.sender
        .submit(group(&h.members[3], GENESIS_HASH, &[b"a", b"x"]))
        .await;

    let outcome = h.aggregator.gather_round().await.unwrap();

    assert_eq!(outcome.kind, BlockKind::New);
    assert_eq!(outcome.block.sub_blocks[0].signatures.len(), 4);
    assert_eq!(outcome.block.sub_blocks[1].signatures.len(), 3);
}

#[tokio::test]
async fn test_empty_results_are_skip() {
    let h = harness(4);
    for member in &h.members[..3] {
        h.sender
            .submit(group(member, GENESIS_HASH, &[b"", b"", b"", b""]))
            .await;
    }

    let outcome = h.aggregator.gather_round().await.unwrap();

    assert_eq!(outcome.kind, BlockKind::Skip);
    assert!(outcome.block.is_skip());
    assert_ne!(outcome.block.block_hash, FAILED_BLOCK_HASH);
}

#[tokio::test]
async fn test_split_vote_fails_with_sentinel() {
    let h = harness(4);
    h.sender
        .submit(group(&h.members[0], GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
        .await;
    h.sender
        .submit(group(&h.members[1], GENESIS_HASH, &[b"x", b"b", b"c", b"d"]))
        .await;
    h.sender
        .submit(group(&h.members[2], GENESIS_HASH, &[b"y", b"b", b"c", b"d"]))
        .await;

    let outcome = h.aggregator.gather_round().await.unwrap();

    assert_eq!(outcome.kind, BlockKind::Fail);
    assert_eq!(outcome.block, Block::failed(GENESIS_HASH, 2));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_adapts_quorum() {
    let h = harness(10);
    // Quorum 7; six agreeing groups reach 90% of it.
    for member in &h.members[..6] {
        h.sender
            .submit(group(member, GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
            .await;
    }

    let outcome = h.aggregator.gather_round().await.unwrap();

    assert_eq!(outcome.kind, BlockKind::New);
    assert_eq!(outcome.quorum, 6);
    assert_eq!(outcome.block.sub_blocks[0].signatures.len(), 6);
    assert!(!outcome.block.is_failed());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_without_enough_votes_fails() {
    let h = harness(4);
    h.sender
        .submit(group(&h.members[0], GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
        .await;

    let outcome = h.aggregator.gather_round().await.unwrap();

    assert_eq!(outcome.kind, BlockKind::Fail);
    assert!(outcome.block.is_failed());
}

#[tokio::test(start_paused = true)]
async fn test_min_quorum_blocks_adaptation() {
    let config = AggregatorConfig {
        min_quorum: Some(3),
        ..AggregatorConfig::default()
    };
    let h = harness_with(4, config, Ed25519Verifier);
    for member in &h.members[..2] {
        h.sender
            .submit(group(member, GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
            .await;
    }

    let outcome = h.aggregator.gather_round().await.unwrap();
    assert_eq!(outcome.kind, BlockKind::Fail);
}

#[tokio::test]
async fn test_rejected_groups_do_not_vote() {
    let h = harness(4);
    let outsider = Wallet::from_seed([99u8; 32]);

    // Outsider, stale tip, duplicate signer: none may count.
    h.sender
        .submit(group(&outsider, GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
        .await;
    h.sender
        .submit(group(&h.members[0], [5u8; 32], &[b"a", b"b", b"c", b"d"]))
        .await;
    h.sender
        .submit(group(&h.members[1], GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
        .await;
    h.sender
        .submit(group(&h.members[1], GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
        .await;
    h.sender
        .submit(group(&h.members[2], GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
        .await;
    h.sender
        .submit(group(&h.members[3], GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
        .await;

    let outcome = h.aggregator.gather_round().await.unwrap();

    assert_eq!(outcome.kind, BlockKind::New);
    let signers: Vec<_> = outcome.block.sub_blocks[0].signers().copied().collect();
    assert_eq!(signers.len(), 3);
    assert!(!signers.contains(&outsider.public_key()));
    assert!(!signers.contains(&h.members[0].public_key()));
}

#[tokio::test]
async fn test_partial_group_is_rejected_whole() {
    let h = harness_with(2, AggregatorConfig::default(), MockSigVerifier);
    let mut short = group(&h.members[0], GENESIS_HASH, &[b"a", b"b", b"c", b"d"]);
    short.contenders.pop();
    h.sender.submit(short).await;
    for member in &h.members {
        h.sender
            .submit(group(member, GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
            .await;
    }

    let outcome = h.aggregator.gather_round().await.unwrap();
    assert_eq!(outcome.kind, BlockKind::New);
    assert_eq!(outcome.block.sub_blocks[3].signatures.len(), 2);
}

#[tokio::test]
async fn test_rounds_follow_the_stored_tip() {
    let h = harness(1);
    h.sender
        .submit(group(&h.members[0], GENESIS_HASH, &[b"a", b"", b"", b""]))
        .await;
    let first = h.aggregator.gather_round().await.unwrap();
    h.store.put_block(first.block.clone()).unwrap();

    let tip = h.store.latest_hash();
    h.sender
        .submit(group(&h.members[0], tip, &[b"b", b"", b"", b""]))
        .await;
    let second = h.aggregator.gather_round().await.unwrap();

    assert_eq!(second.block.block_num, first.block.block_num + 1);
    assert_eq!(second.block.prev_block_hash, first.block.block_hash);
}

#[tokio::test]
async fn test_stop_while_waiting() {
    let h = harness(4);
    let (stop_tx, stop_rx) = watch::channel(false);
    let aggregator = h.aggregator.with_stop(stop_rx);

    let handle = tokio::spawn(async move { aggregator.gather_round().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    stop_tx.send(true).unwrap();

    let result = handle.await.unwrap();
    assert!(matches!(result, Err(AggregationError::Stopped)));
}

#[tokio::test]
async fn test_closed_feed_is_retryable_error() {
    let h = harness(4);
    drop(h.sender);

    let result = h.aggregator.gather_round().await;
    assert!(matches!(result, Err(AggregationError::FeedClosed)));
}

#[tokio::test]
async fn test_empty_committee_fails_fast() {
    let h = harness(0);
    let result = h.aggregator.gather_round().await;
    assert!(matches!(result, Err(AggregationError::EmptyCommittee)));
}

#[tokio::test]
async fn test_round_builds_on_tip_at_first_contender() {
    let h = harness(1);
    let (outcome, _) = tokio::join!(h.aggregator.gather_round(), async {
        // A peer's block lands while the aggregator idles.
        tokio::task::yield_now().await;
        h.store.put_block(Block::failed(GENESIS_HASH, 2)).unwrap();
        h.sender
            .submit(group(&h.members[0], FAILED_BLOCK_HASH, &[b"a", b"b", b"c", b"d"]))
            .await;
    });

    let outcome = outcome.unwrap();
    assert_eq!(outcome.kind, BlockKind::New);
    assert_eq!(outcome.block.block_num, 3);
    assert_eq!(outcome.block.prev_block_hash, FAILED_BLOCK_HASH);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_groups_never_start_a_round() {
    let h = harness(4);
    let outsider = Wallet::from_seed([99u8; 32]);
    h.sender
        .submit(group(&outsider, GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
        .await;
    h.sender
        .submit(group(&h.members[0], [5u8; 32], &[b"a", b"b", b"c", b"d"]))
        .await;

    // Well past the round deadline: still waiting for a first valid group.
    let waited = tokio::time::timeout(Duration::from_secs(600), h.aggregator.gather_round()).await;

    assert!(waited.is_err());
    assert_eq!(h.store.latest_height(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_round_clock_starts_at_first_valid_group() {
    let h = harness(4);
    let outsider = Wallet::from_seed([99u8; 32]);
    h.sender
        .submit(group(&outsider, GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
        .await;

    let (outcome, _) = tokio::join!(h.aggregator.gather_round(), async {
        tokio::time::sleep(Duration::from_secs(120)).await;
        h.sender
            .submit(group(&h.members[0], GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
            .await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        for member in &h.members[1..3] {
            h.sender
                .submit(group(member, GENESIS_HASH, &[b"a", b"b", b"c", b"d"]))
                .await;
        }
    });

    let outcome = outcome.unwrap();
    assert_eq!(outcome.kind, BlockKind::New);
    assert_eq!(outcome.block.block_num, 2);
    assert_eq!(outcome.block.sub_blocks[0].signatures.len(), 3);
}
