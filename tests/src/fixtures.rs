//! # Test Fixtures
//!
//! Deterministic delegates and a cluster of masternodes sharing one
//! in-process transport.

use std::sync::Arc;
use std::time::Duration;

use node_runtime::{LocalTransport, MasternodeContainer, NodeConfig, NodeRuntime, RuntimeHandles};
use qc_08_subblock_consensus::{AggregatorConfig, ContenderGroup};
use qc_13_catchup_sync::CatchupConfig;
use shared_types::{BlockStore, Hash, StateChange, SubBlockContender, TransactionData, Wallet};

/// Sub-block slots per block in cluster tests.
pub const SLOTS: u32 = 2;

/// Delegates with fixed seeds `100..100 + count`.
pub fn delegates(count: u8) -> Vec<Wallet> {
    (0..count).map(|i| Wallet::from_seed([100 + i; 32])).collect()
}

/// A transaction writing `payload` under `key`.
pub fn transaction(key: &str, payload: &str) -> TransactionData {
    TransactionData {
        transaction: payload.as_bytes().to_vec(),
        status: 0,
        state: vec![StateChange {
            key: key.to_string(),
            value: payload.to_string(),
        }],
        stamps_used: 1,
    }
}

/// The group `delegate` submits for `block_num`: one transaction per slot,
/// identical across delegates so every slot agrees.
pub fn contender_group(delegate: &Wallet, prev: Hash, block_num: u64, slots: u32) -> ContenderGroup {
    let contenders = (0..slots)
        .map(|slot| {
            let payload = format!("block-{}-slot-{}", block_num, slot);
            let txs = vec![transaction(&format!("slot-{}", slot), &payload)];
            SubBlockContender::build(delegate, [slot as u8 + 1; 32], txs, slot, prev)
                .expect("contender encodes")
        })
        .collect();
    ContenderGroup {
        sender: delegate.public_key(),
        contenders,
    }
}

/// Node configuration for a committee of `delegates` where every member
/// must agree on each slot.
pub fn cluster_config(delegates: &[Wallet]) -> NodeConfig {
    NodeConfig {
        aggregator: AggregatorConfig {
            quorum_ratio: 1.0,
            slot_count: SLOTS,
            round_timeout_ms: 5_000,
            min_quorum: None,
        },
        catchup: CatchupConfig::for_testing(),
        committee: delegates.iter().map(Wallet::public_key).collect(),
        node_seed: None,
        sync_retry_ms: 50,
    }
}

/// A started masternode.
pub struct RunningNode {
    pub runtime: NodeRuntime,
    pub handles: RuntimeHandles,
}

impl RunningNode {
    pub fn container(&self) -> &Arc<MasternodeContainer> {
        self.runtime.container()
    }

    pub fn height(&self) -> u64 {
        self.container().store.latest_height()
    }
}

/// Masternodes on one transport, fed by a fixed delegate committee.
pub struct Cluster {
    pub transport: LocalTransport,
    pub delegates: Vec<Wallet>,
    pub nodes: Vec<RunningNode>,
}

impl Cluster {
    /// Start `masternodes` nodes with seeds `1..=masternodes`.
    pub fn start(masternodes: u8, delegate_count: u8) -> Self {
        let mut cluster = Self {
            transport: LocalTransport::new(),
            delegates: delegates(delegate_count),
            nodes: Vec::new(),
        };
        for seed in 1..=masternodes {
            cluster.join(seed);
        }
        cluster
    }

    /// Start one more masternode on the shared transport.
    pub fn join(&mut self, seed: u8) -> &RunningNode {
        let runtime = NodeRuntime::new(
            cluster_config(&self.delegates),
            &Wallet::from_seed([seed; 32]),
            self.transport.clone(),
        )
        .expect("valid cluster config");
        let handles = runtime.start();
        self.nodes.push(RunningNode { runtime, handles });
        &self.nodes[self.nodes.len() - 1]
    }

    /// Send every delegate's group for the next block to the first
    /// `producers` nodes, one delegate at a time.
    pub async fn submit_round(&self, producers: usize, prev: Hash, block_num: u64) {
        for delegate in &self.delegates {
            let group = contender_group(delegate, prev, block_num, SLOTS);
            for node in &self.nodes[..producers] {
                assert!(node.container().contenders.submit(group.clone()).await);
            }
        }
    }

    /// Wait until every node in `nodes` reaches `height`.
    pub async fn wait_for_height(nodes: &[RunningNode], height: u64) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while nodes.iter().any(|node| node.height() < height) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            let heights: Vec<u64> = nodes.iter().map(RunningNode::height).collect();
            panic!("nodes stuck at {:?}, expected {}", heights, height)
        });
    }

    pub async fn shutdown(self) {
        for node in &self.nodes {
            node.runtime.shutdown();
        }
        for node in self.nodes {
            let result = node.handles.masternode.await.expect("masternode task");
            assert!(result.is_ok(), "masternode failed: {:?}", result.err());
        }
    }
}
