//! # Masternode Agreement
//!
//! Every masternode receiving the same contender groups commits the same
//! block; masternodes without contenders follow through notifications.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Cluster, SLOTS};
    use shared_types::{BlockRef, BlockStore, GENESIS_HASH};

    fn block_hashes(cluster: &Cluster, block_num: u64) -> Vec<[u8; 32]> {
        cluster
            .nodes
            .iter()
            .map(|node| {
                node.container()
                    .store
                    .get_block(BlockRef::Number(block_num))
                    .expect("block stored")
                    .block_hash
            })
            .collect()
    }

    #[tokio::test]
    async fn test_cluster_agrees_on_each_block() {
        let cluster = Cluster::start(3, 3);

        cluster.submit_round(3, GENESIS_HASH, 2).await;
        Cluster::wait_for_height(&cluster.nodes, 2).await;

        let prev = cluster.nodes[0].container().store.latest_hash();
        cluster.submit_round(3, prev, 3).await;
        Cluster::wait_for_height(&cluster.nodes, 3).await;

        for block_num in 2..=3 {
            let hashes = block_hashes(&cluster, block_num);
            assert!(hashes.iter().all(|hash| *hash == hashes[0]));
        }

        let block = cluster.nodes[1]
            .container()
            .store
            .get_block(BlockRef::Number(3))
            .unwrap();
        assert_eq!(block.sub_blocks.len(), SLOTS as usize);
        assert_eq!(block.prev_block_hash, prev);
        assert!(!block.is_failed());

        for node in &cluster.nodes {
            assert_eq!(
                node.container().state.get("slot-1").as_deref(),
                Some("block-3-slot-1")
            );
        }

        cluster.shutdown().await;
    }

    #[tokio::test]
    async fn test_notifications_carry_non_producers() {
        let cluster = Cluster::start(3, 3);

        // Only the first masternode receives contenders.
        cluster.submit_round(1, GENESIS_HASH, 2).await;
        Cluster::wait_for_height(&cluster.nodes, 2).await;

        let hashes = block_hashes(&cluster, 2);
        assert!(hashes.iter().all(|hash| *hash == hashes[0]));
        assert_eq!(
            cluster.nodes[2].container().state.get("slot-0").as_deref(),
            Some("block-2-slot-0")
        );

        cluster.shutdown().await;
    }
}
