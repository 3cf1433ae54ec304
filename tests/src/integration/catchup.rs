//! # Late Joiners
//!
//! A masternode that starts after the chain has grown fetches the missing
//! blocks from its peers, then keeps up through notifications.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::fixtures::Cluster;
    use qc_13_catchup_sync::{BlockServer, LocalPeerNetwork};
    use shared_types::{BlockRef, BlockStore, InMemoryBlockStore, GENESIS_HASH};

    /// Run rounds `2..=last` on the first `producers` nodes.
    async fn produce(cluster: &Cluster, producers: usize, last: u64) {
        let mut prev = GENESIS_HASH;
        for block_num in 2..=last {
            cluster.submit_round(producers, prev, block_num).await;
            Cluster::wait_for_height(&cluster.nodes[..producers], block_num).await;
            prev = cluster.nodes[0].container().store.latest_hash();
        }
    }

    fn same_chain(a: &InMemoryBlockStore, b: &InMemoryBlockStore, through: u64) -> bool {
        (2..=through).all(|num| {
            a.get_block(BlockRef::Number(num)) == b.get_block(BlockRef::Number(num))
        })
    }

    #[tokio::test]
    async fn test_late_node_catches_up_and_follows() {
        let mut cluster = Cluster::start(3, 3);
        produce(&cluster, 3, 4).await;

        cluster.join(9);
        Cluster::wait_for_height(&cluster.nodes[3..], 4).await;
        assert!(same_chain(
            &cluster.nodes[0].container().store,
            &cluster.nodes[3].container().store,
            4
        ));
        assert_eq!(
            cluster.nodes[3].container().state.get("slot-1").as_deref(),
            Some("block-4-slot-1")
        );

        // The late node gets no contenders; it follows the producers.
        let prev = cluster.nodes[0].container().store.latest_hash();
        cluster.submit_round(3, prev, 5).await;
        Cluster::wait_for_height(&cluster.nodes, 5).await;
        assert!(same_chain(
            &cluster.nodes[0].container().store,
            &cluster.nodes[3].container().store,
            5
        ));

        cluster.shutdown().await;
    }

    #[tokio::test]
    async fn test_late_node_ignores_lying_peer() {
        let mut cluster = Cluster::start(2, 3);
        produce(&cluster, 2, 3).await;

        // A peer at the right height serving blocks whose content does not
        // match their hash.
        let liar_store = Arc::new(InMemoryBlockStore::new());
        for num in 2..=3 {
            let mut forged = cluster.nodes[0]
                .container()
                .store
                .get_block(BlockRef::Number(num))
                .unwrap();
            forged.sub_blocks[0].transactions[0].status = 1;
            liar_store.put_block(forged).unwrap();
        }
        LocalPeerNetwork::register(
            &cluster.transport.servers,
            [66u8; 32],
            Arc::new(BlockServer::new(liar_store)),
        );

        cluster.join(9);
        Cluster::wait_for_height(&cluster.nodes[2..], 3).await;

        let late = cluster.nodes[2].container();
        assert!(same_chain(&cluster.nodes[0].container().store, &late.store, 3));
        assert_eq!(late.state.get("slot-0").as_deref(), Some("block-3-slot-0"));

        cluster.shutdown().await;
    }
}
