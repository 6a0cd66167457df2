#[cfg(test)]
mod tests {
    use crate::ring::HashRing;

    /// Ring whose placement is the decimal value of the hashed bytes, so
    /// virtual node "1" + peer "6" lands exactly on position 16.
    fn decimal_ring(replicas: usize) -> HashRing {
        HashRing::with_hash(
            replicas,
            Box::new(|data| {
                std::str::from_utf8(data)
                    .expect("test keys are utf-8")
                    .parse()
                    .expect("test keys are decimal")
            }),
        )
    }

    #[test]
    fn test_empty_ring_has_no_owner() {
        let ring = HashRing::new(3);
        assert!(ring.is_empty());
        assert_eq!(ring.get("any"), None);
    }

    #[test]
    fn test_routing_with_pinned_hash() {
        let mut ring = decimal_ring(3);
        // Virtual nodes land on 2/12/22, 4/14/24, 6/16/26.
        ring.add(["6", "4", "2"]);
        assert_eq!(ring.len(), 9);

        assert_eq!(ring.get("2"), Some("2"));
        assert_eq!(ring.get("11"), Some("2"));
        assert_eq!(ring.get("23"), Some("4"));
        assert_eq!(ring.get("27"), Some("2"));
    }

    #[test]
    fn test_added_peer_takes_over_keys() {
        let mut ring = decimal_ring(3);
        ring.add(["6", "4", "2"]);
        assert_eq!(ring.get("27"), Some("2"));

        // Peer 8 places 8/18/28; 27 now resolves to it.
        ring.add(["8"]);
        assert_eq!(ring.get("27"), Some("8"));
        assert_eq!(ring.get("23"), Some("4"));
    }

    #[test]
    fn test_wraparound_to_lowest_position() {
        let mut ring = decimal_ring(1);
        ring.add(["10", "20"]);

        // "25" hashes past every position and wraps to 010 = 10.
        assert_eq!(ring.get("25"), Some("10"));
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let mut ring = HashRing::new(50);
        ring.add(["http://10.0.0.1:8001", "http://10.0.0.2:8001", "http://10.0.0.3:8001"]);

        for i in 0..100 {
            let key = format!("key_{}", i);
            let first = ring.get(&key).map(str::to_string);
            assert!(first.is_some());
            for _ in 0..5 {
                assert_eq!(ring.get(&key).map(str::to_string), first);
            }
        }
    }

    #[test]
    fn test_peers_share_the_keyspace() {
        let mut ring = HashRing::new(50);
        ring.add(["a", "b", "c"]);

        let mut owners = std::collections::HashSet::new();
        for i in 0..1000 {
            if let Some(owner) = ring.get(&format!("key_{}", i)) {
                owners.insert(owner.to_string());
            }
        }
        // With 50 virtual nodes per peer, all three should own something.
        assert_eq!(owners.len(), 3);
    }
}
