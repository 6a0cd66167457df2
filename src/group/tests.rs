#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use anyhow::Result;

    use crate::cache::ByteView;
    use crate::error::CacheError;
    use crate::group::{get_group, new_group, Group};
    use crate::transport::{PeerClient, PeerPicker};

    /// The slow backing source the cache sits in front of.
    fn db() -> HashMap<&'static str, &'static str> {
        HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")])
    }

    /// Group backed by `db`, counting origin loads per key.
    fn scores_group(name: &str) -> (Arc<Group>, Arc<Mutex<HashMap<String, usize>>>) {
        let load_counts: Arc<Mutex<HashMap<String, usize>>> = Arc::new(Mutex::new(HashMap::new()));
        let counts = load_counts.clone();

        let group = new_group(name, 2048, move |key: String| {
            let counts = counts.clone();
            async move {
                tracing::info!("querying origin for key {}", key);
                match db().get(key.as_str()) {
                    Some(value) => {
                        *counts.lock().unwrap().entry(key).or_insert(0) += 1;
                        Ok(value.as_bytes().to_vec())
                    }
                    None => Err(anyhow::anyhow!("{} not exist", key)),
                }
            }
        });
        (group, load_counts)
    }

    // ============================================================
    // LOOKUP TESTS
    // ============================================================

    #[tokio::test]
    async fn test_get_hits_origin_once_per_key() {
        let (group, load_counts) = scores_group("scores_basic");

        for (key, value) in db() {
            // Cold lookup reaches the origin.
            let view = group.get(key).await.unwrap();
            assert_eq!(view.to_string(), value);
            assert_eq!(load_counts.lock().unwrap()[key], 1);

            // Warm lookup is answered by the cache.
            let view = group.get(key).await.unwrap();
            assert_eq!(view.to_string(), value);
            assert_eq!(load_counts.lock().unwrap()[key], 1);
        }

        assert_eq!(group.cached_entries(), 3);
    }

    #[tokio::test]
    async fn test_unknown_key_surfaces_origin_error() {
        let (group, load_counts) = scores_group("scores_unknown");

        let err = group.get("unknown").await.unwrap_err();
        assert!(matches!(err, CacheError::Origin(_)));
        assert!(err.to_string().contains("unknown not exist"));

        // Failures are not cached.
        assert!(load_counts.lock().unwrap().get("unknown").is_none());
        assert_eq!(group.cached_entries(), 0);
    }

    #[tokio::test]
    async fn test_empty_key_rejected_without_loading() {
        let (group, load_counts) = scores_group("scores_empty_key");

        let err = group.get("").await.unwrap_err();
        assert!(matches!(err, CacheError::KeyRequired));
        assert!(load_counts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_gets_coalesce_into_one_load() {
        let executions = Arc::new(AtomicUsize::new(0));
        let counter = executions.clone();

        let group = new_group("scores_coalesce", 2048, move |_key: String| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(b"630".to_vec())
            }
        });

        let mut handles = Vec::new();
        for _ in 0..50 {
            let group = group.clone();
            handles.push(tokio::spawn(async move { group.get("Tom").await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().to_string(), "630");
        }
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }

    // ============================================================
    // DIRECTORY TESTS
    // ============================================================

    #[tokio::test]
    async fn test_group_directory_lookup() {
        let (group, _) = scores_group("scores_directory");

        let found = get_group("scores_directory").expect("group should be registered");
        assert_eq!(found.name(), group.name());
        assert!(Arc::ptr_eq(&found, &group));

        assert!(get_group("no_such_group").is_none());
    }

    #[tokio::test]
    async fn test_reregistration_replaces_group() {
        let (first, _) = scores_group("scores_replaced");
        let (second, _) = scores_group("scores_replaced");

        let found = get_group("scores_replaced").unwrap();
        assert!(!Arc::ptr_eq(&found, &first));
        assert!(Arc::ptr_eq(&found, &second));
    }

    // ============================================================
    // PEER ROUTING TESTS
    // ============================================================

    struct FailingPeer;

    impl PeerClient for FailingPeer {
        fn fetch<'a>(
            &'a self,
            _group: &'a str,
            _key: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
            Box::pin(async { Err(anyhow::anyhow!("peer unreachable")) })
        }
    }

    struct FixedPeer(Vec<u8>);

    impl PeerClient for FixedPeer {
        fn fetch<'a>(
            &'a self,
            _group: &'a str,
            _key: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
            let value = self.0.clone();
            Box::pin(async move { Ok(value) })
        }
    }

    /// Picker that routes every key to one fixed client.
    struct StaticPicker(Arc<dyn PeerClient>);

    impl PeerPicker for StaticPicker {
        fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerClient>> {
            Some(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_failing_peer_falls_back_to_origin() {
        let (group, load_counts) = scores_group("scores_peer_fallback");
        group.register_peers(Arc::new(StaticPicker(Arc::new(FailingPeer))));

        let view = group.get("Tom").await.unwrap();
        assert_eq!(view.to_string(), "630");
        assert_eq!(load_counts.lock().unwrap()["Tom"], 1);
    }

    #[tokio::test]
    async fn test_peer_hit_is_returned_but_not_cached() {
        let (group, load_counts) = scores_group("scores_peer_hit");
        group.register_peers(Arc::new(StaticPicker(Arc::new(FixedPeer(b"589".to_vec())))));

        let view = group.get("Jack").await.unwrap();
        assert_eq!(view, ByteView::from("589"));

        // The origin was never consulted and nothing was cached locally.
        assert!(load_counts.lock().unwrap().is_empty());
        assert_eq!(group.cached_entries(), 0);
        assert_eq!(group.cached_bytes(), 0);
    }

    #[tokio::test]
    #[should_panic(expected = "register_peers called more than once")]
    async fn test_double_peer_registration_panics() {
        let (group, _) = scores_group("scores_double_peers");
        group.register_peers(Arc::new(StaticPicker(Arc::new(FailingPeer))));
        group.register_peers(Arc::new(StaticPicker(Arc::new(FailingPeer))));
    }
}
