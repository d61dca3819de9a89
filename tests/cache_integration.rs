//! Testes de integração para o cache de dados derivados.

use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use facetcache::listeners::{CountingListener, LoggingListener};
use facetcache::{
    CacheError, CacheResult, CanonicalKey, FacetCache, InvalidationListener, PartialKey,
    StructuredKey,
};
use parking_lot::Mutex;

fn key(subject: &str, category: &str) -> StructuredKey {
    StructuredKey::new(subject).category(category)
}

fn seeded() -> FacetCache<u32> {
    let cache = FacetCache::with_defaults();
    cache.set(&key("A", "x"), 1, None);
    cache.set(&key("A", "y"), 2, None);
    cache.set(&key("B", "x"), 3, None);
    cache
}

// Propriedades do store
mod store_tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let cache: FacetCache<String> = FacetCache::with_defaults();
        let k = StructuredKey::new("s1").category("crawl").range("30d").metric("pace");

        cache.set(&k, "series".to_string(), Some(Duration::from_secs(1)));

        assert_eq!(cache.get(&k).as_deref().map(String::as_str), Some("series"));
    }

    #[test]
    fn test_concrete_expiry_scenario() {
        let cache: FacetCache<u32> = FacetCache::with_defaults();
        let k = StructuredKey::new("s1").category("crawl").metric("technique");

        cache.set(&k, 42, Some(Duration::from_millis(50)));
        assert_eq!(cache.get(&k).as_deref(), Some(&42));

        sleep(Duration::from_millis(60));

        assert!(cache.get(&k).is_none());
        cache.cleanup();
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_expired_entry_listed_until_read_or_cleanup() {
        let cache: FacetCache<u32> = FacetCache::with_defaults();
        let read = StructuredKey::new("read");
        let swept = StructuredKey::new("swept");

        cache.set(&read, 1, Some(Duration::from_millis(10)));
        cache.set(&swept, 2, Some(Duration::from_millis(10)));
        sleep(Duration::from_millis(20));

        assert_eq!(cache.stats().size, 2);

        assert!(cache.get(&read).is_none());
        assert_eq!(cache.stats().size, 1);

        cache.cleanup();
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_overwrite_semantics() {
        let cache: FacetCache<&'static str> = FacetCache::with_defaults();
        let k = StructuredKey::new("s1").metric("technique");

        cache.set(&k, "first", Some(Duration::from_secs(1)));
        let first = cache.stats().entries[0].clone();

        sleep(Duration::from_millis(5));
        cache.set(&k, "second", Some(Duration::from_secs(1)));

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert!(stats.entries[0].expires_at > first.expires_at);
        assert_eq!(cache.get(&k).as_deref(), Some(&"second"));
    }

    #[test]
    fn test_absent_facet_and_wildcard_share_entry() {
        let cache: FacetCache<u32> = FacetCache::with_defaults();

        cache.set(&StructuredKey::new("s1"), 1, None);
        cache.set(&StructuredKey::new("s1").category("all"), 2, None);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&StructuredKey::new("s1")).as_deref(), Some(&2));
    }
}

// Invalidação por chave parcial
mod invalidation_tests {
    use super::*;

    #[test]
    fn test_partial_match_invalidation() {
        let cache = seeded();

        cache.invalidate(&PartialKey::for_subject("A"));

        assert!(cache.get(&key("A", "x")).is_none());
        assert!(cache.get(&key("A", "y")).is_none());
        assert_eq!(cache.get(&key("B", "x")).as_deref(), Some(&3));
    }

    #[test]
    fn test_narrower_partial_match() {
        let cache = seeded();

        cache.invalidate(&PartialKey::for_subject("A").category("x"));

        assert!(cache.get(&key("A", "x")).is_none());
        assert_eq!(cache.get(&key("A", "y")).as_deref(), Some(&2));
        assert_eq!(cache.get(&key("B", "x")).as_deref(), Some(&3));
    }

    #[test]
    fn test_full_clear() {
        let cache = seeded();

        cache.invalidate_all();

        assert_eq!(cache.stats().size, 0);
        for k in [key("A", "x"), key("A", "y"), key("B", "x")] {
            assert!(cache.get(&k).is_none());
        }
    }

    #[test]
    fn test_entry_can_be_set_again_after_invalidation() {
        let cache = seeded();

        cache.invalidate_subject("A");
        cache.set(&key("A", "x"), 10, None);

        assert_eq!(cache.get(&key("A", "x")).as_deref(), Some(&10));
    }
}

// Notificação de listeners
mod listener_tests {
    use super::*;

    struct RejectingListener;

    impl InvalidationListener for RejectingListener {
        fn name(&self) -> &str {
            "rejecting"
        }

        fn on_invalidate(&self, key: &CanonicalKey) -> CacheResult<()> {
            Err(CacheError::listener(self.name(), format!("cannot refresh {key}")))
        }
    }

    #[test]
    fn test_notification_exactly_once_per_removed_key() {
        let cache = seeded();
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&seen);
        let _sub = cache.subscribe("recorder", move |k| sink.lock().push(k.to_string()));

        let result = cache.invalidate(&PartialKey::any().category("x"));

        assert_eq!(result.count, 2);
        assert_eq!(*seen.lock(), vec!["A|x|all|all", "B|x|all|all"]);
    }

    #[test]
    fn test_unsubscribe_effective_and_idempotent() {
        let cache = seeded();
        let removed = Arc::new(CountingListener::new());
        let kept = Arc::new(CountingListener::new());

        let sub = cache.add_invalidation_listener(Arc::clone(&removed));
        let _other = cache.add_invalidation_listener(Arc::clone(&kept));

        cache.invalidate_subject("B");
        assert_eq!(removed.total(), 1);

        sub.unsubscribe();
        sub.unsubscribe();

        cache.invalidate_subject("A");
        assert_eq!(removed.total(), 1);
        assert_eq!(kept.total(), 3);
        assert_eq!(cache.listener_count(), 1);
    }

    #[test]
    fn test_failing_listeners_do_not_stop_invalidation() {
        let cache = seeded();
        let counter = Arc::new(CountingListener::new());

        let _a = cache.add_invalidation_listener(RejectingListener);
        let _b = cache.subscribe("panicking", |_k| panic!("view crashed"));
        let _c = cache.add_invalidation_listener(Arc::clone(&counter));
        let _d = cache.add_invalidation_listener(LoggingListener::new());

        let result = cache.invalidate_all();

        assert_eq!(result.count, 3);
        assert_eq!(result.failed_notifications, 6);
        assert!(cache.is_empty());
        assert_eq!(counter.total(), 3);
    }
}
