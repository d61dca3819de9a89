//! Testes de integração para o sweep periódico e a configuração.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use facetcache::listeners::CountingListener;
use facetcache::{CacheConfig, CacheError, Config, FacetCache, StructuredKey};

mod sweep_tests {
    use super::*;

    #[tokio::test]
    async fn test_configured_sweeper_evicts_silently() {
        let config = CacheConfig {
            default_ttl_ms: 10,
            sweep_interval_ms: 20,
            sweep_enabled: true,
        };
        let cache: FacetCache<Vec<f64>> = FacetCache::new(config);
        let listener = Arc::new(CountingListener::new());
        let _sub = cache.add_invalidation_listener(Arc::clone(&listener));

        cache.set(&StructuredKey::new("s1").metric("pace"), vec![1.0, 1.5], None);
        cache.set(&StructuredKey::new("s2").metric("pace"), vec![2.0], None);

        let handle = cache.start_sweeper().expect("sweep enabled");
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.is_empty());
        assert_eq!(listener.total(), 0);
        handle.stop();
    }

    #[tokio::test]
    async fn test_sweeper_exits_when_cache_dropped() {
        let cache: FacetCache<u32> = FacetCache::with_defaults();
        let handle = cache
            .start_sweeper_every(Duration::from_millis(5))
            .expect("runtime available");

        drop(cache);
        tokio::time::sleep(Duration::from_millis(30)).await;

        // parar um sweep já encerrado não falha
        handle.stop();
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("facetcache.toml");

        let mut config = Config::default_config();
        config.cache.default_ttl_ms = 1_000;
        config.logging.format = "json".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.cache.default_ttl(), Duration::from_secs(1));
        assert_eq!(loaded.cache.sweep_interval(), Duration::from_secs(60));
        assert_eq!(loaded.logging.format, "json");
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("facetcache.toml");
        std::fs::write(&path, "[cache]\nsweep_interval_ms = 0\n").unwrap();

        assert!(matches!(Config::load(&path), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("missing.toml");

        assert!(matches!(Config::load(&path), Err(CacheError::Io(_))));
    }

    #[test]
    fn test_cache_built_from_loaded_config() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("facetcache.toml");
        std::fs::write(&path, "[cache]\ndefault_ttl_ms = 5\n").unwrap();

        let config = Config::load(&path).unwrap();
        let cache: FacetCache<u32> = FacetCache::new(config.cache);
        let key = StructuredKey::new("s1");

        cache.set(&key, 1, None);
        std::thread::sleep(Duration::from_millis(15));
        assert!(cache.get(&key).is_none());
    }
}
