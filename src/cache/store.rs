//! Store de chave composta com expiração por TTL.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::cache::keys::{CanonicalKey, StructuredKey};
use crate::listeners::{FnListener, InvalidationListener, ListenerRegistry, Subscription};
use crate::types::config::CacheConfig;

/// Entrada armazenada.
#[derive(Debug)]
pub(crate) struct Entry<V> {
    pub(crate) value: Arc<V>,
    pub(crate) stored_at: DateTime<Utc>,
    pub(crate) expires_at: DateTime<Utc>,
}

impl<V> Entry<V> {
    fn new(value: Arc<V>, ttl: Duration) -> Self {
        let stored_at = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| stored_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            value,
            stored_at,
            expires_at,
        }
    }

    /// Expirada a partir do instante `expires_at` (inclusive), então TTL
    /// zero nunca sobrevive à próxima leitura.
    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub(crate) struct Inner<V> {
    pub(crate) entries: Mutex<HashMap<CanonicalKey, Entry<V>>>,
    pub(crate) listeners: Arc<ListenerRegistry>,
    pub(crate) config: CacheConfig,
    pub(crate) hits: AtomicU64,
    pub(crate) misses: AtomicU64,
}

/// Cache de dados derivados.
///
/// Clonar um `FacetCache` compartilha o mesmo estado; o sweep periódico e
/// as views que consomem o cache trabalham sobre clones.
///
/// Nenhuma operação pública falha: miss e expiração não são erros, e
/// falhas de listeners ficam isoladas na entrega das notificações.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use facetcache::{FacetCache, StructuredKey};
///
/// let cache: FacetCache<u32> = FacetCache::with_defaults();
/// let key = StructuredKey::new("s1").category("crawl").metric("technique");
///
/// cache.set(&key, 42, Some(Duration::from_secs(5)));
/// assert_eq!(cache.get(&key).as_deref(), Some(&42));
/// ```
pub struct FacetCache<V> {
    pub(crate) inner: Arc<Inner<V>>,
}

impl<V> Clone for FacetCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> FacetCache<V> {
    /// Cria um novo cache com a configuração dada.
    pub fn new(config: CacheConfig) -> Self {
        tracing::debug!(
            default_ttl_ms = config.default_ttl_ms,
            sweep_interval_ms = config.sweep_interval_ms,
            "Creating derived-data cache"
        );

        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                listeners: Arc::new(ListenerRegistry::new()),
                config,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }

    /// Cria um cache com configuração padrão (TTL de 5 minutos).
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Configuração em uso.
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Busca no cache.
    ///
    /// Retorna `None` se não encontrado ou se expirado; uma entrada expirada
    /// é removida como efeito colateral da leitura, sem notificar listeners.
    pub fn get(&self, key: &StructuredKey) -> Option<Arc<V>> {
        let canonical = key.canonical();
        let now = Utc::now();

        // entrada expirada é solta só depois do lock
        let (result, _stale) = {
            let mut entries = self.inner.entries.lock();
            match entries.get(&canonical) {
                Some(entry) if entry.is_expired_at(now) => {
                    tracing::debug!(key = %canonical, "Expired entry evicted on read");
                    (None, entries.remove(&canonical))
                }
                Some(entry) => (Some(Arc::clone(&entry.value)), None),
                None => (None, None),
            }
        };

        if result.is_some() {
            self.inner.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.misses.fetch_add(1, Ordering::Relaxed);
        }

        result
    }

    /// Igual a `get(key).is_some()`, sem contar hit/miss.
    pub fn contains(&self, key: &StructuredKey) -> bool {
        let canonical = key.canonical();
        let now = Utc::now();

        let (live, _stale) = {
            let mut entries = self.inner.entries.lock();
            match entries.get(&canonical) {
                Some(entry) if entry.is_expired_at(now) => (false, entries.remove(&canonical)),
                Some(_) => (true, None),
                None => (false, None),
            }
        };
        live
    }

    /// Insere no cache, sobrescrevendo qualquer entrada com a mesma chave.
    ///
    /// `ttl = None` usa o TTL padrão da configuração. TTL zero é aceito e
    /// deixa a entrada expirada já na próxima leitura.
    pub fn set(&self, key: &StructuredKey, value: V, ttl: Option<Duration>) {
        self.set_arc(key, Arc::new(value), ttl);
    }

    /// Igual a [`set`](Self::set) para um valor já compartilhado.
    pub fn set_arc(&self, key: &StructuredKey, value: Arc<V>, ttl: Option<Duration>) {
        let canonical = key.canonical();
        let ttl = ttl.unwrap_or_else(|| self.inner.config.default_ttl());
        let entry = Entry::new(value, ttl);

        tracing::debug!(
            key = %canonical,
            ttl_ms = ttl.as_millis() as u64,
            "Cache entry stored"
        );

        // valor anterior é solto fora do lock
        let _previous = self.inner.entries.lock().insert(canonical, entry);
    }

    /// Retorna o valor em cache ou calcula, armazena e retorna um novo.
    ///
    /// O produtor roda sem nenhum lock do cache, então pode ler ou escrever
    /// outras chaves.
    pub fn get_or_insert_with<F>(
        &self,
        key: &StructuredKey,
        ttl: Option<Duration>,
        producer: F,
    ) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(cached) = self.get(key) {
            return cached;
        }

        let value = Arc::new(producer());
        self.set_arc(key, Arc::clone(&value), ttl);
        value
    }

    /// Versão falível de [`get_or_insert_with`](Self::get_or_insert_with):
    /// um erro do produtor é devolvido e nada é armazenado.
    pub fn try_get_or_insert_with<F, E>(
        &self,
        key: &StructuredKey,
        ttl: Option<Duration>,
        producer: F,
    ) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(cached) = self.get(key) {
            return Ok(cached);
        }

        let value = Arc::new(producer()?);
        self.set_arc(key, Arc::clone(&value), ttl);
        Ok(value)
    }

    /// Remove entradas expiradas, lidas ou não.
    ///
    /// Idempotente e silencioso: não notifica listeners. Retorna quantas
    /// entradas foram removidas.
    pub fn cleanup(&self) -> usize {
        let now = Utc::now();

        let evicted: Vec<Entry<V>> = {
            let mut entries = self.inner.entries.lock();
            let expired: Vec<CanonicalKey> = entries
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect();
            expired
                .iter()
                .filter_map(|key| entries.remove(key))
                .collect()
        };
        let removed = evicted.len();
        drop(evicted);

        if removed > 0 {
            tracing::debug!(removed, "Expired entries swept");
        }
        removed
    }

    /// Número de entradas armazenadas, incluindo expiradas ainda não varridas.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registra um listener de invalidação.
    pub fn add_invalidation_listener<L>(&self, listener: L) -> Subscription
    where
        L: InvalidationListener + 'static,
    {
        self.inner.listeners.register(Arc::new(listener))
    }

    /// Registra uma closure como listener de invalidação.
    ///
    /// ```
    /// use facetcache::{FacetCache, PartialKey, StructuredKey};
    ///
    /// let cache: FacetCache<Vec<f64>> = FacetCache::with_defaults();
    /// let subscription = cache.subscribe("chart", |key| println!("stale: {key}"));
    ///
    /// cache.set(&StructuredKey::new("s1"), vec![1.0, 2.0], None);
    /// cache.invalidate(&PartialKey::for_subject("s1"));
    ///
    /// subscription.unsubscribe();
    /// ```
    pub fn subscribe<F>(&self, name: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&CanonicalKey) + Send + Sync + 'static,
    {
        self.add_invalidation_listener(FnListener::new(name, callback))
    }

    /// Número de listeners registrados.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl<V> fmt::Debug for FacetCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacetCache")
            .field("entries", &self.len())
            .field("listeners", &self.listener_count())
            .field("config", &self.inner.config)
            .finish()
    }
}
