//! Invalidação por chave parcial com notificação de listeners.

use serde::Serialize;

use crate::cache::keys::{CanonicalKey, PartialKey, StructuredKey};
use crate::cache::store::{Entry, FacetCache};

/// Resultado de uma operação de invalidação.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InvalidationResult {
    /// Número de entradas removidas.
    pub count: usize,

    /// Chaves removidas, em ordem canônica.
    pub keys: Vec<CanonicalKey>,

    /// Padrão aplicado (`*` para invalidação total).
    pub pattern: String,

    /// Notificações que falharam (erro ou panic do listener).
    pub failed_notifications: usize,
}

impl<V> FacetCache<V> {
    /// Invalida todas as entradas que casam com a chave parcial.
    ///
    /// Facetas não especificadas são curingas; as especificadas precisam
    /// ser todas iguais. O conjunto removido é decidido e retirado do store
    /// antes de qualquer listener rodar, então um listener pode chamar o
    /// próprio cache de volta.
    ///
    /// # Examples
    ///
    /// ```
    /// use facetcache::{FacetCache, PartialKey, StructuredKey};
    ///
    /// let cache: FacetCache<u32> = FacetCache::with_defaults();
    /// cache.set(&StructuredKey::new("A").category("x"), 1, None);
    /// cache.set(&StructuredKey::new("A").category("y"), 2, None);
    /// cache.set(&StructuredKey::new("B").category("x"), 3, None);
    ///
    /// let result = cache.invalidate(&PartialKey::for_subject("A"));
    /// assert_eq!(result.count, 2);
    /// assert!(cache.get(&StructuredKey::new("B").category("x")).is_some());
    /// ```
    pub fn invalidate(&self, partial: &PartialKey) -> InvalidationResult {
        let (removed, evicted) = {
            let mut entries = self.inner.entries.lock();
            let mut matched: Vec<CanonicalKey> = entries
                .keys()
                .filter(|key| partial.matches(key))
                .cloned()
                .collect();
            matched.sort();

            let evicted: Vec<Entry<V>> = matched
                .iter()
                .filter_map(|key| entries.remove(key))
                .collect();
            (matched, evicted)
        };
        // valores removidos são soltos fora do lock
        drop(evicted);

        self.notify_removed(partial.to_string(), removed)
    }

    /// Invalida todas as entradas de um subject, quaisquer que sejam as
    /// demais facetas.
    pub fn invalidate_subject(&self, subject_id: &str) -> InvalidationResult {
        self.invalidate(&PartialKey::for_subject(subject_id))
    }

    /// Invalida exatamente uma chave.
    pub fn invalidate_key(&self, key: &StructuredKey) -> InvalidationResult {
        self.invalidate(&key.to_partial())
    }

    /// Remove todas as entradas, notificando uma vez por chave removida.
    pub fn invalidate_all(&self) -> InvalidationResult {
        let drained: Vec<(CanonicalKey, Entry<V>)> = self.inner.entries.lock().drain().collect();
        let mut removed: Vec<CanonicalKey> = drained.into_iter().map(|(key, _)| key).collect();
        removed.sort();

        self.notify_removed("*".to_string(), removed)
    }

    fn notify_removed(&self, pattern: String, keys: Vec<CanonicalKey>) -> InvalidationResult {
        let report = self.inner.listeners.notify(&keys);

        tracing::info!(
            pattern = %pattern,
            count = keys.len(),
            delivered = report.delivered,
            failed = report.failed,
            "Cache entries invalidated"
        );

        InvalidationResult {
            count: keys.len(),
            keys,
            pattern,
            failed_notifications: report.failed,
        }
    }
}
