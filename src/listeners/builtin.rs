//! Listeners padrão do facetcache.
//!
//! - `LoggingListener`: registra cada chave invalidada no log
//! - `CountingListener`: conta invalidações, no total e por subject

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::cache::CanonicalKey;
use crate::CacheResult;

use super::InvalidationListener;

// ═══════════════════════════════════════════════════════════════════════════
// LoggingListener
// ═══════════════════════════════════════════════════════════════════════════

/// Listener que registra invalidações no log (tracing, nível debug).
#[derive(Debug, Default)]
pub struct LoggingListener;

impl LoggingListener {
    /// Cria um novo LoggingListener.
    pub fn new() -> Self {
        Self
    }
}

impl InvalidationListener for LoggingListener {
    fn name(&self) -> &str {
        "logging"
    }

    fn on_invalidate(&self, key: &CanonicalKey) -> CacheResult<()> {
        tracing::debug!(
            key = %key,
            subject_id = key.subject_id(),
            "Cache entry invalidated"
        );
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CountingListener
// ═══════════════════════════════════════════════════════════════════════════

/// Listener que conta invalidações.
///
/// Útil para views que só precisam saber *se* algo do seu subject mudou.
#[derive(Debug, Default)]
pub struct CountingListener {
    /// Total de chaves invalidadas.
    total: AtomicU64,

    /// Chaves invalidadas por subject.
    by_subject: Mutex<HashMap<String, u64>>,
}

impl CountingListener {
    /// Cria um novo CountingListener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retorna o total de invalidações recebidas.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Retorna quantas chaves de um subject foram invalidadas.
    pub fn for_subject(&self, subject_id: &str) -> u64 {
        self.by_subject.lock().get(subject_id).copied().unwrap_or(0)
    }

    /// Zera os contadores.
    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.by_subject.lock().clear();
    }
}

impl InvalidationListener for CountingListener {
    fn name(&self) -> &str {
        "counting"
    }

    fn on_invalidate(&self, key: &CanonicalKey) -> CacheResult<()> {
        self.total.fetch_add(1, Ordering::Relaxed);
        *self
            .by_subject
            .lock()
            .entry(key.subject_id().to_string())
            .or_insert(0) += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::StructuredKey;

    #[test]
    fn test_logging_listener_never_fails() {
        let listener = LoggingListener::new();
        let key = StructuredKey::new("s1").canonical();

        assert_eq!(listener.name(), "logging");
        assert!(listener.on_invalidate(&key).is_ok());
    }

    #[test]
    fn test_counting_listener_tracks_subjects() {
        let listener = CountingListener::new();

        listener
            .on_invalidate(&StructuredKey::new("A").category("x").canonical())
            .unwrap();
        listener
            .on_invalidate(&StructuredKey::new("A").category("y").canonical())
            .unwrap();
        listener
            .on_invalidate(&StructuredKey::new("B").canonical())
            .unwrap();

        assert_eq!(listener.total(), 3);
        assert_eq!(listener.for_subject("A"), 2);
        assert_eq!(listener.for_subject("B"), 1);
        assert_eq!(listener.for_subject("C"), 0);

        listener.reset();
        assert_eq!(listener.total(), 0);
        assert_eq!(listener.for_subject("A"), 0);
    }
}
