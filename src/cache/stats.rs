//! Estatísticas do cache (diagnóstico).

use std::sync::atomic::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::keys::CanonicalKey;
use crate::cache::store::FacetCache;
use crate::CacheResult;

/// Uma entrada vista pelo snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySnapshot {
    pub key: CanonicalKey,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl EntrySnapshot {
    /// Se a entrada já estaria expirada no instante dado.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Estatísticas do cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Número atual de entradas (incluindo expiradas ainda não varridas).
    pub size: usize,

    /// Entradas, em ordem canônica.
    pub entries: Vec<EntrySnapshot>,

    /// Número de acertos (cache hits).
    pub hits: u64,

    /// Número de erros (cache misses).
    pub misses: u64,
}

impl CacheStats {
    /// Calcula a taxa de acerto.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Serializa o snapshot em JSON (para dumps de diagnóstico).
    pub fn to_json(&self) -> CacheResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<V> FacetCache<V> {
    /// Retorna estatísticas do cache.
    ///
    /// Leitura pura: não remove entradas expiradas.
    pub fn stats(&self) -> CacheStats {
        let mut entries: Vec<EntrySnapshot> = self
            .inner
            .entries
            .lock()
            .iter()
            .map(|(key, entry)| EntrySnapshot {
                key: key.clone(),
                stored_at: entry.stored_at,
                expires_at: entry.expires_at,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats {
            size: entries.len(),
            entries,
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
        }
    }
}
