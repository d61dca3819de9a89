//! Cache de dados derivados.
//!
//! Este módulo implementa um cache em memória para resultados caros de
//! calcular (por exemplo, séries de gráficos derivadas do histórico de
//! avaliações), indexados por chaves com várias facetas, com expiração por
//! TTL, invalidação por chave parcial e notificação de listeners.

mod invalidation;
mod keys;
mod stats;
mod store;
mod sweep;

pub use invalidation::InvalidationResult;
pub use keys::{CanonicalKey, Facet, PartialKey, StructuredKey, WILDCARD};
pub use stats::{CacheStats, EntrySnapshot};
pub use store::FacetCache;
pub use sweep::SweepHandle;
