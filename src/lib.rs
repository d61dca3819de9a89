//! # facetcache
//!
//! Cache em memória para dados derivados caros de calcular.
//!
//! Produtores chamam `set` depois de calcular um resultado; consumidores
//! chamam `get` antes de recalcular; quem altera os dados de origem chama
//! `invalidate` com uma chave parcial larga o suficiente para cobrir toda
//! derivação afetada. Um sweep periódico remove entradas expiradas.
//!
//! ## Módulos
//!
//! - [`cache`] - Store de chave composta, invalidação, estatísticas e sweep
//! - [`listeners`] - Listeners de invalidação e implementações padrão
//! - [`logging`] - Inicialização do tracing-subscriber
//! - [`types`] - Configuração e erros

pub mod cache;
pub mod listeners;
pub mod logging;
pub mod types;

pub use cache::{
    CacheStats, CanonicalKey, FacetCache, InvalidationResult, PartialKey, StructuredKey,
    SweepHandle,
};
pub use listeners::{InvalidationListener, Subscription};
pub use types::config::{CacheConfig, Config};
pub use types::errors::{CacheError, CacheResult};
