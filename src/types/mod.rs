//! Tipos compartilhados do facetcache.

pub mod config;
pub mod errors;

pub use config::{CacheConfig, Config, LoggingConfig};
pub use errors::{CacheError, CacheResult};
