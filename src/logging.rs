//! Inicialização do logging (tracing-subscriber).

use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::types::config::LoggingConfig;
use crate::{CacheError, CacheResult};

/// Instala o subscriber global de acordo com a configuração.
///
/// `RUST_LOG` continua valendo; a diretiva `facetcache=<level>` é somada a
/// ela. Uma segunda chamada retorna `CacheError::Logging` em vez de panic.
pub fn init(config: &LoggingConfig) -> CacheResult<()> {
    config.validate()?;

    let directive = format!("facetcache={}", config.level)
        .parse::<Directive>()
        .map_err(|e| CacheError::Logging(format!("invalid directive: {e}")))?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    let result = if config.format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .try_init()
    };

    result.map_err(|e| CacheError::Logging(e.to_string()))
}
