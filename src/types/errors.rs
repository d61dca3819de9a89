//! Tipos de erro do facetcache.

use thiserror::Error;

/// Tipo de resultado padrão do facetcache.
pub type CacheResult<T> = Result<T, CacheError>;

/// Erros possíveis no facetcache.
///
/// Operações do cache em si nunca falham (miss e expiração não são erros);
/// estes erros aparecem na carga de configuração, na inicialização do
/// logging e na fronteira dos listeners de invalidação.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro ao parsear TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Erro ao serializar TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Listener '{listener}' falhou: {message}")]
    Listener { listener: String, message: String },

    #[error("Erro ao inicializar logging: {0}")]
    Logging(String),

    #[error("{0}")]
    Other(String),
}

impl CacheError {
    /// Cria um erro genérico.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Cria um erro de configuração.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Cria um erro de listener.
    pub fn listener<L: Into<String>, M: Into<String>>(listener: L, message: M) -> Self {
        Self::Listener {
            listener: listener.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_error_display() {
        let err = CacheError::listener("chart-view", "render state lost");
        assert_eq!(
            err.to_string(),
            "Listener 'chart-view' falhou: render state lost"
        );
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse: Result<toml::Value, _> = toml::from_str("[cache\nbroken");
        let err: CacheError = parse.unwrap_err().into();
        assert!(matches!(err, CacheError::TomlParse(_)));
    }
}
