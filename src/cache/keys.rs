//! Chaves estruturadas, canônicas e parciais.
//!
//! Uma chave estruturada tem quatro facetas em ordem fixa: `subject_id`
//! (obrigatória), `category`, `range` e `metric`. Facetas ausentes viram o
//! sentinela [`WILDCARD`] na forma canônica.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CacheError, CacheResult};

/// Sentinela usado no lugar de uma faceta ausente.
pub const WILDCARD: &str = "all";

const DELIMITER: char = '|';
const ESCAPE: char = '\\';

/// Uma dimensão nomeada da chave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Subject,
    Category,
    Range,
    Metric,
}

impl Facet {
    /// Todas as facetas, na ordem canônica.
    pub const ALL: [Facet; 4] = [Facet::Subject, Facet::Category, Facet::Range, Facet::Metric];

    fn index(self) -> usize {
        match self {
            Facet::Subject => 0,
            Facet::Category => 1,
            Facet::Range => 2,
            Facet::Metric => 3,
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facet::Subject => write!(f, "subject_id"),
            Facet::Category => write!(f, "category"),
            Facet::Range => write!(f, "range"),
            Facet::Metric => write!(f, "metric"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// StructuredKey
// ═══════════════════════════════════════════════════════════════════════════

/// Chave usada por produtores e consumidores.
///
/// Duas chaves são iguais se e somente se suas formas canônicas são iguais,
/// então `category: None` e `category: Some("all")` são a mesma chave.
///
/// ```
/// use facetcache::StructuredKey;
///
/// let key = StructuredKey::new("s1").category("crawl").metric("technique");
/// assert_eq!(key.canonical().to_string(), "s1|crawl|all|technique");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredKey {
    subject_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metric: Option<String>,
}

impl StructuredKey {
    /// Cria uma chave apenas com o subject; demais facetas ficam ausentes.
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            category: None,
            range: None,
            metric: None,
        }
    }

    /// Define a sub-categoria.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Define a janela de tempo.
    pub fn range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    /// Define a métrica.
    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Forma canônica: facetas ausentes substituídas pelo sentinela.
    pub fn canonical(&self) -> CanonicalKey {
        fn or_wildcard(facet: &Option<String>) -> String {
            facet.clone().unwrap_or_else(|| WILDCARD.to_string())
        }

        CanonicalKey {
            facets: [
                self.subject_id.clone(),
                or_wildcard(&self.category),
                or_wildcard(&self.range),
                or_wildcard(&self.metric),
            ],
        }
    }

    /// Chave parcial que casa exatamente esta chave.
    pub fn to_partial(&self) -> PartialKey {
        let canonical = self.canonical();
        let mut partial = PartialKey::any();
        for facet in Facet::ALL {
            partial = partial.with(facet, canonical.facet(facet));
        }
        partial
    }
}

impl PartialEq for StructuredKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for StructuredKey {}

impl Hash for StructuredKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl From<&StructuredKey> for CanonicalKey {
    fn from(key: &StructuredKey) -> Self {
        key.canonical()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CanonicalKey
// ═══════════════════════════════════════════════════════════════════════════

/// Chave interna de lookup.
///
/// Guarda as quatro facetas separadamente, então valores contendo o
/// delimitador não colidem. A forma `Display` escapa `\` e `|` e é
/// invertida exatamente por [`FromStr`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey {
    facets: [String; 4],
}

impl CanonicalKey {
    /// Valor de uma faceta (o sentinela quando estava ausente).
    pub fn facet(&self, facet: Facet) -> &str {
        &self.facets[facet.index()]
    }

    pub fn subject_id(&self) -> &str {
        self.facet(Facet::Subject)
    }

    pub fn category(&self) -> &str {
        self.facet(Facet::Category)
    }

    pub fn range(&self) -> &str {
        self.facet(Facet::Range)
    }

    pub fn metric(&self) -> &str {
        self.facet(Facet::Metric)
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.facets.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", DELIMITER)?;
            }
            for c in value.chars() {
                if c == DELIMITER || c == ESCAPE {
                    write!(f, "{}", ESCAPE)?;
                }
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

impl FromStr for CanonicalKey {
    type Err = CacheError;

    fn from_str(s: &str) -> CacheResult<Self> {
        let mut parts: Vec<String> = Vec::with_capacity(4);
        let mut current = String::new();
        let mut chars = s.chars();

        while let Some(c) = chars.next() {
            match c {
                ESCAPE => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => {
                        return Err(CacheError::other(format!(
                            "chave canônica termina com escape pendente: {s}"
                        )))
                    }
                },
                DELIMITER => parts.push(std::mem::take(&mut current)),
                other => current.push(other),
            }
        }
        parts.push(current);

        let facets: [String; 4] = parts.try_into().map_err(|parts: Vec<String>| {
            CacheError::other(format!(
                "chave canônica precisa de 4 facetas, encontradas {}: {s}",
                parts.len()
            ))
        })?;

        Ok(Self { facets })
    }
}

impl Serialize for CanonicalKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PartialKey
// ═══════════════════════════════════════════════════════════════════════════

/// Chave com zero ou mais facetas, usada para invalidar em lote.
///
/// Facetas não especificadas são curingas; uma entrada casa quando todas
/// as facetas especificadas são iguais (comparação exata de string).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialKey {
    facets: [Option<String>; 4],
}

impl PartialKey {
    /// Chave parcial vazia: casa com tudo.
    pub fn any() -> Self {
        Self::default()
    }

    /// Atalho para `PartialKey::any().subject(id)`.
    pub fn for_subject(subject_id: impl Into<String>) -> Self {
        Self::any().subject(subject_id)
    }

    pub fn subject(self, subject_id: impl Into<String>) -> Self {
        self.with(Facet::Subject, subject_id)
    }

    pub fn category(self, category: impl Into<String>) -> Self {
        self.with(Facet::Category, category)
    }

    pub fn range(self, range: impl Into<String>) -> Self {
        self.with(Facet::Range, range)
    }

    pub fn metric(self, metric: impl Into<String>) -> Self {
        self.with(Facet::Metric, metric)
    }

    /// Especifica uma faceta qualquer.
    pub fn with(mut self, facet: Facet, value: impl Into<String>) -> Self {
        self.facets[facet.index()] = Some(value.into());
        self
    }

    /// Facetas especificadas, na ordem canônica.
    pub fn specified(&self) -> impl Iterator<Item = (Facet, &str)> + '_ {
        Facet::ALL
            .into_iter()
            .filter_map(move |facet| self.facets[facet.index()].as_deref().map(|v| (facet, v)))
    }

    /// `true` se nenhuma faceta foi especificada.
    pub fn is_empty(&self) -> bool {
        self.facets.iter().all(Option::is_none)
    }

    /// Casa quando TODAS as facetas especificadas são iguais (AND).
    pub fn matches(&self, key: &CanonicalKey) -> bool {
        self.specified().all(|(facet, value)| key.facet(facet) == value)
    }
}

impl fmt::Display for PartialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "*");
        }
        let parts: Vec<String> = self
            .specified()
            .map(|(facet, value)| format!("{facet}={value}"))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

impl From<&StructuredKey> for PartialKey {
    fn from(key: &StructuredKey) -> Self {
        key.to_partial()
    }
}
