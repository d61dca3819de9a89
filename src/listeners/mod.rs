//! Listeners de invalidação.
//!
//! Listeners são notificados, uma vez por chave canônica removida, sempre
//! que `invalidate`/`invalidate_all` removem entradas do cache. Expiração
//! lazy e o sweep periódico são silenciosos.
//!
//! Falhas de um listener (erro retornado ou panic) ficam isoladas: são
//! registradas no log e a entrega continua para os demais.

mod builtin;

pub use builtin::{CountingListener, LoggingListener};

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::cache::CanonicalKey;
use crate::CacheResult;

// ═══════════════════════════════════════════════════════════════════════════
// Trait InvalidationListener
// ═══════════════════════════════════════════════════════════════════════════

/// Trait para observadores de invalidação.
pub trait InvalidationListener: Send + Sync {
    /// Nome do listener, usado nos logs de falha.
    fn name(&self) -> &str;

    /// Chamado uma vez para cada chave removida por invalidação.
    fn on_invalidate(&self, key: &CanonicalKey) -> CacheResult<()>;
}

impl<L: InvalidationListener + ?Sized> InvalidationListener for Arc<L> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_invalidate(&self, key: &CanonicalKey) -> CacheResult<()> {
        (**self).on_invalidate(key)
    }
}

/// Adapta uma closure em listener.
pub struct FnListener<F> {
    name: String,
    callback: F,
}

impl<F> FnListener<F>
where
    F: Fn(&CanonicalKey) + Send + Sync,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> InvalidationListener for FnListener<F>
where
    F: Fn(&CanonicalKey) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_invalidate(&self, key: &CanonicalKey) -> CacheResult<()> {
        (self.callback)(key);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Registro
// ═══════════════════════════════════════════════════════════════════════════

/// Identificador único de um registro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Registration {
    id: ListenerId,
    listener: Arc<dyn InvalidationListener>,
}

/// Resultado da entrega de notificações.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Chamadas concluídas sem falha.
    pub delivered: usize,

    /// Chamadas que retornaram erro ou entraram em panic.
    pub failed: usize,
}

/// Registro de listeners de invalidação.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<Registration>>,
}

impl ListenerRegistry {
    /// Cria um registro vazio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra um listener e retorna a inscrição que o remove.
    pub fn register(self: &Arc<Self>, listener: Arc<dyn InvalidationListener>) -> Subscription {
        let id = ListenerId::new();
        tracing::debug!(
            listener_id = %id,
            listener_name = listener.name(),
            "Registering invalidation listener"
        );

        self.listeners.lock().push(Registration { id, listener });

        Subscription {
            id,
            registry: Arc::downgrade(self),
            active: AtomicBool::new(true),
        }
    }

    fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        let removed = listeners.len() != before;

        if removed {
            tracing::debug!(listener_id = %id, "Invalidation listener removed");
        }
        removed
    }

    /// Número de listeners registrados.
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notifica todos os listeners, uma vez por chave.
    ///
    /// A lista de listeners é copiada antes de qualquer chamada, então um
    /// listener pode registrar, remover ou mexer no cache sem deadlock.
    pub fn notify(&self, keys: &[CanonicalKey]) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        if keys.is_empty() {
            return report;
        }

        let snapshot: Vec<Arc<dyn InvalidationListener>> = self
            .listeners
            .lock()
            .iter()
            .map(|r| Arc::clone(&r.listener))
            .collect();

        for key in keys {
            for listener in &snapshot {
                if deliver(listener.as_ref(), key) {
                    report.delivered += 1;
                } else {
                    report.failed += 1;
                }
            }
        }

        report
    }
}

fn deliver(listener: &dyn InvalidationListener, key: &CanonicalKey) -> bool {
    match catch_unwind(AssertUnwindSafe(|| listener.on_invalidate(key))) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(
                listener_name = listener.name(),
                key = %key,
                error = %e,
                "Invalidation listener failed"
            );
            false
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(
                listener_name = listener.name(),
                key = %key,
                panic = %message,
                "Invalidation listener panicked"
            );
            false
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Subscription
// ═══════════════════════════════════════════════════════════════════════════

/// Capacidade de remover exatamente um registro.
///
/// `unsubscribe` é idempotente. Soltar a `Subscription` sem chamar
/// `unsubscribe` mantém o listener registrado.
#[derive(Debug)]
pub struct Subscription {
    id: ListenerId,
    registry: Weak<ListenerRegistry>,
    active: AtomicBool,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove o registro. Chamadas repetidas não fazem nada.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }

    /// `true` até a primeira chamada de `unsubscribe`.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
