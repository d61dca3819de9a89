//! Sweep periódico de entradas expiradas.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::store::{FacetCache, Inner};

/// Handle para controlar um sweep em execução.
///
/// Soltar o handle também para o sweep.
#[must_use = "dropping the handle stops the sweep"]
#[derive(Debug)]
pub struct SweepHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl SweepHandle {
    /// Sinaliza o sweep para parar.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<V> FacetCache<V>
where
    V: Send + Sync + 'static,
{
    /// Inicia o sweep periódico com o intervalo da configuração.
    ///
    /// Retorna `None` quando `sweep_enabled` é `false` ou quando não há
    /// runtime Tokio ativo.
    pub fn start_sweeper(&self) -> Option<SweepHandle> {
        if !self.inner.config.sweep_enabled {
            debug!("Cache sweep disabled by configuration");
            return None;
        }
        self.start_sweeper_every(self.inner.config.sweep_interval())
    }

    /// Inicia o sweep periódico com um intervalo explícito.
    ///
    /// A task guarda só uma referência fraca ao cache e termina sozinha
    /// quando o último clone do cache é solto. Fora de um runtime Tokio
    /// nada é iniciado e o retorno é `None`; `cleanup()` continua
    /// disponível para chamadas manuais.
    pub fn start_sweeper_every(&self, period: Duration) -> Option<SweepHandle> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "No Tokio runtime, cache sweep not started");
                return None;
            }
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        runtime.spawn(run(Arc::downgrade(&self.inner), period, shutdown_rx));

        Some(SweepHandle { shutdown_tx })
    }
}

async fn run<V>(cache: Weak<Inner<V>>, period: Duration, mut shutdown_rx: watch::Receiver<bool>)
where
    V: Send + Sync + 'static,
{
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Starting cache sweep with interval {:?}", period);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                let Some(inner) = cache.upgrade() else {
                    debug!("Cache dropped, sweep exiting");
                    break;
                };
                FacetCache { inner }.cleanup();
            }
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    info!("Cache sweep shutting down");
                    break;
                }
            }
        }
    }
}
