// ============================================================================
// Refresh Scheduler
// ============================================================================
// Timer récurrent qui poste un Tick toutes les `refreshInterval` secondes.
//
// États :
//   Idle  : aucun timer
//   Armed : une tâche tokio dort `interval` puis poste un Tick, en boucle
//
// Chaque (ré)armement incrémente une génération. Un Tick porte la génération
// qui l'a émis : un Tick déjà en file au moment d'un teardown ou d'un
// réarmement est reconnu comme périmé et ignoré par l'appelant.
//
// Le scheduler ne fait aucun appel réseau lui-même : la boucle principale
// reçoit les Ticks et décide (voir refresh::RefreshGate).
// ============================================================================

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Intervalle minimum accepté par le timer
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Signal émis par le timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// État observable du scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Armed { interval: Duration },
}

pub struct RefreshScheduler {
    runtime: Handle,
    tick_tx: UnboundedSender<Tick>,
    task: Option<JoinHandle<()>>,
    generation: u64,
    interval: Option<Duration>,
}

impl RefreshScheduler {
    /// Crée un scheduler Idle et le récepteur de ses Ticks.
    ///
    /// `runtime` : handle du runtime tokio sur lequel tourne le timer
    pub fn new(runtime: Handle) -> (Self, UnboundedReceiver<Tick>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            runtime,
            tick_tx,
            task: None,
            generation: 0,
            interval: None,
        };
        (scheduler, tick_rx)
    }

    pub fn state(&self) -> SchedulerState {
        match self.interval {
            Some(interval) if self.task.is_some() => SchedulerState::Armed { interval },
            _ => SchedulerState::Idle,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state(), SchedulerState::Armed { .. })
    }

    /// Arme le timer (ou le réarme) avec `interval`.
    ///
    /// Le timer courant est détruit : pas de reliquat d'intervalle, le
    /// prochain Tick arrive `interval` après cet appel.
    pub fn arm(&mut self, interval: Duration) {
        self.teardown();

        let interval = interval.max(MIN_INTERVAL);
        self.generation += 1;
        let generation = self.generation;
        let tick_tx = self.tick_tx.clone();

        self.task = Some(self.runtime.spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if tick_tx.send(Tick { generation }).is_err() {
                    // Récepteur fermé : l'application s'arrête
                    break;
                }
            }
        }));
        self.interval = Some(interval);

        info!(interval_secs = interval.as_secs(), generation, "Refresh timer armed");
    }

    /// Idle → Armed seulement ; ne touche pas un timer déjà armé
    pub fn ensure_armed(&mut self, interval: Duration) {
        if !self.is_armed() {
            self.arm(interval);
        }
    }

    /// Détruit le timer. Aucun Tick de l'ancienne génération n'est accepté
    /// ensuite. Un fetch déjà en vol n'est pas interrompu.
    pub fn teardown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(generation = self.generation, "Refresh timer torn down");
        }
        self.interval = None;
        // Invalide aussi les Ticks déjà en file
        self.generation += 1;
    }

    /// Vrai si `tick` vient du timer actuellement armé
    pub fn accepts(&self, tick: &Tick) -> bool {
        self.is_armed() && tick.generation == self.generation
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
