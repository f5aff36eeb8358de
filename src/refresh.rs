// ============================================================================
// Politique de rafraîchissement
// ============================================================================
// Décide si un déclencheur (ouverture du panneau, tick du timer, refresh
// manuel) lance vraiment un cycle de fetch.
//
// Règles :
// - un seul cycle à la fois : tout déclencheur pendant un cycle est ignoré
// - Display est soumis à la garde de fraîcheur (5 minutes depuis le dernier
//   fetch réussi)
// - Tick et Manual passent outre la garde
// - sans clé API ou sans symbole, rien n'est demandé au réseau
// ============================================================================

use chrono::{DateTime, Utc};

/// Âge minimum (secondes) des dernières données avant un fetch sur Display
pub const STALENESS_THRESHOLD_SECS: i64 = 5 * 60;

/// Origine d'une demande de rafraîchissement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Panneau ouvert ou settings modifiés
    Display,

    /// Tick du timer
    Tick,

    /// Commande "Refresh" de l'utilisateur
    Manual,
}

impl RefreshTrigger {
    fn bypasses_staleness_guard(self) -> bool {
        !matches!(self, RefreshTrigger::Display)
    }
}

/// Résultat de la décision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    Fetch,
    SkipInProgress,
    SkipFresh,
    SkipNotConfigured,
}

/// État du cycle de fetch : en cours ou non, dernier succès
#[derive(Debug, Clone, Default)]
pub struct RefreshGate {
    last_fetch: Option<DateTime<Utc>>,
    in_progress: bool,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Instant du dernier cycle réussi
    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    /// Décide sans modifier l'état
    pub fn decide(&self, trigger: RefreshTrigger, now: DateTime<Utc>, configured: bool) -> RefreshDecision {
        if self.in_progress {
            return RefreshDecision::SkipInProgress;
        }
        if !configured {
            return RefreshDecision::SkipNotConfigured;
        }
        if !trigger.bypasses_staleness_guard() {
            if let Some(last) = self.last_fetch {
                if (now - last).num_seconds() < STALENESS_THRESHOLD_SECS {
                    return RefreshDecision::SkipFresh;
                }
            }
        }
        RefreshDecision::Fetch
    }

    /// Décide et, si un fetch est accordé, marque le cycle comme en cours
    pub fn try_begin(&mut self, trigger: RefreshTrigger, now: DateTime<Utc>, configured: bool) -> RefreshDecision {
        let decision = self.decide(trigger, now, configured);
        if decision == RefreshDecision::Fetch {
            self.in_progress = true;
        }
        decision
    }

    /// Termine le cycle ; seul un succès repousse la garde de fraîcheur
    pub fn finish(&mut self, success: bool, now: DateTime<Utc>) {
        self.in_progress = false;
        if success {
            self.last_fetch = Some(now);
        }
    }
}
