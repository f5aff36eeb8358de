// ============================================================================
// Structure : App
// ============================================================================
// État de l'application, construit dans main() et passé par référence.
// Aucun état global : settings, quotes, garde de refresh, formulaire de
// settings et notifications vivent tous ici.
//
// PATTERN : App décide, main exécute
// - Les méthodes qui réagissent à un événement retournent des AppAction
// - main() transforme ces actions en commandes pour le worker réseau et en
//   appels au RefreshScheduler
// - App reste testable sans runtime ni réseau
// ============================================================================

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::models::{classify, filter_configured, PriceQuote, Settings, SymbolValidity, MAX_SYMBOLS};
use crate::refresh::{RefreshDecision, RefreshGate, RefreshTrigger};
use crate::storage::SettingsStore;

/// Durée d'affichage d'une notification
const NOTICE_TTL: Duration = Duration::from_secs(4);

pub const NOTICE_REFRESHED: &str = "Crypto data refreshed";
pub const NOTICE_SYMBOLS_FETCHED: &str = "Successfully fetched symbols";
pub const NOTICE_SYMBOLS_FAILED: &str =
    "Failed to fetch symbols. Check your API key and internet connection.";

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Panneau des prix
    Panel,

    /// Écran de réglages
    Settings,
}

/// Effets demandés par App, exécutés par la boucle principale
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Lancer un cycle de prix (un GET par symbole, en séquence)
    FetchPrices { api_key: String, symbols: Vec<String> },

    /// Récupérer l'univers des symboles
    FetchUniverse { api_key: String },

    /// (Ré)armer le timer avec cet intervalle
    ArmTimer(Duration),

    /// Armer le timer seulement s'il est Idle
    EnsureTimer(Duration),

    /// Détruire le timer
    StopTimer,
}

/// Champ actif de l'écran de settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    ApiKey,
    RefreshInterval,
    Symbol(usize),
}

/// Contenu des champs de l'écran de settings
#[derive(Debug, Clone)]
pub struct SettingsForm {
    pub focus: SettingsField,
    pub api_key_input: String,
    pub interval_input: String,
    pub symbol_inputs: [String; MAX_SYMBOLS],
    pub validity: [SymbolValidity; MAX_SYMBOLS],

    /// Fetch de l'univers en cours ("Fetching symbols...")
    pub fetching_symbols: bool,
}

impl SettingsForm {
    fn from_settings(settings: &Settings) -> Self {
        let symbol_inputs: [String; MAX_SYMBOLS] =
            std::array::from_fn(|i| settings.symbol_at(i).to_string());
        let validity = std::array::from_fn(|i| {
            classify(&symbol_inputs[i], &settings.available_symbols.symbols)
        });

        Self {
            focus: SettingsField::ApiKey,
            api_key_input: settings.api_key.clone(),
            interval_input: settings.refresh_interval_minutes().to_string(),
            symbol_inputs,
            validity,
            fetching_symbols: false,
        }
    }

    /// Champs visibles : sans clé API, seul le champ clé est proposé
    fn fields(has_api_key: bool) -> Vec<SettingsField> {
        let mut fields = vec![SettingsField::ApiKey];
        if has_api_key {
            fields.push(SettingsField::RefreshInterval);
            fields.extend((0..MAX_SYMBOLS).map(SettingsField::Symbol));
        }
        fields
    }

    fn focused_input_mut(&mut self) -> &mut String {
        match self.focus {
            SettingsField::ApiKey => &mut self.api_key_input,
            SettingsField::RefreshInterval => &mut self.interval_input,
            SettingsField::Symbol(i) => &mut self.symbol_inputs[i],
        }
    }
}

/// Notification transitoire (toast)
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    created: Instant,
}

pub struct App {
    pub running: bool,
    pub confirm_quit: bool,
    pub current_screen: Screen,

    /// Panneau ouvert : tant qu'il l'est, le timer tourne
    pub panel_open: bool,

    store: SettingsStore,
    gate: RefreshGate,

    /// Dernières quotes reçues ; None tant qu'aucun cycle n'a réussi
    pub quotes: Option<Vec<PriceQuote>>,

    /// Dernière erreur de fetch (les quotes précédentes restent affichées)
    pub last_error: Option<String>,

    pub notice: Option<Notice>,
    pub form: SettingsForm,
}

impl App {
    pub fn new(store: SettingsStore) -> Self {
        let form = SettingsForm::from_settings(store.settings());
        Self {
            running: true,
            confirm_quit: false,
            current_screen: Screen::Panel,
            panel_open: false,
            store,
            gate: RefreshGate::new(),
            quotes: None,
            last_error: None,
            notice: None,
            form,
        }
    }

    pub fn settings(&self) -> &Settings {
        self.store.settings()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    pub fn is_fetching(&self) -> bool {
        self.gate.is_in_progress()
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.gate.last_fetch()
    }

    /// Quotes à afficher : seulement les symboles encore configurés
    pub fn visible_quotes(&self) -> Vec<&PriceQuote> {
        match &self.quotes {
            Some(quotes) => filter_configured(quotes, &self.settings().active_symbols()),
            None => Vec::new(),
        }
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice {
            message: message.into(),
            created: Instant::now(),
        });
    }

    /// Appelé à chaque tour de boucle : expire les notifications
    pub fn tick(&mut self) {
        if self.notice.as_ref().is_some_and(|n| n.created.elapsed() >= NOTICE_TTL) {
            self.notice = None;
        }
    }

    // ========================================================================
    // Commandes : Open / Close / Refresh
    // ========================================================================

    /// Commande "Open" : affiche le panneau, arme le timer si besoin
    pub fn open_panel(&mut self, now: DateTime<Utc>) -> Vec<AppAction> {
        info!("Opening panel");
        self.panel_open = true;
        self.current_screen = Screen::Panel;

        let mut actions = vec![AppAction::EnsureTimer(self.settings().refresh_interval_duration())];
        actions.extend(self.request_refresh(RefreshTrigger::Display, now));
        actions
    }

    /// Fermeture du panneau : plus aucun tick
    pub fn close_panel(&mut self) -> Vec<AppAction> {
        info!("Closing panel");
        self.panel_open = false;
        vec![AppAction::StopTimer]
    }

    /// Commande "Refresh" : fetch forcé et timer réarmé
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Vec<AppAction> {
        info!("Manual refresh requested");
        self.panel_open = true;

        let mut actions = vec![AppAction::ArmTimer(self.settings().refresh_interval_duration())];
        actions.extend(self.request_refresh(RefreshTrigger::Manual, now));
        actions
    }

    /// Tick du timer (déjà filtré par génération)
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> Vec<AppAction> {
        if !self.panel_open {
            return Vec::new();
        }
        self.request_refresh(RefreshTrigger::Tick, now).into_iter().collect()
    }

    fn request_refresh(&mut self, trigger: RefreshTrigger, now: DateTime<Utc>) -> Option<AppAction> {
        let settings = self.settings();
        let symbols = settings.active_symbols();
        let configured = settings.has_api_key() && !symbols.is_empty();
        let api_key = settings.api_key.clone();

        match self.gate.try_begin(trigger, now, configured) {
            RefreshDecision::Fetch => {
                debug!(?trigger, ?symbols, "Starting fetch cycle");
                Some(AppAction::FetchPrices { api_key, symbols })
            }
            decision => {
                debug!(?trigger, ?decision, "Refresh skipped");
                None
            }
        }
    }

    // ========================================================================
    // Résultats du worker réseau
    // ========================================================================

    /// Cycle réussi : les quotes remplacent les précédentes en bloc
    pub fn on_prices_loaded(&mut self, quotes: Vec<PriceQuote>, now: DateTime<Utc>) {
        info!(quotes = quotes.len(), "Price cycle completed");
        self.gate.finish(true, now);
        self.quotes = Some(quotes);
        self.last_error = None;
        self.notify(NOTICE_REFRESHED);
    }

    /// Cycle échoué : pas de données pour ce cycle, l'affichage ne bouge pas
    pub fn on_prices_failed(&mut self, error: String, now: DateTime<Utc>) {
        warn!(error = %error, "Price cycle failed, keeping previous display");
        self.gate.finish(false, now);
        self.last_error = Some(error);
    }

    /// Nouvel univers : remplacement en bloc puis revalidation des cases
    pub fn on_universe_loaded(&mut self, symbols: Vec<String>, now: DateTime<Utc>) -> Vec<AppAction> {
        info!(count = symbols.len(), "Symbol universe updated");
        self.form.fetching_symbols = false;

        if let Err(e) = self.store.update(|s| s.replace_universe(symbols)) {
            error!(error = ?e, "Failed to save settings");
        }
        self.notify(NOTICE_SYMBOLS_FETCHED);
        self.revalidate_symbols(now)
    }

    /// Échec : l'univers précédent est conservé tel quel
    pub fn on_universe_failed(&mut self, error: String) {
        warn!(error = %error, "Failed to fetch symbols");
        self.form.fetching_symbols = false;
        self.notify(NOTICE_SYMBOLS_FAILED);
        self.refresh_validity();
    }

    // ========================================================================
    // Écran de settings
    // ========================================================================

    pub fn is_on_settings(&self) -> bool {
        self.current_screen == Screen::Settings
    }

    /// Ouvre l'écran de settings ; récupère l'univers s'il est encore vide
    pub fn open_settings(&mut self) -> Vec<AppAction> {
        self.current_screen = Screen::Settings;
        self.form = SettingsForm::from_settings(self.settings());

        let settings = self.settings();
        if settings.has_api_key() && settings.available_symbols.symbols.is_empty() {
            let api_key = settings.api_key.clone();
            self.form.fetching_symbols = true;
            return vec![AppAction::FetchUniverse { api_key }];
        }
        Vec::new()
    }

    /// Retour au panneau ; une clé API en cours de saisie est validée
    pub fn close_settings(&mut self, now: DateTime<Utc>) -> Vec<AppAction> {
        let actions = self.commit_api_key(now);
        self.current_screen = Screen::Panel;
        actions
    }

    pub fn focus_next(&mut self, now: DateTime<Utc>) -> Vec<AppAction> {
        self.move_focus(1, now)
    }

    pub fn focus_previous(&mut self, now: DateTime<Utc>) -> Vec<AppAction> {
        self.move_focus(-1, now)
    }

    fn move_focus(&mut self, step: isize, now: DateTime<Utc>) -> Vec<AppAction> {
        // Quitter le champ clé API vaut validation
        let actions = self.commit_api_key(now);

        let fields = SettingsForm::fields(self.settings().has_api_key());
        let current = fields.iter().position(|f| *f == self.form.focus).unwrap_or(0) as isize;
        let len = fields.len() as isize;
        let next = (current + step).rem_euclid(len) as usize;
        self.form.focus = fields[next];
        actions
    }

    /// Saisie d'un caractère dans le champ actif
    pub fn settings_input_char(&mut self, c: char, now: DateTime<Utc>) -> Vec<AppAction> {
        let accepted = match self.form.focus {
            SettingsField::ApiKey => !c.is_control(),
            SettingsField::RefreshInterval => c.is_ascii_digit(),
            SettingsField::Symbol(_) => c.is_alphanumeric(),
        };
        if !accepted {
            return Vec::new();
        }

        self.form.focused_input_mut().push(c);
        self.apply_focused_field(now)
    }

    pub fn settings_backspace(&mut self, now: DateTime<Utc>) -> Vec<AppAction> {
        self.form.focused_input_mut().pop();
        self.apply_focused_field(now)
    }

    /// Entrée : valide la clé API (les autres champs s'appliquent déjà à
    /// chaque frappe)
    pub fn settings_submit(&mut self, now: DateTime<Utc>) -> Vec<AppAction> {
        self.commit_api_key(now)
    }

    fn apply_focused_field(&mut self, now: DateTime<Utc>) -> Vec<AppAction> {
        match self.form.focus {
            // La clé est appliquée sur Entrée ou en quittant le champ
            SettingsField::ApiKey => Vec::new(),
            SettingsField::RefreshInterval => {
                let input = self.form.interval_input.clone();
                let before = self.settings().refresh_interval;

                // Même si la sauvegarde échoue, la valeur en mémoire a changé
                self.update_settings(|s| s.set_refresh_interval_minutes(&input));
                if self.settings().refresh_interval != before {
                    info!(minutes = %input, "Refresh interval changed");
                    self.settings_changed(now)
                } else {
                    Vec::new()
                }
            }
            SettingsField::Symbol(index) => self.apply_symbol_slot(index, now),
        }
    }

    fn apply_symbol_slot(&mut self, index: usize, now: DateTime<Utc>) -> Vec<AppAction> {
        let input = self.form.symbol_inputs[index].clone();
        let before = self.settings().symbols.clone();

        let validity = self
            .update_settings(|s| s.apply_symbol_input(index, &input))
            .unwrap_or_else(|| classify(&input, &self.settings().available_symbols.symbols));
        self.form.validity[index] = validity;

        if self.settings().symbols != before {
            info!(slot = index, symbols = ?self.settings().symbols, "Symbols changed");
            self.settings_changed(now)
        } else {
            Vec::new()
        }
    }

    fn commit_api_key(&mut self, now: DateTime<Utc>) -> Vec<AppAction> {
        let key = self.form.api_key_input.trim().to_string();
        if key == self.settings().api_key {
            return Vec::new();
        }

        info!(has_key = !key.is_empty(), "API key changed");
        self.form.api_key_input = key.clone();
        self.update_settings(|s| s.api_key = key.clone());

        let mut actions = self.settings_changed(now);
        if !key.is_empty() {
            self.form.fetching_symbols = true;
            actions.push(AppAction::FetchUniverse { api_key: key });
        }
        actions
    }

    /// Reclasse toutes les cases après un changement d'univers et applique
    /// les nouvelles validités aux settings
    fn revalidate_symbols(&mut self, now: DateTime<Utc>) -> Vec<AppAction> {
        let before = self.settings().symbols.clone();
        let inputs = self.form.symbol_inputs.clone();

        let validities = self.update_settings(|s| {
            let mut validities = [SymbolValidity::Empty; MAX_SYMBOLS];
            for (i, input) in inputs.iter().enumerate() {
                validities[i] = s.apply_symbol_input(i, input);
            }
            validities
        });
        match validities {
            Some(validities) => self.form.validity = validities,
            None => self.refresh_validity(),
        }

        if self.settings().symbols != before {
            self.settings_changed(now)
        } else {
            Vec::new()
        }
    }

    /// Reclasse les cases sans toucher aux settings
    fn refresh_validity(&mut self) {
        let universe = &self.store.settings().available_symbols.symbols;
        for (i, input) in self.form.symbol_inputs.iter().enumerate() {
            self.form.validity[i] = classify(input, universe);
        }
    }

    /// Modifie et persiste les settings ; None si la sauvegarde a échoué
    /// (la modification en mémoire reste appliquée)
    fn update_settings<R>(&mut self, change: impl FnOnce(&mut Settings) -> R) -> Option<R> {
        match self.store.update(change) {
            Ok(result) => Some(result),
            Err(e) => {
                error!(error = ?e, "Failed to save settings");
                self.notify("Failed to save settings");
                None
            }
        }
    }

    /// Settings sauvegardés : timer réarmé avec les nouveaux paramètres
    /// puis demande d'affichage (soumise à la garde de fraîcheur)
    fn settings_changed(&mut self, now: DateTime<Utc>) -> Vec<AppAction> {
        if !self.panel_open {
            return Vec::new();
        }
        let mut actions = vec![AppAction::ArmTimer(self.settings().refresh_interval_duration())];
        actions.extend(self.request_refresh(RefreshTrigger::Display, now));
        actions
    }
}
