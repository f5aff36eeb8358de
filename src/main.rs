// ============================================================================
// CryptoPanel - Panneau de prix crypto dans le terminal
// ============================================================================
// Récupère périodiquement le prix de quelques cryptos choisies (API Ninjas)
// et les affiche dans un panneau TUI, avec un écran de settings pour la clé
// API, l'intervalle de rafraîchissement et les symboles.
//
// Architecture :
// 1. Boucle principale (ce thread) : événements, rendu, état App
// 2. Worker réseau (thread dédié) : exécute les fetchs un par un
// 3. Timer (tâche tokio) : poste des Ticks, filtrés par génération
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use cryptopanel::api::NinjasClient;
use cryptopanel::app::{App, AppAction};
use cryptopanel::config::AppConfig;
use cryptopanel::models::PriceQuote;
use cryptopanel::scheduler::{RefreshScheduler, Tick};
use cryptopanel::storage::{JsonFileStore, SettingsStore};
use cryptopanel::ui::{events::EventHandler, render, Event};

// ============================================================================
// Commandes / résultats du worker réseau
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - La boucle principale envoie des AppCommand
// - Le worker les exécute une par une (jamais deux fetchs en parallèle)
// - Les AppResult reviennent par un second channel
// ============================================================================

/// Commandes exécutées par le worker réseau
#[derive(Debug, Clone)]
enum AppCommand {
    /// Un cycle de prix complet
    FetchPrices { api_key: String, symbols: Vec<String> },

    /// L'univers des symboles
    FetchUniverse { api_key: String },
}

/// Résultats renvoyés par le worker
#[derive(Debug)]
enum AppResult {
    PricesLoaded(Vec<PriceQuote>),
    PricesFailed(String),
    UniverseLoaded(Vec<String>),
    UniverseFailed(String),
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Le TUI occupe stdout : les logs partent dans un fichier à rotation
// quotidienne.
//
// # Utilisation
// ```bash
// tail -f logs/cryptopanel.log.*
// RUST_LOG=cryptopanel=trace cargo run
// ```
// ============================================================================

fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "cryptopanel.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cryptopanel=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du subscriber tracing")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée
// ============================================================================

fn main() -> Result<()> {
    let config = AppConfig::from_env();

    init_logging(&config.log_dir).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });
    info!(?config, "CryptoPanel starting up");

    // Runtime tokio pour le timer ; le worker réseau a le sien
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;

    let store = SettingsStore::open(Box::new(JsonFileStore::new(&config.settings_path)));
    let mut app = App::new(store);

    let (mut scheduler, tick_rx) = RefreshScheduler::new(runtime.handle().clone());
    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning network worker thread");
    spawn_network_worker(config.api_base.clone(), command_rx, result_tx);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    // Le panneau s'ouvre au démarrage
    let actions = app.open_panel(Utc::now());
    execute_actions(&mut app, actions, &mut scheduler, &command_tx);

    info!("Starting event loop");
    let events = EventHandler::new();
    let result = run(
        &mut terminal,
        &mut app,
        &events,
        &mut scheduler,
        tick_rx,
        &command_tx,
        &result_rx,
    );

    // Plus aucun tick après la sortie ; un fetch en vol n'est pas attendu
    scheduler.teardown();

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }
    result
}

// ============================================================================
// Worker réseau
// ============================================================================

/// Thread qui exécute les commandes réseau une à la fois.
///
/// CONCEPT : block_on dans un worker thread
/// - Le worker bloque sur chaque fetch, pas l'UI
/// - La file du channel sérialise les cycles : un seul fetch en vol
fn spawn_network_worker(
    api_base: String,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = ?e, "Failed to create worker runtime");
                return;
            }
        };
        let http = reqwest::Client::new();

        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");
            let result = runtime.block_on(handle_command(&http, &api_base, command));
            if result_tx.send(result).is_err() {
                break;
            }
        }

        info!("Worker thread exiting (channel closed)");
    });
}

async fn handle_command(http: &reqwest::Client, api_base: &str, command: AppCommand) -> AppResult {
    match command {
        AppCommand::FetchPrices { api_key, symbols } => {
            let client = NinjasClient::with_http(http.clone(), api_base, &api_key);
            match client.fetch_prices(&symbols).await {
                Ok(quotes) => AppResult::PricesLoaded(quotes),
                Err(e) => AppResult::PricesFailed(e.to_string()),
            }
        }
        AppCommand::FetchUniverse { api_key } => {
            let client = NinjasClient::with_http(http.clone(), api_base, &api_key);
            match client.fetch_universe().await {
                Ok(symbols) => AppResult::UniverseLoaded(symbols),
                Err(e) => AppResult::UniverseFailed(e.to_string()),
            }
        }
    }
}

// ============================================================================
// Exécution des actions de App
// ============================================================================

fn execute_actions(
    app: &mut App,
    actions: Vec<AppAction>,
    scheduler: &mut RefreshScheduler,
    command_tx: &mpsc::Sender<AppCommand>,
) {
    for action in actions {
        match action {
            AppAction::FetchPrices { api_key, symbols } => {
                if command_tx.send(AppCommand::FetchPrices { api_key, symbols }).is_err() {
                    error!("Network worker is gone, cannot fetch prices");
                    app.on_prices_failed("network worker stopped".to_string(), Utc::now());
                }
            }
            AppAction::FetchUniverse { api_key } => {
                if command_tx.send(AppCommand::FetchUniverse { api_key }).is_err() {
                    error!("Network worker is gone, cannot fetch symbols");
                    app.on_universe_failed("network worker stopped".to_string());
                }
            }
            AppAction::ArmTimer(interval) => scheduler.arm(interval),
            AppAction::EnsureTimer(interval) => scheduler.ensure_armed(interval),
            AppAction::StopTimer => scheduler.teardown(),
        }
    }
}

fn apply_result(app: &mut App, result: AppResult) -> Vec<AppAction> {
    let now = Utc::now();
    match result {
        AppResult::PricesLoaded(quotes) => {
            app.on_prices_loaded(quotes, now);
            Vec::new()
        }
        AppResult::PricesFailed(error) => {
            app.on_prices_failed(error, now);
            Vec::new()
        }
        AppResult::UniverseLoaded(symbols) => app.on_universe_loaded(symbols, now),
        AppResult::UniverseFailed(error) => {
            app.on_universe_failed(error);
            Vec::new()
        }
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. résultats du worker
//   1. ticks du timer (ceux d'un timer détruit sont ignorés)
//   2. rendu
//   3. entrée clavier
//   4. mise à jour (expiration des notifications)
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    scheduler: &mut RefreshScheduler,
    mut tick_rx: UnboundedReceiver<Tick>,
    command_tx: &mpsc::Sender<AppCommand>,
    result_rx: &mpsc::Receiver<AppResult>,
) -> Result<()> {
    let mut worker_alive = true;

    while app.is_running() {
        // 0. Résultats du worker
        while worker_alive {
            match result_rx.try_recv() {
                Ok(result) => {
                    let actions = apply_result(app, result);
                    execute_actions(app, actions, scheduler, command_tx);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Network worker disconnected!");
                    worker_alive = false;
                }
            }
        }

        // 1. Ticks du timer
        while let Ok(tick) = tick_rx.try_recv() {
            if scheduler.accepts(&tick) {
                let actions = app.on_tick(Utc::now());
                execute_actions(app, actions, scheduler, command_tx);
            } else {
                debug!(?tick, "Ignoring tick from a torn-down timer");
            }
        }

        // 2. Rendu
        terminal.draw(|frame| render(frame, app))?;

        // 3. Entrée
        match events.next() {
            Ok(event) => {
                let actions = handle_event(app, event);
                execute_actions(app, actions, scheduler, command_tx);
            }
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }

        // 4. Mise à jour
        app.tick();
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

fn handle_event(app: &mut App, event: Event) -> Vec<AppAction> {
    use cryptopanel::ui::events::{
        get_char_from_event, is_backspace_event, is_close_event, is_enter_event,
        is_escape_event, is_next_field_event, is_open_event, is_previous_field_event,
        is_quit_event, is_refresh_event, is_settings_event,
    };

    let now = Utc::now();

    if let Event::Tick = event {
        return Vec::new();
    }

    // Écran de settings : toutes les lettres vont dans les champs
    if app.is_on_settings() {
        return if is_escape_event(&event) {
            info!("User left settings");
            app.close_settings(now)
        } else if is_next_field_event(&event) {
            app.focus_next(now)
        } else if is_previous_field_event(&event) {
            app.focus_previous(now)
        } else if is_enter_event(&event) {
            app.settings_submit(now)
        } else if is_backspace_event(&event) {
            app.settings_backspace(now)
        } else if let Some(c) = get_char_from_event(&event) {
            app.settings_input_char(c, now)
        } else {
            Vec::new()
        };
    }

    if is_quit_event(&event) {
        if app.is_awaiting_quit_confirmation() {
            info!("User confirmed quit");
            app.quit();
        } else {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }
        return Vec::new();
    }

    app.cancel_quit();

    if is_refresh_event(&event) {
        app.refresh(now)
    } else if is_open_event(&event) {
        app.open_panel(now)
    } else if is_close_event(&event) {
        app.close_panel()
    } else if is_settings_event(&event) {
        info!("User opened settings");
        app.open_settings()
    } else {
        Vec::new()
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
