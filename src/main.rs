// ============================================================================
// CoinVista - Marché des cryptomonnaies dans le terminal
// ============================================================================
// Programme TUI : tableau des coins (pagination ou défilement infini),
// recherche, fiche détaillée avec graphique de prix
// Les données viennent de l'API CoinGecko
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui gère événements et rendering
// 3. Async dans sync : un worker thread possède le runtime tokio
// 4. Channels mpsc : commandes vers le worker, résultats vers l'UI
// ============================================================================

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use coinvista::api::CoinGeckoClient;
use coinvista::app::{App, Command, FetchResult};
use coinvista::config::Config;
use coinvista::ui::{events::EventHandler, render};

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier avec rotation quotidienne
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans le répertoire de `Config::log_dir()` :
/// - Linux : ~/.local/share/coinvista/logs/coinvista.log
/// - macOS : ~/Library/Application Support/coinvista/logs/coinvista.log
///
/// ```bash
/// tail -f ~/.local/share/coinvista/logs/coinvista.log
/// RUST_LOG=coinvista=trace coinvista
/// ```
fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "coinvista.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true)
                .with_thread_ids(true) // Worker vs UI
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour coinvista, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coinvista=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    // .env avant le parsing : COINGECKO_API_KEY peut y être défini
    dotenv::dotenv().ok();
    let config = Config::parse();

    init_logging(&config.log_dir()).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(
        currency = %config.currency,
        per_page = config.per_page,
        api_key = config.api_key.is_some(),
        "CoinVista starting up"
    );

    let client = CoinGeckoClient::new(config.client_settings())
        .context("Impossible de créer le client CoinGecko")?;

    // CONCEPT : Runtime créé ici pour propager l'erreur avec ?,
    // puis déplacé dans le worker thread
    let runtime = tokio::runtime::Runtime::new().context("Impossible de créer le runtime tokio")?;

    let app = Arc::new(Mutex::new(App::new(config.per_page, client.currency().to_string())));

    let (command_tx, command_rx) = mpsc::channel::<Command>();
    let (result_tx, result_rx) = mpsc::channel::<FetchResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(runtime, client, command_rx, result_tx, app.clone());

    // Premier chargement : statistiques globales + page 1
    {
        let app_lock = app.lock().unwrap();
        for command in app_lock.initial_commands() {
            let _ = command_tx.send(command);
        }
    }

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;
    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, app, &events, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : Background async worker avec channels
// - Reçoit des Command via command_rx
// - Exécute l'appel API avec block_on (bloque le worker, pas l'UI)
// - Renvoie un FetchResult via result_tx
// ============================================================================

/// Lance le worker qui exécute les requêtes CoinGecko
fn spawn_background_worker(
    runtime: tokio::runtime::Runtime,
    client: CoinGeckoClient,
    command_rx: mpsc::Receiver<Command>,
    result_tx: mpsc::Sender<FetchResult>,
    app: Arc<Mutex<App>>,
) {
    std::thread::spawn(move || {
        let mut queue: VecDeque<Command> = VecDeque::new();

        loop {
            if queue.is_empty() {
                match command_rx.recv() {
                    Ok(command) => queue.push_back(command),
                    Err(_) => {
                        info!("Worker thread exiting (channel closed)");
                        break;
                    }
                }
            }

            // Récupère ce qui est arrivé entre-temps pour pouvoir fusionner
            queue.extend(command_rx.try_iter());
            coalesce(&mut queue);

            let Some(command) = queue.pop_front() else {
                continue;
            };
            debug!(?command, pending = queue.len(), "Worker received command");

            if let Some(message) = loading_message(&command) {
                app.lock().unwrap().start_loading(Some(message));
            }

            if let Some(result) = runtime.block_on(execute(&client, command)) {
                if result_tx.send(result).is_err() {
                    info!("Worker thread exiting (UI closed)");
                    break;
                }
            }

            if queue.is_empty() {
                app.lock().unwrap().stop_loading();
            }
        }
    });
}

/// Fusionne les commandes en attente
///
/// - seule la dernière recherche compte (les précédentes sont périmées)
/// - une commande identique à une commande déjà en file est ignorée
fn coalesce(queue: &mut VecDeque<Command>) {
    let last_search = queue
        .iter()
        .rposition(|c| matches!(c, Command::Search { .. }));

    let mut kept: VecDeque<Command> = VecDeque::with_capacity(queue.len());
    for (index, command) in queue.drain(..).enumerate() {
        if matches!(command, Command::Search { .. }) && Some(index) != last_search {
            continue;
        }
        if kept.contains(&command) {
            continue;
        }
        kept.push_back(command);
    }
    *queue = kept;
}

/// Message affiché dans le header pendant l'exécution
fn loading_message(command: &Command) -> Option<String> {
    match command {
        Command::FetchMarkets { page, append: true, .. } => Some(format!("Loading page {}...", page)),
        Command::FetchMarkets { page, .. } => Some(format!("Loading markets (page {})...", page)),
        Command::FetchGlobal => Some("Loading market overview...".to_string()),
        Command::Search { query } => Some(format!("Searching \"{}\"...", query)),
        Command::FetchDetails { coin_id } => Some(format!("Loading {}...", coin_id)),
        Command::FetchChart { coin_id, timespan } => {
            Some(format!("Loading {} chart ({})...", coin_id, timespan.label()))
        }
        Command::InvalidateCache => None,
    }
}

/// Exécute une commande et convertit la réponse en FetchResult
///
/// Les erreurs sont loguées ici avec leur détail ; l'UI n'affiche
/// qu'un message générique
async fn execute(client: &CoinGeckoClient, command: Command) -> Option<FetchResult> {
    let result = match command {
        Command::FetchMarkets {
            page,
            per_page,
            sort,
            append,
        } => match client.fetch_coins(page, per_page, &sort).await {
            Ok(coins) => FetchResult::MarketsLoaded {
                page,
                per_page,
                sort,
                append,
                coins,
            },
            Err(e) => {
                error!(page, error = %e, "Failed to load market page");
                FetchResult::MarketsFailed {
                    page,
                    append,
                    error: e.to_string(),
                }
            }
        },

        Command::FetchGlobal => match client.fetch_global().await {
            Ok(global) => FetchResult::GlobalLoaded(global),
            Err(e) => {
                warn!(error = %e, "Failed to load global data");
                FetchResult::GlobalFailed(e.to_string())
            }
        },

        Command::Search { query } => match client.search_coins(&query).await {
            Ok(result) => FetchResult::SearchLoaded { query, result },
            Err(e) => {
                warn!(query = %query, error = %e, "Search failed");
                FetchResult::SearchFailed {
                    query,
                    error: e.to_string(),
                }
            }
        },

        Command::FetchDetails { coin_id } => match client.fetch_coin_details(&coin_id).await {
            Ok(details) => FetchResult::DetailsLoaded { coin_id, details },
            Err(e) => {
                error!(coin = %coin_id, error = %e, "Failed to load coin details");
                FetchResult::DetailsFailed {
                    coin_id,
                    error: e.to_string(),
                }
            }
        },

        Command::FetchChart { coin_id, timespan } => {
            match client.fetch_market_chart(&coin_id, timespan).await {
                Ok(chart) => FetchResult::ChartLoaded { coin_id, chart },
                Err(e) => {
                    error!(coin = %coin_id, timespan = timespan.label(), error = %e, "Failed to load chart");
                    FetchResult::ChartFailed {
                        coin_id,
                        timespan,
                        error: e.to_string(),
                    }
                }
            }
        }

        Command::InvalidateCache => {
            client.invalidate();
            return None;
        }
    };
    Some(result)
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// CONCEPT : Game Loop / Event Loop Pattern
// 0. Résultats du worker
// 1. Render
// 2. Input
// 3. Update (tick : rafraîchissement automatique)
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: mpsc::Sender<Command>,
    result_rx: mpsc::Receiver<FetchResult>,
) -> Result<()> {
    loop {
        {
            let app_lock = app.lock().unwrap();
            if !app_lock.is_running() {
                break;
            }
        }

        // ========================================
        // 0. RÉSULTATS : tout ce que le worker a produit
        // ========================================
        loop {
            match result_rx.try_recv() {
                Ok(result) => app.lock().unwrap().apply(result, Instant::now()),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected!");
                    break;
                }
            }
        }

        // ========================================
        // 1. RENDER
        // ========================================
        terminal.draw(|frame| {
            let app_lock = app.lock().unwrap();
            render(frame, &app_lock);
        })?;

        // ========================================
        // 2. INPUT
        // ========================================
        match events.next() {
            Ok(event) => {
                let mut app_lock = app.lock().unwrap();
                for command in handle_event(&mut app_lock, event) {
                    let _ = command_tx.send(command);
                }
            }
            Err(e) => warn!(error = %e, "Failed to read terminal event"),
        }

        // ========================================
        // 3. UPDATE
        // ========================================
        {
            let mut app_lock = app.lock().unwrap();
            if let Some(command) = app_lock.tick(Instant::now()) {
                let _ = command_tx.send(command);
            }
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================
// CONCEPT RUST : Pattern matching avec guards
// - L'ordre des branches compte : la recherche capture les caractères
//   avant les raccourcis du tableau
// ============================================================================

/// Traite un événement et retourne les requêtes à envoyer au worker
fn handle_event(app: &mut App, event: coinvista::ui::events::Event) -> Vec<Command> {
    use coinvista::ui::events::{
        get_char_from_event, is_arrow_down_event, is_arrow_up_event, is_backspace_event,
        is_down_event, is_enter_event, is_escape_event, is_first_page_event, is_force_quit_event,
        is_last_page_event, is_listing_mode_event, is_next_page_event, is_next_timespan_event,
        is_per_page_event, is_previous_page_event, is_previous_timespan_event, is_quit_event,
        is_reload_event, is_search_event, is_up_event, sort_column_from_event, Event,
    };

    if !matches!(event, Event::Key(_)) {
        return Vec::new();
    }

    if is_force_quit_event(&event) {
        info!("User force quit (Ctrl+C)");
        app.quit();
        return Vec::new();
    }

    // ========================================
    // Recherche : le champ de saisie capture le clavier
    // ========================================
    if app.is_in_search() {
        return match event {
            Event::Key(_) if is_escape_event(&event) => {
                debug!("User cancelled search");
                app.cancel_search();
                Vec::new()
            }
            Event::Key(_) if is_enter_event(&event) => app.submit_search(),
            Event::Key(_) if is_arrow_up_event(&event) => {
                app.search_up();
                Vec::new()
            }
            Event::Key(_) if is_arrow_down_event(&event) => {
                app.search_down();
                Vec::new()
            }
            Event::Key(_) if is_backspace_event(&event) => app.search_backspace().into_iter().collect(),
            _ => get_char_from_event(&event)
                .and_then(|c| app.search_push(c))
                .into_iter()
                .collect(),
        };
    }

    // ========================================
    // Quit two-step (tableau et fiche)
    // ========================================
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

    // Toute autre touche annule la confirmation
    app.cancel_quit();

    if is_reload_event(&event) {
        info!("User requested reload");
        return app.reload();
    }

    // ========================================
    // Fiche détaillée
    // ========================================
    if app.is_on_detail() {
        return match event {
            Event::Key(_) if is_escape_event(&event) => {
                debug!("User returned to markets");
                app.close_detail();
                Vec::new()
            }
            Event::Key(_) if is_next_timespan_event(&event) => app.next_timespan().into_iter().collect(),
            Event::Key(_) if is_previous_timespan_event(&event) => {
                app.previous_timespan().into_iter().collect()
            }
            _ => Vec::new(),
        };
    }

    // ========================================
    // Tableau des marchés
    // ========================================
    if let Some(column) = sort_column_from_event(&event) {
        return app.select_sort(column).into_iter().collect();
    }

    match event {
        Event::Key(_) if is_up_event(&event) => {
            app.navigate_up();
            Vec::new()
        }
        Event::Key(_) if is_down_event(&event) => app.navigate_down().into_iter().collect(),
        Event::Key(_) if is_enter_event(&event) => app.open_selected(),
        Event::Key(_) if is_search_event(&event) => {
            info!("User opened search");
            app.start_search();
            Vec::new()
        }
        Event::Key(_) if is_next_page_event(&event) => app.next_page().into_iter().collect(),
        Event::Key(_) if is_previous_page_event(&event) => app.previous_page().into_iter().collect(),
        Event::Key(_) if is_first_page_event(&event) => app.first_page().into_iter().collect(),
        Event::Key(_) if is_last_page_event(&event) => app.last_page().into_iter().collect(),
        Event::Key(_) if is_per_page_event(&event) => vec![app.cycle_per_page()],
        Event::Key(_) if is_listing_mode_event(&event) => vec![app.toggle_listing_mode()],
        _ => Vec::new(),
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

/// Configure le terminal en mode TUI (raw mode + alternate screen)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
