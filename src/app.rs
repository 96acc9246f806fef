// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Les méthodes qui nécessitent un appel réseau retournent une Command,
//   exécutée par le worker ; le résultat revient via App::apply()
// ============================================================================

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::api::cache::MARKETS_TTL;
use crate::models::{
    Coin, CoinDetails, GlobalData, MarketChart, Pagination, SearchCoin, SearchResult,
    SortColumn, SortState, Timespan,
};

/// Message générique affiché quand le chargement des marchés échoue
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load data";

// ============================================================================
// Enum : Screen
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Un seul écran actif à la fois
// - Le compilateur force à gérer tous les cas (exhaustivité)
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : tableau des coins
    Markets,

    /// Recherche : champ de saisie + suggestions par-dessus le tableau
    Search,

    /// Fiche d'un coin avec graphique
    Detail,
}

/// Mode de parcours du tableau
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    /// Une page à la fois (n / p pour changer)
    Paged,

    /// Défilement infini : la page suivante est ajoutée en bas
    Infinite,
}

// ============================================================================
// Commandes et résultats échangés avec le worker
// ============================================================================

/// Requête à exécuter par le worker
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Page du tableau ; `append` = défilement infini
    FetchMarkets {
        page: u32,
        per_page: u32,
        sort: SortState,
        append: bool,
    },
    FetchGlobal,
    Search {
        query: String,
    },
    FetchDetails {
        coin_id: String,
    },
    FetchChart {
        coin_id: String,
        timespan: Timespan,
    },
    /// Vide le cache du client (rechargement manuel)
    InvalidateCache,
}

/// Résultat renvoyé par le worker
#[derive(Debug, Clone)]
pub enum FetchResult {
    MarketsLoaded {
        page: u32,
        per_page: u32,
        sort: SortState,
        append: bool,
        coins: Vec<Coin>,
    },
    MarketsFailed {
        page: u32,
        append: bool,
        error: String,
    },
    GlobalLoaded(GlobalData),
    GlobalFailed(String),
    SearchLoaded {
        query: String,
        result: SearchResult,
    },
    SearchFailed {
        query: String,
        error: String,
    },
    DetailsLoaded {
        coin_id: String,
        details: CoinDetails,
    },
    DetailsFailed {
        coin_id: String,
        error: String,
    },
    ChartLoaded {
        coin_id: String,
        chart: MarketChart,
    },
    ChartFailed {
        coin_id: String,
        timespan: Timespan,
        error: String,
    },
}

// ============================================================================
// Vue détail
// ============================================================================

/// État de la vue détail d'un coin
#[derive(Debug, Clone)]
pub struct DetailView {
    pub coin_id: String,

    /// Nom affiché pendant le chargement (connu depuis le tableau ou la recherche)
    pub display_name: String,

    pub details: Option<CoinDetails>,
    pub chart: Option<MarketChart>,
    pub timespan: Timespan,

    pub details_error: Option<String>,
    pub chart_error: Option<String>,
}

impl DetailView {
    fn new(coin_id: String, display_name: String) -> Self {
        Self {
            coin_id,
            display_name,
            details: None,
            chart: None,
            timespan: Timespan::default(),
            details_error: None,
            chart_error: None,
        }
    }

    /// Historique à afficher
    ///
    /// Si l'historique n'est pas (encore) disponible pour la période 7 jours,
    /// retombe sur le sparkline inclus dans la fiche
    pub fn chart_or_fallback(&self) -> Option<MarketChart> {
        if let Some(chart) = self.chart.as_ref().filter(|c| c.timespan == self.timespan) {
            return Some(chart.clone());
        }
        if self.timespan != Timespan::Week {
            return None;
        }
        let details = self.details.as_ref()?;
        let series = details.sparkline();
        if series.is_empty() {
            return None;
        }
        Some(MarketChart::from_series(
            self.coin_id.clone(),
            Timespan::Week,
            series,
            chrono::Utc::now(),
        ))
    }

    pub fn is_loading(&self) -> bool {
        self.details.is_none() && self.details_error.is_none()
    }
}

// ============================================================================
// App
// ============================================================================

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    pub current_screen: Screen,

    /// Devise de cotation (ex: "usd")
    pub currency: String,

    // --- Tableau des marchés ---
    pub coins: Vec<Coin>,
    pub selected_index: usize,
    pub sort: SortState,
    /// Dernier tri côté API : fixe l'ordre des pages demandées
    pub server_sort: SortState,
    pub pagination: Pagination,
    pub listing_mode: ListingMode,

    /// Erreur de chargement du tableau (affichée à la place des lignes)
    pub markets_error: Option<String>,

    /// Statistiques globales (total de coins pour la pagination)
    pub global: Option<GlobalData>,

    /// Défilement infini : une page supplémentaire est en cours de chargement
    /// CONCEPT : in-flight flag
    /// - empêche d'envoyer deux fois la même requête
    pub loading_more: bool,

    /// Défilement infini : plus rien à charger
    pub exhausted: bool,

    /// Date du dernier chargement réussi du tableau (rafraîchissement auto)
    pub last_markets_refresh: Option<Instant>,

    // --- Recherche ---
    pub search_input: String,
    pub search_results: SearchResult,
    pub search_selected: usize,
    pub search_loading: bool,
    pub search_error: Option<String>,

    // --- Détail ---
    pub detail: Option<DetailView>,

    // --- Divers ---
    /// Two-step quit pour éviter les sorties accidentelles
    pub confirm_quit: bool,

    /// Indicateur de chargement (mis à jour par le worker)
    pub is_loading: bool,
    pub loading_message: Option<String>,

    /// Message temporaire dans le footer (ex: échec du chargement de la page suivante)
    pub status_message: Option<String>,
}

impl App {
    /// Crée l'état initial
    pub fn new(per_page: u32, currency: String) -> Self {
        Self {
            running: true,
            current_screen: Screen::Markets,
            currency,
            coins: Vec::new(),
            selected_index: 0,
            sort: SortState::default(),
            server_sort: SortState::default(),
            pagination: Pagination::new(per_page),
            listing_mode: ListingMode::Paged,
            markets_error: None,
            global: None,
            loading_more: false,
            exhausted: false,
            last_markets_refresh: None,
            search_input: String::new(),
            search_results: SearchResult::empty(),
            search_selected: 0,
            search_loading: false,
            search_error: None,
            detail: None,
            confirm_quit: false,
            is_loading: false,
            loading_message: None,
            status_message: None,
        }
    }

    /// Commandes à exécuter au démarrage
    pub fn initial_commands(&self) -> Vec<Command> {
        vec![Command::FetchGlobal, self.markets_command(self.pagination.page, false)]
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
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

    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    pub fn is_on_markets(&self) -> bool {
        self.current_screen == Screen::Markets
    }

    pub fn is_in_search(&self) -> bool {
        self.current_screen == Screen::Search
    }

    pub fn is_on_detail(&self) -> bool {
        self.current_screen == Screen::Detail
    }

    pub fn selected_coin(&self) -> Option<&Coin> {
        self.coins.get(self.selected_index)
    }

    fn markets_command(&self, page: u32, append: bool) -> Command {
        Command::FetchMarkets {
            page,
            per_page: self.pagination.per_page,
            sort: self.server_sort,
            append,
        }
    }

    // ========================================================================
    // Navigation dans le tableau
    // ========================================================================

    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Descend d'une ligne
    ///
    /// En défilement infini, atteindre la dernière ligne déclenche le
    /// chargement de la page suivante (une seule requête à la fois)
    pub fn navigate_down(&mut self) -> Option<Command> {
        let max_index = self.coins.len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);

        if self.listing_mode == ListingMode::Infinite
            && !self.coins.is_empty()
            && self.selected_index >= max_index
        {
            return self.load_more();
        }
        None
    }

    /// Charge la page suivante en mode défilement infini
    pub fn load_more(&mut self) -> Option<Command> {
        if self.loading_more || self.exhausted || !self.pagination.has_next() {
            return None;
        }
        self.loading_more = true;
        let next = self.pagination.page + 1;
        debug!(page = next, "Loading next page (infinite scroll)");
        Some(self.markets_command(next, true))
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    pub fn next_page(&mut self) -> Option<Command> {
        if self.listing_mode != ListingMode::Paged || !self.pagination.next_page() {
            return None;
        }
        self.selected_index = 0;
        Some(self.markets_command(self.pagination.page, false))
    }

    pub fn previous_page(&mut self) -> Option<Command> {
        if self.listing_mode != ListingMode::Paged || !self.pagination.previous_page() {
            return None;
        }
        self.selected_index = 0;
        Some(self.markets_command(self.pagination.page, false))
    }

    pub fn first_page(&mut self) -> Option<Command> {
        if self.listing_mode != ListingMode::Paged || self.pagination.page == 1 {
            return None;
        }
        self.pagination.go_to(1);
        self.selected_index = 0;
        Some(self.markets_command(1, false))
    }

    pub fn last_page(&mut self) -> Option<Command> {
        let total_pages = self.pagination.total_pages();
        if self.listing_mode != ListingMode::Paged
            || total_pages == 0
            || self.pagination.page == total_pages
        {
            return None;
        }
        self.pagination.go_to(total_pages);
        self.selected_index = 0;
        Some(self.markets_command(total_pages, false))
    }

    /// 50 → 100 → 150 → 50 coins par page, retour en page 1
    pub fn cycle_per_page(&mut self) -> Command {
        self.pagination.cycle_per_page();
        self.reset_listing();
        info!(per_page = self.pagination.per_page, "Per-page changed");
        self.markets_command(1, false)
    }

    /// Bascule pagination / défilement infini, et recharge la page 1
    pub fn toggle_listing_mode(&mut self) -> Command {
        self.listing_mode = match self.listing_mode {
            ListingMode::Paged => ListingMode::Infinite,
            ListingMode::Infinite => ListingMode::Paged,
        };
        self.pagination.go_to(1);
        self.reset_listing();
        info!(mode = ?self.listing_mode, "Listing mode changed");
        self.markets_command(1, false)
    }

    fn reset_listing(&mut self) {
        self.selected_index = 0;
        self.loading_more = false;
        self.exhausted = false;
    }

    // ========================================================================
    // Tri
    // ========================================================================

    /// Sélectionne une colonne de tri
    ///
    /// Les lignes chargées sont triées immédiatement. Si CoinGecko sait
    /// trier la colonne, on recharge la page 1 dans le nouvel ordre.
    pub fn select_sort(&mut self, column: SortColumn) -> Option<Command> {
        self.sort.select(column);
        self.sort.sort(&mut self.coins);
        self.selected_index = 0;
        info!(column = ?self.sort.column, direction = ?self.sort.direction, "Sort changed");

        if self.sort.is_server_side() {
            self.server_sort = self.sort;
            self.pagination.go_to(1);
            self.reset_listing();
            Some(self.markets_command(1, false))
        } else {
            None
        }
    }

    // ========================================================================
    // Rechargement
    // ========================================================================

    /// Rechargement manuel (touche r) : vide le cache et recharge l'écran courant
    pub fn reload(&mut self) -> Vec<Command> {
        self.markets_error = None;
        self.status_message = None;

        let mut commands = vec![Command::InvalidateCache];
        if self.current_screen == Screen::Detail {
            if let Some(detail) = self.detail.as_mut() {
                detail.details_error = None;
                detail.chart_error = None;
                commands.push(Command::FetchDetails {
                    coin_id: detail.coin_id.clone(),
                });
                commands.push(Command::FetchChart {
                    coin_id: detail.coin_id.clone(),
                    timespan: detail.timespan,
                });
                return commands;
            }
        }

        if self.listing_mode == ListingMode::Infinite {
            self.pagination.go_to(1);
            self.reset_listing();
        }
        commands.push(Command::FetchGlobal);
        commands.push(self.markets_command(self.pagination.page, false));
        commands
    }

    /// Tick : appelé à chaque itération de la boucle
    ///
    /// Rafraîchit la page courante quand les données ont dépassé leur
    /// durée de fraîcheur (mode paginé uniquement : en défilement infini
    /// un rechargement ferait perdre les pages ajoutées)
    pub fn tick(&mut self, now: Instant) -> Option<Command> {
        self.tick_with_ttl(now, MARKETS_TTL)
    }

    fn tick_with_ttl(&mut self, now: Instant, ttl: Duration) -> Option<Command> {
        if self.listing_mode != ListingMode::Paged || self.is_loading || self.markets_error.is_some() {
            return None;
        }
        let last = self.last_markets_refresh?;
        if now.saturating_duration_since(last) < ttl {
            return None;
        }
        // Évite de renvoyer la commande à chaque tick en attendant la réponse
        self.last_markets_refresh = Some(now);
        debug!(page = self.pagination.page, "Auto-refreshing market page");
        Some(self.markets_command(self.pagination.page, false))
    }

    // ========================================================================
    // Recherche
    // ========================================================================

    pub fn start_search(&mut self) {
        self.current_screen = Screen::Search;
        self.search_input.clear();
        self.search_results = SearchResult::empty();
        self.search_selected = 0;
        self.search_loading = false;
        self.search_error = None;
    }

    pub fn cancel_search(&mut self) {
        self.current_screen = Screen::Markets;
        self.search_input.clear();
        self.search_results = SearchResult::empty();
        self.search_loading = false;
        self.search_error = None;
    }

    /// Ajoute un caractère et relance la recherche (search-as-you-type)
    pub fn search_push(&mut self, c: char) -> Option<Command> {
        self.search_input.push(c);
        self.search_changed()
    }

    pub fn search_backspace(&mut self) -> Option<Command> {
        self.search_input.pop();
        self.search_changed()
    }

    /// Requête vide : aucune suggestion, aucun appel réseau
    fn search_changed(&mut self) -> Option<Command> {
        self.search_selected = 0;
        self.search_error = None;
        let query = self.search_input.trim().to_string();
        if query.is_empty() {
            self.search_results = SearchResult::empty();
            self.search_loading = false;
            return None;
        }
        self.search_loading = true;
        Some(Command::Search { query })
    }

    pub fn search_up(&mut self) {
        self.search_selected = self.search_selected.saturating_sub(1);
    }

    pub fn search_down(&mut self) {
        let max = self.search_results.suggestions().len().saturating_sub(1);
        self.search_selected = (self.search_selected + 1).min(max);
    }

    pub fn selected_suggestion(&self) -> Option<&SearchCoin> {
        self.search_results.suggestions().get(self.search_selected)
    }

    /// Ouvre la fiche de la suggestion sélectionnée
    pub fn submit_search(&mut self) -> Vec<Command> {
        let Some(coin) = self.selected_suggestion().cloned() else {
            return Vec::new();
        };
        self.search_input.clear();
        self.search_results = SearchResult::empty();
        self.search_loading = false;
        self.open_detail(coin.id, coin.name)
    }

    // ========================================================================
    // Vue détail
    // ========================================================================

    /// Ouvre la fiche du coin sélectionné dans le tableau
    pub fn open_selected(&mut self) -> Vec<Command> {
        match self.selected_coin() {
            Some(coin) => {
                let (id, name) = (coin.id.clone(), coin.name.clone());
                self.open_detail(id, name)
            }
            None => Vec::new(),
        }
    }

    pub fn open_detail(&mut self, coin_id: String, display_name: String) -> Vec<Command> {
        info!(coin = %coin_id, "Opening coin detail");
        let view = DetailView::new(coin_id.clone(), display_name);
        let timespan = view.timespan;
        self.detail = Some(view);
        self.current_screen = Screen::Detail;
        vec![
            Command::FetchDetails {
                coin_id: coin_id.clone(),
            },
            Command::FetchChart { coin_id, timespan },
        ]
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
        self.current_screen = Screen::Markets;
    }

    pub fn next_timespan(&mut self) -> Option<Command> {
        self.change_timespan(Timespan::next)
    }

    pub fn previous_timespan(&mut self) -> Option<Command> {
        self.change_timespan(Timespan::previous)
    }

    fn change_timespan(&mut self, step: fn(&Timespan) -> Timespan) -> Option<Command> {
        let detail = self.detail.as_mut()?;
        detail.timespan = step(&detail.timespan);
        detail.chart_error = None;
        info!(coin = %detail.coin_id, timespan = detail.timespan.label(), "Chart timespan changed");
        Some(Command::FetchChart {
            coin_id: detail.coin_id.clone(),
            timespan: detail.timespan,
        })
    }

    // ========================================================================
    // Application des résultats du worker
    // ========================================================================

    /// Intègre un résultat dans l'état
    ///
    /// Les réponses qui ne correspondent plus à l'état courant (page quittée,
    /// tri changé, recherche modifiée, fiche fermée) sont ignorées
    pub fn apply(&mut self, result: FetchResult, now: Instant) {
        match result {
            FetchResult::MarketsLoaded {
                page,
                per_page,
                sort,
                append,
                coins,
            } => self.apply_markets(page, per_page, sort, append, coins, now),

            FetchResult::MarketsFailed { page, append, error } => {
                warn!(page, append, error = %error, "Market page failed");
                if append {
                    self.loading_more = false;
                    self.status_message = Some(format!("{} (page {})", LOAD_ERROR_MESSAGE, page));
                } else if page == self.pagination.page {
                    self.markets_error = Some(LOAD_ERROR_MESSAGE.to_string());
                }
            }

            FetchResult::GlobalLoaded(global) => {
                self.pagination.total = global.active_cryptocurrencies;
                self.global = Some(global);
            }

            FetchResult::GlobalFailed(error) => {
                // Sans total, la pagination reste masquée
                warn!(error = %error, "Global data unavailable");
            }

            FetchResult::SearchLoaded { query, result } => {
                if query == self.search_input.trim() {
                    self.search_results = result;
                    self.search_selected = 0;
                    self.search_loading = false;
                } else {
                    debug!(query = %query, "Discarding stale search result");
                }
            }

            FetchResult::SearchFailed { query, error } => {
                if query == self.search_input.trim() {
                    self.search_loading = false;
                    self.search_error = Some(error);
                }
            }

            FetchResult::DetailsLoaded { coin_id, details } => {
                if let Some(detail) = self.detail_for(&coin_id) {
                    detail.display_name = details.name.clone();
                    detail.details = Some(details);
                    detail.details_error = None;
                }
            }

            FetchResult::DetailsFailed { coin_id, error } => {
                if let Some(detail) = self.detail_for(&coin_id) {
                    detail.details_error = Some(error);
                }
            }

            FetchResult::ChartLoaded { coin_id, chart } => {
                if let Some(detail) = self.detail_for(&coin_id) {
                    if chart.timespan == detail.timespan {
                        detail.chart = Some(chart);
                        detail.chart_error = None;
                    }
                }
            }

            FetchResult::ChartFailed {
                coin_id,
                timespan,
                error,
            } => {
                if let Some(detail) = self.detail_for(&coin_id) {
                    if timespan == detail.timespan {
                        detail.chart_error = Some(error);
                    }
                }
            }
        }
    }

    fn detail_for(&mut self, coin_id: &str) -> Option<&mut DetailView> {
        self.detail.as_mut().filter(|d| d.coin_id == coin_id)
    }

    fn apply_markets(
        &mut self,
        page: u32,
        per_page: u32,
        sort: SortState,
        append: bool,
        coins: Vec<Coin>,
        now: Instant,
    ) {
        // Un tri local ne change pas l'ordre des pages côté API
        if per_page != self.pagination.per_page
            || sort.api_order() != self.server_sort.api_order()
        {
            debug!(page, "Discarding market page fetched with outdated parameters");
            if append {
                self.loading_more = false;
            }
            return;
        }

        if append {
            self.loading_more = false;
            if self.listing_mode != ListingMode::Infinite || page != self.pagination.page + 1 {
                debug!(page, "Discarding out-of-order appended page");
                return;
            }
            if coins.is_empty() {
                self.exhausted = true;
                return;
            }
            // CoinGecko peut décaler une ligne entre deux pages : pas de doublons
            let fresh: Vec<Coin> = coins
                .into_iter()
                .filter(|c| !self.coins.iter().any(|existing| existing.id == c.id))
                .collect();
            self.coins.extend(fresh);
            self.pagination.page = page;
            self.sort.sort(&mut self.coins);
            self.status_message = None;
            return;
        }

        if page != self.pagination.page {
            debug!(page, current = self.pagination.page, "Discarding page that is no longer displayed");
            return;
        }

        self.coins = coins;
        self.sort.sort(&mut self.coins);
        self.selected_index = self.selected_index.min(self.coins.len().saturating_sub(1));
        self.markets_error = None;
        self.last_markets_refresh = Some(now);
        if self.listing_mode == ListingMode::Infinite && self.coins.is_empty() {
            self.exhausted = true;
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(crate::models::DEFAULT_PER_PAGE, "usd".to_string())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
