// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod dashboard; // Tableau des marchés + popup de recherche
pub mod detail;    // Fiche d'un coin + graphique
pub mod events;    // Gestion des événements clavier
pub mod format;    // Formatage des montants et pourcentages
pub mod sparkline; // Mini-graphique 7 jours du tableau

use ratatui::Frame;

use crate::app::{App, Screen};

// Re-exports pour simplifier les imports
pub use events::{Event, EventHandler};

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - Le compilateur garantit l'exhaustivité (tous les écrans gérés)
pub fn render(frame: &mut Frame, app: &App) {
    match app.current_screen {
        Screen::Markets => dashboard::render_markets(frame, app),
        Screen::Search => dashboard::render_search(frame, app),
        Screen::Detail => detail::render_detail(frame, app),
    }
}
