// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Pattern matching sur KeyCode pour reconnaître les raccourcis
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::models::SortColumn;

/// Intervalle entre deux ticks quand aucune touche n'est pressée
const TICK_RATE: Duration = Duration::from_millis(250);

// ============================================================================
// Enum Event
// ============================================================================
// CONCEPT RUST : Enums avec données
// - Key(KeyEvent) : stocke l'événement clavier complet
// - Tick : variant sans données (unit variant)
// ============================================================================

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (rafraîchissement, réponses du worker)
    Tick,

    /// Terminal redimensionné
    Resize,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            tick_rate: TICK_RATE,
        }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend au plus tick_rate
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    pub fn next(&self) -> Result<Event> {
        if !event::poll(self.tick_rate)? {
            return Ok(Event::Tick);
        }

        match event::read()? {
            // Sur certains OS, on reçoit Press ET Release : on ne garde que Press
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            CrosstermEvent::Resize(_, _) => Ok(Event::Resize),
            _ => Ok(Event::Tick),
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : reconnaître les raccourcis
// ============================================================================

/// Code de la touche si l'événement est une touche
fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        _ => None,
    }
}

/// 'q' (quitter, avec confirmation)
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

/// Ctrl+C : quitte immédiatement, quel que soit l'écran
pub fn is_force_quit_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
    } else {
        false
    }
}

pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

/// Flèche haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K')))
}

/// Flèche bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J')))
}

/// Flèches seules (utilisables pendant la saisie de la recherche)
pub fn is_arrow_up_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Up))
}

pub fn is_arrow_down_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Down))
}

/// 'n' ou Page Down : page suivante
pub fn is_next_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('n') | KeyCode::PageDown))
}

/// 'p' ou Page Up : page précédente
pub fn is_previous_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('p') | KeyCode::PageUp))
}

/// 'g' ou Home : première page
pub fn is_first_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('g') | KeyCode::Home))
}

/// 'G' ou End : dernière page
pub fn is_last_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('G') | KeyCode::End))
}

/// 'c' : nombre de coins par page suivant
pub fn is_per_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('c')))
}

/// 'i' : pagination / défilement infini
pub fn is_listing_mode_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('i') | KeyCode::Char('I')))
}

/// '/' : ouvre la recherche
pub fn is_search_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('/')))
}

/// 'r' : rechargement manuel
pub fn is_reload_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('r') | KeyCode::Char('R')))
}

/// 'l' ou flèche droite : période du graphique suivante
pub fn is_next_timespan_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('l') | KeyCode::Right))
}

/// 'h' ou flèche gauche : période du graphique précédente
pub fn is_previous_timespan_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('h') | KeyCode::Left))
}

pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Colonne de tri associée aux touches 1 à 8
pub fn sort_column_from_event(event: &Event) -> Option<SortColumn> {
    match key_code(event)? {
        KeyCode::Char(c) => SortColumn::from_digit(c),
        _ => None,
    }
}

/// Caractère saisi dans le champ de recherche
///
/// Les combinaisons avec Ctrl / Alt ne sont pas du texte
pub fn get_char_from_event(event: &Event) -> Option<char> {
    let Event::Key(key) = event else {
        return None;
    };
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }
    match key.code {
        KeyCode::Char(c) if !c.is_control() => Some(c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));

        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(is_force_quit_event(&ctrl_c));
        assert!(!is_force_quit_event(&key(KeyCode::Char('c'))));
    }

    #[test]
    fn test_navigation_keys() {
        assert!(is_down_event(&key(KeyCode::Char('j'))));
        assert!(is_up_event(&key(KeyCode::Up)));
        assert!(is_next_page_event(&key(KeyCode::Char('n'))));
        assert!(is_previous_page_event(&key(KeyCode::PageUp)));
        assert!(is_last_page_event(&key(KeyCode::Char('G'))));
        assert!(!is_first_page_event(&key(KeyCode::Char('G'))));
        assert!(is_next_timespan_event(&key(KeyCode::Right)));
        assert!(is_previous_timespan_event(&key(KeyCode::Char('h'))));
    }

    #[test]
    fn test_sort_keys() {
        assert_eq!(sort_column_from_event(&key(KeyCode::Char('1'))), Some(SortColumn::Rank));
        assert_eq!(sort_column_from_event(&key(KeyCode::Char('9'))), None);
        assert_eq!(sort_column_from_event(&key(KeyCode::Enter)), None);
    }

    #[test]
    fn test_get_char_from_event() {
        assert_eq!(get_char_from_event(&key(KeyCode::Char('b'))), Some('b'));
        assert_eq!(get_char_from_event(&key(KeyCode::Enter)), None);

        let ctrl_u = Event::Key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(get_char_from_event(&ctrl_u), None);
    }
}
