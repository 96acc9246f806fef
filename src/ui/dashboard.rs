// ============================================================================
// Dashboard - Tableau des marchés
// ============================================================================
// Dessine l'écran principal : statistiques globales, tableau des coins,
// barre de pagination et raccourcis. La recherche s'affiche en popup
// par-dessus ce même écran.
//
// CONCEPTS RATATUI :
// 1. Table + TableState : la ligne sélectionnée reste visible (scroll auto)
// 2. Layout : découpage de l'espace en zones
// 3. Clear : efface la zone d'une popup avant de dessiner dedans
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, ListingMode};
use crate::models::{Coin, GlobalData, PageItem, Pagination, SortColumn, SortState};
use crate::ui::format::{
    currency_symbol, format_compact, format_count, format_percentage, format_percentage_plain,
    format_price, percentage_color,
};
use crate::ui::sparkline::render_sparkline;

/// Largeur de la colonne sparkline (en caractères)
const SPARKLINE_WIDTH: usize = 20;

/// Dessine l'écran des marchés
pub fn render_markets(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);
    render_table(frame, app, chunks[1]);
    render_pagination(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);
}

/// Dessine l'écran des marchés avec la popup de recherche
pub fn render_search(frame: &mut Frame, app: &App) {
    render_markets(frame, app);
    render_search_popup(frame, app);
}

/// Header, tableau, pagination, raccourcis
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Tableau
            Constraint::Length(3), // Pagination
            Constraint::Length(3), // Raccourcis
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header : statistiques globales
// ============================================================================

/// "Tracking N cryptocurrencies • Market Cap $X (+y%) • 24h Volume $Z"
pub fn header_summary(global: Option<&GlobalData>, currency: &str) -> String {
    let Some(global) = global else {
        return "Loading market overview...".to_string();
    };

    let symbol = currency_symbol(currency);
    let mut parts = vec![format!(
        "Tracking {} cryptocurrencies",
        format_count(global.active_cryptocurrencies)
    )];

    if let Some(cap) = global.total_market_cap_in(currency) {
        let mut text = format!("Market Cap {}", format_compact(Some(cap), &symbol));
        if let Some(change) = global.market_cap_change_percentage_24h_usd {
            text.push_str(&format!(" ({})", format_percentage(Some(change))));
        }
        parts.push(text);
    }
    if let Some(volume) = global.total_volume_in(currency) {
        parts.push(format!("24h Volume {}", format_compact(Some(volume), &symbol)));
    }

    parts.join("  •  ")
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" CoinVista ")
        .title_alignment(Alignment::Center);

    let mut spans = vec![Span::styled(
        header_summary(app.global.as_ref(), &app.currency),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )];

    if app.is_loading {
        let message = app.loading_message.as_deref().unwrap_or("Loading...");
        spans.push(Span::styled(
            format!("   ⟳ {}", message),
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tableau des coins
// ============================================================================

/// Titre d'une colonne : label, flèche si colonne active
pub fn column_title(column: SortColumn, sort: &SortState) -> String {
    if sort.column == column {
        format!("{} {}", column.label(), sort.direction.arrow())
    } else {
        column.label().to_string()
    }
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.listing_mode {
        ListingMode::Paged => format!(" Markets ({}) ", app.currency.to_uppercase()),
        ListingMode::Infinite => format!(" Markets ({}) · infinite scroll ", app.currency.to_uppercase()),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    if let Some(error) = &app.markets_error {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                error.as_str(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::raw("Press "),
                Span::styled("[r]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::raw(" to retry"),
            ]),
        ];
        frame.render_widget(Paragraph::new(text).block(block).alignment(Alignment::Center), area);
        return;
    }

    if app.coins.is_empty() {
        let message = if app.last_markets_refresh.is_none() || app.is_loading {
            "Loading..."
        } else {
            "No coins found"
        };
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(message, Style::default().fg(Color::Gray))),
        ];
        frame.render_widget(Paragraph::new(text).block(block).alignment(Alignment::Center), area);
        return;
    }

    let symbol = currency_symbol(&app.currency);

    let header = Row::new(
        SortColumn::ALL
            .iter()
            .map(|&column| {
                let style = if app.sort.column == column {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Cyan)
                };
                Cell::from(column_title(column, &app.sort)).style(style)
            })
            .chain(std::iter::once(
                Cell::from("Last 7 Days").style(Style::default().fg(Color::Cyan)),
            )),
    )
    .bottom_margin(1);

    let mut rows: Vec<Row> = app.coins.iter().map(|coin| coin_row(coin, &symbol)).collect();

    if app.listing_mode == ListingMode::Infinite {
        let marker = if app.loading_more {
            Some("Loading more...")
        } else if app.exhausted {
            Some("End of list")
        } else {
            None
        };
        if let Some(marker) = marker {
            rows.push(Row::new(vec![Cell::from(""), Cell::from(marker)]).style(Style::default().fg(Color::Gray)));
        }
    }

    let widths = [
        Constraint::Length(5),  // #
        Constraint::Min(20),    // Coin
        Constraint::Length(14), // Prix
        Constraint::Length(8),  // 1h
        Constraint::Length(8),  // 24h
        Constraint::Length(8),  // 7d
        Constraint::Length(12), // Volume
        Constraint::Length(12), // Market cap
        Constraint::Length(SPARKLINE_WIDTH as u16),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD));

    // CONCEPT RATATUI : Stateful widget
    // - TableState mémorise la sélection et l'offset de défilement
    let mut state = TableState::default().with_selected(Some(app.selected_index));
    frame.render_stateful_widget(table, area, &mut state);
}

/// Une ligne du tableau
fn coin_row<'a>(coin: &'a Coin, symbol: &str) -> Row<'a> {
    let percentage_cell = |value: Option<f64>| {
        Cell::from(format_percentage_plain(value)).style(Style::default().fg(percentage_color(value)))
    };

    let rank = coin
        .market_cap_rank
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());

    let name = Line::from(vec![
        Span::styled(coin.name.as_str(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::styled(coin.display_symbol(), Style::default().fg(Color::Gray)),
    ]);

    let sparkline_color = if coin.is_positive_7d() { Color::Green } else { Color::Red };

    Row::new(vec![
        Cell::from(rank),
        Cell::from(name),
        Cell::from(format_price(coin.current_price, symbol)),
        percentage_cell(coin.price_change_percentage_1h_in_currency),
        percentage_cell(coin.price_change_percentage_24h_in_currency),
        percentage_cell(coin.price_change_percentage_7d_in_currency),
        Cell::from(format_compact(coin.total_volume, symbol)),
        Cell::from(format_compact(coin.market_cap, symbol)),
        Cell::from(render_sparkline(coin.sparkline(), SPARKLINE_WIDTH))
            .style(Style::default().fg(sparkline_color)),
    ])
}

// ============================================================================
// Pagination
// ============================================================================

/// "Showing 51 to 100 of 14,512 results" (None si total inconnu)
pub fn pagination_summary(pagination: &Pagination) -> Option<String> {
    let (start, end) = pagination.result_range()?;
    Some(format!(
        "Showing {} to {} of {} results",
        format_count(start),
        format_count(end),
        format_count(pagination.total)
    ))
}

fn render_pagination(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let mut spans: Vec<Span> = Vec::new();

    match app.listing_mode {
        ListingMode::Paged => {
            if let Some(summary) = pagination_summary(&app.pagination) {
                spans.push(Span::raw(summary));
                spans.push(Span::raw("    "));

                let arrow_style = |enabled: bool| {
                    if enabled {
                        Style::default().fg(Color::White)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    }
                };
                spans.push(Span::styled("‹ ", arrow_style(app.pagination.has_previous())));
                for item in app.pagination.page_items() {
                    match item {
                        PageItem::Page(page) if page == app.pagination.page => spans.push(Span::styled(
                            format!(" {} ", page),
                            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
                        )),
                        PageItem::Page(page) => spans.push(Span::raw(format!(" {} ", page))),
                        PageItem::Ellipsis => spans.push(Span::styled(" … ", Style::default().fg(Color::Gray))),
                    }
                }
                spans.push(Span::styled(" ›", arrow_style(app.pagination.has_next())));
            } else {
                spans.push(Span::raw(format!("Page {}", app.pagination.page)));
            }
        }
        ListingMode::Infinite => {
            spans.push(Span::raw(format!("{} coins loaded", format_count(app.coins.len() as u64))));
            if app.pagination.total > 0 {
                spans.push(Span::raw(format!(" of {}", format_count(app.pagination.total))));
            }
        }
    }

    spans.push(Span::raw("    "));
    spans.push(Span::styled("[c]", key_style));
    spans.push(Span::raw(format!(" {} / page", app.pagination.per_page)));

    if let Some(status) = &app.status_message {
        spans.push(Span::styled(format!("    {}", status), Style::default().fg(Color::Red)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Footer : raccourcis clavier
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        quit_confirmation_line()
    } else {
        let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        let mut spans = vec![
            Span::styled("[q]", key),
            Span::raw(" Quit  "),
            Span::styled("[↑↓]", key),
            Span::raw(" Navigate  "),
            Span::styled("[Enter]", key),
            Span::raw(" Details  "),
            Span::styled("[/]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Search  "),
            Span::styled("[1-8]", key),
            Span::raw(" Sort  "),
        ];
        if app.listing_mode == ListingMode::Paged {
            spans.push(Span::styled("[n/p]", key));
            spans.push(Span::raw(" Page  "));
        }
        spans.push(Span::styled("[i]", key));
        spans.push(Span::raw(" Scroll mode  "));
        spans.push(Span::styled("[r]", key));
        spans.push(Span::raw(" Reload"));
        Line::from(spans)
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Message de confirmation de quit (partagé avec la vue détail)
pub fn quit_confirmation_line() -> Line<'static> {
    Line::from(vec![
        Span::styled(
            "⚠  Press ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "[q]",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::SLOW_BLINK),
        ),
        Span::styled(
            " again to quit, or any other key to cancel ⚠",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ])
}

// ============================================================================
// Popup de recherche
// ============================================================================

/// Zone centrée de `width` x `height` (bornée à `area`)
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 3,
        width,
        height,
    }
}

fn render_search_popup(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 14, frame.size());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Search ")
        .title_alignment(Alignment::Center);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("› ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::styled(app.search_input.as_str(), Style::default().fg(Color::White)),
            Span::styled("█", Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(""),
    ];

    let suggestions = app.search_results.suggestions();
    if let Some(error) = &app.search_error {
        lines.push(Line::from(Span::styled(
            format!("Search failed: {}", error),
            Style::default().fg(Color::Red),
        )));
    } else if suggestions.is_empty() {
        let hint = if app.search_input.trim().is_empty() {
            "Type a coin name or symbol"
        } else if app.search_loading {
            "Searching..."
        } else {
            "No coins found"
        };
        lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Gray))));
    } else {
        for (index, coin) in suggestions.iter().enumerate() {
            let rank = coin
                .market_cap_rank
                .map(|r| format!("#{:<5}", r))
                .unwrap_or_else(|| "      ".to_string());
            let mut style = Style::default();
            if index == app.search_selected {
                style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
            }
            lines.push(Line::from(vec![
                Span::styled(format!(" {} ", rank), style.fg(Color::Gray)),
                Span::styled(coin.name.as_str(), style),
                Span::styled(format!(" {}", coin.symbol.to_uppercase()), style.fg(Color::Gray)),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw(" Open  "),
        Span::styled("[↑↓]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::raw(" Select  "),
        Span::styled("[ESC]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Cancel"),
    ]));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortDirection;
    use std::collections::HashMap;

    #[test]
    fn test_header_summary() {
        assert_eq!(header_summary(None, "usd"), "Loading market overview...");

        let global = GlobalData {
            active_cryptocurrencies: 14512,
            total_market_cap: HashMap::from([("usd".to_string(), 2_450_000_000_000.0)]),
            market_cap_change_percentage_24h_usd: Some(1.5),
            ..Default::default()
        };
        assert_eq!(
            header_summary(Some(&global), "usd"),
            "Tracking 14,512 cryptocurrencies  •  Market Cap $2.45T (+1.50%)"
        );
    }

    #[test]
    fn test_pagination_summary() {
        let mut pagination = Pagination::new(50);
        assert_eq!(pagination_summary(&pagination), None);

        pagination.total = 120;
        pagination.page = 3;
        assert_eq!(
            pagination_summary(&pagination).as_deref(),
            Some("Showing 101 to 120 of 120 results")
        );
    }

    #[test]
    fn test_column_title_marks_active_sort() {
        let sort = SortState {
            column: SortColumn::Price,
            direction: SortDirection::Asc,
        };
        assert_eq!(column_title(SortColumn::Price, &sort), "Price ▲");
        assert_eq!(column_title(SortColumn::Volume, &sort), "24h Volume");
    }

    #[test]
    fn test_centered_rect_is_bounded() {
        let area = Rect::new(0, 0, 40, 10);
        let popup = centered_rect(60, 14, area);
        assert_eq!(popup.width, 40);
        assert_eq!(popup.height, 10);
        assert_eq!(popup.x, 0);
    }
}
