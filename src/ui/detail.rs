// ============================================================================
// Détail - Fiche d'un coin
// ============================================================================
// Affiche la fiche d'un coin : prix, graphique de l'historique avec choix de
// la période (24h, 7d, 30d, 90d, 1y), statistiques de marché, description
// et liens externes
//
// CONCEPTS RATATUI :
// 1. Chart widget : Dataset (points x, y) + axes
// 2. Layout imbriqués : vertical puis horizontal
// 3. Paragraph + Wrap pour les textes longs
// ============================================================================

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, DetailView};
use crate::models::{ChangePeriod, CoinDetails, MarketChart, Timespan};
use crate::ui::dashboard::quit_confirmation_line;
use crate::ui::format::{
    currency_symbol, format_compact, format_percentage, format_price, format_supply,
    percentage_color, NOT_AVAILABLE,
};

/// Dessine la fiche du coin ouvert
pub fn render_detail(frame: &mut Frame, app: &App) {
    let area = frame.size();
    let Some(detail) = app.detail.as_ref() else {
        render_no_data(frame, area, "No coin selected");
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Graphique + stats
            Constraint::Length(7), // Description + liens
            Constraint::Length(3), // Raccourcis
        ])
        .split(area)
        .to_vec();

    render_detail_header(frame, app, detail, chunks[0]);
    render_detail_footer(frame, app, chunks[3]);

    if let Some(error) = &detail.details_error {
        // Sans fiche, le graphique seul reste utile s'il est arrivé
        if detail.chart.is_none() {
            let message = format!("Could not load {}: {}", detail.display_name, error);
            render_no_data(frame, chunks[1].union(chunks[2]), &message);
            return;
        }
    }

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1])
        .to_vec();

    render_price_chart(frame, app, detail, body[0]);
    render_stats(frame, app, detail, body[1]);
    render_about(frame, detail, chunks[2]);
}

// ============================================================================
// Header
// ============================================================================

fn render_detail_header(frame: &mut Frame, app: &App, detail: &DetailView, area: Rect) {
    let mut title = format!(" {} ", detail.display_name);
    if let Some(details) = &detail.details {
        title = format!(" {} ({}) ", details.name, details.symbol.to_uppercase());
        if let Some(rank) = details.market_cap_rank {
            title.push_str(&format!("· Rank #{} ", rank));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title)
        .title_alignment(Alignment::Center);

    let line = match &detail.details {
        Some(details) => {
            let symbol = currency_symbol(&app.currency);
            let change = details.change(ChangePeriod::H24, &app.currency);
            let color = percentage_color(change);
            Line::from(vec![
                Span::raw("Price: "),
                Span::styled(
                    format_price(details.price_in(&app.currency), &symbol),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(format!("{} (24h)", format_percentage(change)), Style::default().fg(color)),
                Span::raw("  "),
                Span::styled("[ESC]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::raw(" Back"),
            ])
        }
        None if detail.details_error.is_some() => Line::from(Span::styled(
            "Failed to load data",
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled("Loading...", Style::default().fg(Color::Gray))),
    };

    frame.render_widget(Paragraph::new(line).block(block).alignment(Alignment::Center), area);
}

// ============================================================================
// Graphique de prix
// ============================================================================

/// Points (x = secondes depuis le premier point, y = prix)
pub fn chart_points(chart: &MarketChart) -> Vec<(f64, f64)> {
    let Some(first) = chart.points.first() else {
        return Vec::new();
    };
    let origin = first.time.timestamp();
    chart
        .points
        .iter()
        .map(|p| ((p.time.timestamp() - origin) as f64, p.price))
        .collect()
}

/// Bornes de l'axe Y avec une marge de 5%
///
/// Une série plate reçoit une marge de 1% du prix ; le bas ne descend pas sous 0
pub fn y_bounds(min: f64, max: f64) -> (f64, f64) {
    let spread = max - min;
    let margin = if spread > 0.0 { spread * 0.05 } else { (max.abs() * 0.01).max(f64::EPSILON) };
    ((min - margin).max(0.0), max + margin)
}

/// Libellé d'une date sur l'axe X selon la période
pub fn time_label(time: DateTime<Utc>, timespan: Timespan) -> String {
    match timespan {
        Timespan::Day => time.format("%H:%M").to_string(),
        Timespan::Week | Timespan::Month | Timespan::Quarter => time.format("%d %b").to_string(),
        Timespan::Year => time.format("%b %Y").to_string(),
    }
}

/// Onglets de période, la période active en surbrillance
fn timespan_tabs(active: Timespan) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    let mut current = Timespan::Day;
    loop {
        let style = if current == active {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", current.label()), style));
        current = current.next();
        if current == Timespan::Day {
            break;
        }
    }
    spans.push(Span::raw(" "));
    Line::from(spans)
}

fn render_price_chart(frame: &mut Frame, app: &App, detail: &DetailView, area: Rect) {
    let Some(chart) = detail.chart_or_fallback().filter(|c| !c.is_empty()) else {
        let message = match &detail.chart_error {
            Some(error) => format!("Chart unavailable: {}", error),
            None => "Loading chart...".to_string(),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(timespan_tabs(detail.timespan));
        let color = if detail.chart_error.is_some() { Color::Red } else { Color::Gray };
        let text = vec![Line::from(""), Line::from(Span::styled(message, Style::default().fg(color)))];
        frame.render_widget(Paragraph::new(text).block(block).alignment(Alignment::Center), area);
        return;
    };

    let points = chart_points(&chart);
    let Some((min_price, max_price)) = chart.bounds() else {
        return;
    };
    let (y_min, y_max) = y_bounds(min_price, max_price);
    let x_max = points.last().map(|&(x, _)| x).unwrap_or(0.0).max(1.0);

    let change = chart.change_percent();
    let color = if change >= 0.0 { Color::Green } else { Color::Red };
    let symbol = currency_symbol(&app.currency);

    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];

    let x_labels = match (chart.points.first(), chart.points.last()) {
        (Some(first), Some(last)) => vec![
            Span::raw(time_label(first.time, chart.timespan)),
            Span::raw(time_label(last.time, chart.timespan)),
        ],
        _ => Vec::new(),
    };

    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, x_max])
        .labels(x_labels);

    let y_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format_price(Some(y_min), &symbol)),
            Span::raw(format_price(Some((y_min + y_max) / 2.0), &symbol)),
            Span::raw(format_price(Some(y_max), &symbol)),
        ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(timespan_tabs(detail.timespan))
        .title(
            Line::from(Span::styled(
                format!(" {} {} ", chart.timespan.label(), format_percentage(Some(change))),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Right),
        );

    let widget = Chart::new(datasets).block(block).x_axis(x_axis).y_axis(y_axis);
    frame.render_widget(widget, area);
}

// ============================================================================
// Statistiques
// ============================================================================

/// Lignes du panneau de statistiques
pub fn stat_lines(details: &CoinDetails, currency: &str) -> Vec<Line<'static>> {
    let symbol = currency_symbol(currency);
    let label = |text: &str| Span::styled(format!("{:<20}", text), Style::default().fg(Color::Gray));

    let supplies = details.market_data.as_ref();
    let circulating = supplies.and_then(|md| md.circulating_supply);
    let total = supplies.and_then(|md| md.total_supply);
    let max = supplies.and_then(|md| md.max_supply);

    let mut lines = vec![
        Line::from(vec![label("Market Cap"), Span::raw(format_compact(details.market_cap_in(currency), &symbol))]),
        Line::from(vec![label("24h Volume"), Span::raw(format_compact(details.volume_in(currency), &symbol))]),
        Line::from(vec![
            label("Circulating Supply"),
            Span::raw(match circulating {
                Some(v) if v > 0.0 => format_supply(Some(v), &details.symbol),
                _ => NOT_AVAILABLE.to_string(),
            }),
        ]),
        Line::from(vec![
            label("Total Supply"),
            Span::raw(match total {
                Some(v) if v > 0.0 => format_supply(Some(v), &details.symbol),
                _ => NOT_AVAILABLE.to_string(),
            }),
        ]),
        Line::from(vec![label("Max Supply"), Span::raw(format_supply(max, &details.symbol))]),
        Line::from(""),
        Line::from(Span::styled(
            "Price Change",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
    ];

    for period in ChangePeriod::ALL {
        let change = details.change(period, currency);
        lines.push(Line::from(vec![
            label(period.label()),
            Span::styled(format_percentage(change), Style::default().fg(percentage_color(change))),
        ]));
    }
    lines
}

fn render_stats(frame: &mut Frame, app: &App, detail: &DetailView, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Market Stats ");

    let lines = match &detail.details {
        Some(details) => stat_lines(details, &app.currency),
        None => vec![Line::from(Span::styled(
            format!("Loading {}...", detail.display_name),
            Style::default().fg(Color::Gray),
        ))],
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// ============================================================================
// Description + liens
// ============================================================================

fn render_about(frame: &mut Frame, detail: &DetailView, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" About ");

    let mut lines = Vec::new();
    if let Some(details) = &detail.details {
        let links = details.link_list();
        if !links.is_empty() {
            let mut spans = Vec::new();
            for (label, url) in links {
                spans.push(Span::styled(
                    format!("{}: ", label),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ));
                spans.push(Span::styled(url, Style::default().fg(Color::Blue)));
                spans.push(Span::raw("   "));
            }
            lines.push(Line::from(spans));
        }
        match details.summary() {
            Some(summary) => lines.push(Line::from(summary)),
            None => lines.push(Line::from(Span::styled(
                "No description available",
                Style::default().fg(Color::Gray),
            ))),
        }
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Footer
// ============================================================================

fn render_detail_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let line = if app.is_awaiting_quit_confirmation() {
        quit_confirmation_line()
    } else {
        let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        Line::from(vec![
            Span::styled("[ESC]", key),
            Span::raw(" Back  "),
            Span::styled("[h/l ←→]", key),
            Span::raw(" Timespan  "),
            Span::styled("[r]", key),
            Span::raw(" Reload  "),
            Span::styled("[q]", key),
            Span::raw(" Quit"),
        ])
    };

    frame.render_widget(Paragraph::new(line).block(block).alignment(Alignment::Center), area);
}

/// Affiche un message quand il n'y a rien à afficher
fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" ⚠ Error ");

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled("[r] Reload   [ESC] Back", Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    use crate::models::coin_detail::MarketData;

    #[test]
    fn test_chart_points_are_relative_to_first() {
        let end = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let chart = MarketChart::from_series("btc".to_string(), Timespan::Day, &[10.0, 11.0, 12.0], end);

        let points = chart_points(&chart);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], (0.0, 10.0));
        assert_eq!(points[2], (86_400.0, 12.0));
    }

    #[test]
    fn test_y_bounds() {
        let (low, high) = y_bounds(100.0, 200.0);
        assert_eq!(low, 95.0);
        assert_eq!(high, 205.0);

        // Jamais sous zéro
        let (low, _) = y_bounds(0.0, 1.0);
        assert_eq!(low, 0.0);

        // Série plate : bornes distinctes
        let (low, high) = y_bounds(50.0, 50.0);
        assert!(low < 50.0 && high > 50.0);
    }

    #[test]
    fn test_time_label() {
        let time = Utc.with_ymd_and_hms(2024, 3, 10, 8, 5, 0).unwrap();
        assert_eq!(time_label(time, Timespan::Day), "08:05");
        assert_eq!(time_label(time, Timespan::Week), "10 Mar");
        assert_eq!(time_label(time, Timespan::Year), "Mar 2024");
    }

    #[test]
    fn test_stat_lines_show_unlimited_max_supply() {
        let details = CoinDetails {
            id: "ethereum".to_string(),
            symbol: "eth".to_string(),
            name: "Ethereum".to_string(),
            market_data: Some(MarketData {
                market_cap: HashMap::from([("usd".to_string(), 400_000_000_000.0)]),
                circulating_supply: Some(120_000_000.0),
                max_supply: None,
                ..Default::default()
            }),
            ..Default::default()
        };

        let lines = stat_lines(&details, "usd");
        let text: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();

        assert!(text[0].ends_with("$400.00B"));
        assert!(text[2].ends_with("120,000,000 ETH"));
        assert!(text[3].ends_with("N/A"));
        assert!(text[4].ends_with("Unlimited"));
        assert_eq!(lines.len(), 7 + ChangePeriod::ALL.len());
    }
}
